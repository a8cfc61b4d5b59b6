//! Flat tagged-row encoding, the inverse of the decoder.

use super::{prepare_header_at, series_members};
use crate::error::{CodecError, Result};
use crate::models::{DayBatch, HeaderRecord, MISSING_SENTINEL, ObservationRecord, Value};
use crate::schema::{FieldShape, InstrumentSchema, ObsField, RowLayout};
use chrono::NaiveDateTime;

fn cell(value: f64) -> String {
    if value.is_nan() {
        MISSING_SENTINEL.to_string()
    } else {
        value.to_string()
    }
}

fn field_value<'a>(record: &'a ObservationRecord, field: &ObsField) -> Result<&'a Value> {
    record.get(field.code).ok_or_else(|| {
        CodecError::schema_mismatch("", format!("record lacks field {}", field.code))
    })
}

/// Cells of an array value, or one sentinel per declared cell when missing.
fn array_rows(field: &ObsField, value: &Value) -> Result<Vec<Vec<String>>> {
    let (rows, cols) = match field.shape {
        FieldShape::Matrix(r, c) => (r, c),
        other => (1, other.cells()),
    };
    match value {
        Value::Array(array) => {
            if array.shape() != field.shape.dims().as_slice() {
                return Err(CodecError::malformed_block(
                    "",
                    field.code,
                    format!("shape {:?}, declared {:?}", array.shape(), field.shape.dims()),
                ));
            }
            Ok(array
                .data()
                .chunks(cols.max(1))
                .map(|row| row.iter().copied().map(cell).collect())
                .collect())
        }
        Value::Missing => Ok(vec![vec![MISSING_SENTINEL.to_string(); cols]; rows]),
        other => Err(CodecError::invalid_value(field.code, other.to_string(), "expected an array")),
    }
}

fn columnar_rows(schema: &InstrumentSchema, batch: &DayBatch) -> Result<Vec<Vec<String>>> {
    let mut rows = vec![schema.flat_code_row().iter().map(|c| c.to_string()).collect()];
    for record in batch.records() {
        let mut row = Vec::new();
        for field in &schema.obs_fields {
            let value = field_value(record, field)?;
            if field.shape.is_scalar() {
                row.push(value.to_string());
            } else {
                row.extend(array_rows(field, value)?.into_iter().flatten());
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Sub-series side by side; shorter groups are padded with blank cells and an
/// empty group leaves a blank placeholder row.
fn series_rows(schema: &InstrumentSchema, batch: &DayBatch) -> Result<Vec<Vec<String>>> {
    let series = schema.sub_series();
    let groups: Vec<Vec<Vec<String>>> = series
        .iter()
        .map(|s| {
            series_members(s, batch)
                .into_iter()
                .map(|record| {
                    let mut cells = vec![
                        record
                            .get(schema.primary_timestamp)
                            .map(Value::to_string)
                            .unwrap_or_default(),
                    ];
                    cells.extend(s.columns.iter().map(|c| {
                        record.get(c.source).map(Value::to_string).unwrap_or_else(|| MISSING_SENTINEL.to_string())
                    }));
                    cells
                })
                .collect()
        })
        .collect();

    let height = groups.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut rows = vec![schema.flat_code_row().iter().map(|c| c.to_string()).collect()];
    for i in 0..height {
        let mut row = Vec::new();
        for (s, group) in series.iter().zip(&groups) {
            match group.get(i) {
                Some(cells) => row.extend(cells.iter().cloned()),
                None => row.extend(std::iter::repeat_n(String::new(), 1 + s.columns.len())),
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

fn tagged_rows(schema: &InstrumentSchema, batch: &DayBatch) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for record in batch.records() {
        for field in &schema.obs_fields {
            let value = field_value(record, field)?;
            match field.shape {
                FieldShape::Scalar => rows.push(vec![field.code.to_string(), value.to_string()]),
                FieldShape::Vector(_) | FieldShape::Matrix(..) => {
                    for (i, cells) in array_rows(field, value)?.into_iter().enumerate() {
                        let tag = if i == 0 { field.code } else { "" };
                        let mut row = vec![tag.to_string()];
                        row.extend(cells);
                        rows.push(row);
                    }
                }
            }
        }
    }
    Ok(rows)
}

/// Encode `batch` as flat CSV bytes with a fixed creation time.
pub fn encode_flat_at(
    schema: &InstrumentSchema,
    header: &HeaderRecord,
    batch: &DayBatch,
    created: NaiveDateTime,
) -> Result<Vec<u8>> {
    let header = prepare_header_at(schema, header, batch, created)?;
    let body = match schema.layout {
        RowLayout::Columnar => columnar_rows(schema, batch),
        RowLayout::SubSeries => series_rows(schema, batch),
        RowLayout::Tagged => tagged_rows(schema, batch),
    }
    .map_err(|e| e.with_source(schema.id))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(header.values())?;
    for row in &body {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| CodecError::Io(e.into_error()))
}

pub fn encode_flat(
    schema: &InstrumentSchema,
    header: &HeaderRecord,
    batch: &DayBatch,
) -> Result<Vec<u8>> {
    encode_flat_at(schema, header, batch, super::creation_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NdArray, TIMESTAMP_FORMAT};
    use crate::schema::lookup;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn header(schema: &InstrumentSchema) -> HeaderRecord {
        HeaderRecord::new(vec!["0".to_string(); schema.header_fields.len()])
    }

    fn text(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_empty_sub_series_placeholder() {
        let schema = lookup("PRE").unwrap();
        let record = crate::decoder::blank_record(schema, ts("2024-06-01 00:00:00"))
            .with("TEM", Value::Number(20.0))
            .with("Q_TEM", Value::Number(0.0));
        let batch = DayBatch::new(ts("2024-06-01 00:00:00").date(), "Datetime", record);
        let lines = text(encode_flat(schema, &header(schema), &batch).unwrap());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "2024-06-01 00:00:00,20,0,,,,,,,,");
    }

    #[test]
    fn test_record_outside_every_sub_series_not_written() {
        let schema = lookup("PRE").unwrap();
        let first = crate::decoder::blank_record(schema, ts("2024-06-01 00:00:00"))
            .with("TEM", Value::Number(20.0))
            .with("Q_TEM", Value::Number(0.0));
        let mut batch = DayBatch::new(ts("2024-06-01 00:00:00").date(), "Datetime", first);
        batch.push(crate::decoder::blank_record(schema, ts("2024-06-01 00:01:00")));

        let lines = text(encode_flat(schema, &header(schema), &batch).unwrap());
        assert_eq!(lines.len(), 3);
        assert!(!lines[1..].iter().any(|l| l.contains("00:01:00")));
    }

    #[test]
    fn test_tagged_matrix_rows() {
        let schema = lookup("RRD_Lraw").unwrap();
        let record = ObservationRecord::new()
            .with("Datetime", Value::Timestamp(ts("2024-06-01 00:00:00")))
            .with("HGT", Value::Array(NdArray::vector(vec![1.0; 32])))
            .with("Transfer_function", Value::Array(NdArray::vector(vec![0.5; 32])))
            .with(
                "Spectral_reflectivities",
                Value::Array(NdArray::new(vec![64, 32], vec![2.0; 64 * 32]).unwrap()),
            )
            .with("Q_data", Value::Number(0.0));
        let batch = DayBatch::new(ts("2024-06-01 00:00:00").date(), "Datetime", record);
        let lines = text(encode_flat(schema, &header(schema), &batch).unwrap());
        // header, Datetime, HGT, Transfer_function, 64 matrix rows, Q_data
        assert_eq!(lines.len(), 1 + 3 + 64 + 1);
        assert!(lines[4].starts_with("Spectral_reflectivities,2,"));
        assert!(lines[5].starts_with(",2,"));
        assert_eq!(lines[68], "Q_data,0");
    }

    #[test]
    fn test_missing_field_is_schema_mismatch() {
        let schema = lookup("VIS").unwrap();
        let record = ObservationRecord::new().with("Datetime", Value::Timestamp(ts("2024-06-01 00:00:00")));
        let batch = DayBatch::new(ts("2024-06-01 00:00:00").date(), "Datetime", record);
        let err = encode_flat(schema, &header(schema), &batch).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { ref source_name, .. } if source_name == "VIS"));
    }
}
