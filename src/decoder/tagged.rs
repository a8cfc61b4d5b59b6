//! Tag-prefixed row streams.
//!
//! Column 0 carries the field code, the rest of the row its value or vector.
//! A matrix starts on a row tagged with its code; following rows with an
//! empty (or repeated) tag add one matrix row each, until the next field of
//! the schema closes the block. Records repeat the schema's field order.

use super::values::{parse_block, parse_matrix_rows, parse_scalar};
use crate::error::{CodecError, Result};
use crate::models::ObservationRecord;
use crate::schema::{FieldShape, InstrumentSchema};
use tracing::debug;

struct OpenBlock {
    field_index: usize,
    rows: Vec<Vec<String>>,
}

pub fn decode(schema: &InstrumentSchema, rows: &[Vec<String>]) -> Result<Vec<ObservationRecord>> {
    let fields = &schema.obs_fields;
    let mut records = Vec::new();
    let mut record = ObservationRecord::new();
    let mut expected = 0usize;
    let mut open: Option<OpenBlock> = None;

    for (n, row) in rows.iter().enumerate() {
        let row_number = n + 2;
        let tag = row.first().map(|t| t.trim()).unwrap_or("");
        let cells = row.get(1..).unwrap_or(&[]);

        if let Some(block) = open.as_mut() {
            let field = &fields[block.field_index];
            if tag.is_empty() || tag == field.code {
                block.rows.push(cells.to_vec());
                continue;
            }
            let terminator = fields.get(block.field_index + 1).map(|f| f.code).unwrap_or("");
            if tag != terminator {
                return Err(CodecError::malformed_block(
                    "",
                    field.code,
                    format!(
                        "row {}: expected terminator {} or a continuation row, found {}",
                        row_number, terminator, tag
                    ),
                ));
            }
            debug!("Closing {} block with {} rows", field.code, block.rows.len());
            record.insert(field.code, parse_matrix_rows(field, &block.rows)?);
            expected = block.field_index + 1;
            open = None;
        }

        if tag.is_empty() {
            return Err(CodecError::schema_mismatch(
                "",
                format!("row {}: continuation row outside a block", row_number),
            ));
        }

        let field = &fields[expected];
        if tag != field.code {
            return Err(CodecError::schema_mismatch(
                "",
                format!("row {}: expected tag {}, found {}", row_number, field.code, tag),
            ));
        }

        match field.shape {
            FieldShape::Matrix(..) => {
                open = Some(OpenBlock {
                    field_index: expected,
                    rows: vec![cells.to_vec()],
                });
                continue;
            }
            FieldShape::Vector(_) => {
                record.insert(field.code, parse_block(field, cells)?);
            }
            FieldShape::Scalar => {
                let raw = cells.first().map(String::as_str).unwrap_or("");
                record.insert(field.code, parse_scalar(field.code, field.kind, raw)?);
            }
        }

        expected += 1;
        if expected == fields.len() {
            records.push(std::mem::take(&mut record));
            expected = 0;
        }
    }

    if let Some(block) = open {
        let field = &fields[block.field_index];
        let terminator = fields.get(block.field_index + 1).map(|f| f.code).unwrap_or("");
        return Err(CodecError::malformed_block(
            "",
            field.code,
            format!("terminator {} absent before end of section", terminator),
        ));
    }
    if expected != 0 {
        return Err(CodecError::schema_mismatch(
            "",
            format!("truncated record: stopped before {}", fields[expected].code),
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::lookup;

    fn lraw_record(ts: &str, matrix_rows: usize) -> Vec<Vec<String>> {
        let mut rows = vec![vec!["Datetime".to_string(), ts.to_string()]];
        let mut hgt = vec!["HGT".to_string()];
        hgt.extend((0..32).map(|i| (i * 100).to_string()));
        rows.push(hgt);
        let mut tf = vec!["Transfer_function".to_string()];
        tf.extend((0..32).map(|i| format!("{}.5", i)));
        rows.push(tf);
        for r in 0..matrix_rows {
            let tag = if r == 0 { "Spectral_reflectivities" } else { "" };
            let mut row = vec![tag.to_string()];
            row.extend((0..32).map(|c| (r * 32 + c).to_string()));
            rows.push(row);
        }
        rows.push(vec!["Q_data".to_string(), "0".to_string()]);
        rows
    }

    #[test]
    fn test_tagged_records() {
        let schema = lookup("RRD_Lraw").unwrap();
        let mut rows = lraw_record("2024-01-01 00:00:00", 64);
        rows.extend(lraw_record("2024-01-01 00:01:00", 64));
        let records = decode(schema, &rows).unwrap();
        assert_eq!(records.len(), 2);
        let spec = records[1]
            .get("Spectral_reflectivities")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(spec.shape(), &[64, 32]);
        assert_eq!(spec.data()[33], 33.0);
        assert_eq!(records[0].get("HGT").unwrap().as_array().unwrap().shape(), &[32]);
    }

    #[test]
    fn test_wrong_row_count_is_malformed() {
        let schema = lookup("RRD_Lraw").unwrap();
        let rows = lraw_record("2024-01-01 00:00:00", 63);
        let err = decode(schema, &rows).unwrap_err();
        assert!(matches!(err, CodecError::MalformedBlock { .. }));
    }

    #[test]
    fn test_unterminated_block() {
        let schema = lookup("RRD_Lraw").unwrap();
        let mut rows = lraw_record("2024-01-01 00:00:00", 64);
        rows.pop();
        let err = decode(schema, &rows).unwrap_err();
        assert!(
            matches!(err, CodecError::MalformedBlock { ref reason, .. } if reason.contains("Q_data"))
        );
    }

    #[test]
    fn test_foreign_tag_inside_block() {
        let schema = lookup("RRD_Lraw").unwrap();
        let mut rows = lraw_record("2024-01-01 00:00:00", 64);
        let last = rows.len() - 1;
        rows[last][0] = "W".to_string();
        let err = decode(schema, &rows).unwrap_err();
        assert!(matches!(err, CodecError::MalformedBlock { .. }));
    }

    #[test]
    fn test_out_of_order_tag() {
        let schema = lookup("RRD_Lraw").unwrap();
        let mut rows = lraw_record("2024-01-01 00:00:00", 64);
        rows.swap(1, 2);
        let err = decode(schema, &rows).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { .. }));
    }
}
