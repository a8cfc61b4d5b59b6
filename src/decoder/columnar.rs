//! Column-aligned rows: a code row followed by one row per record.
//!
//! A non-empty code opens a segment; empty codes extend it. Scalar fields
//! occupy one column, block fields span their declared number of cells and
//! close at the next code (the family's terminator).

use super::values::{parse_block, parse_scalar};
use crate::error::{CodecError, Result};
use crate::models::ObservationRecord;
use crate::schema::{InstrumentSchema, ObsField};
use tracing::debug;

#[derive(Debug)]
struct Segment<'a> {
    field: &'a ObsField,
    start: usize,
    width: usize,
}

/// Split the code row into per-field segments and check them against the schema.
fn segments<'a>(schema: &'a InstrumentSchema, code_row: &[String]) -> Result<Vec<Segment<'a>>> {
    let mut raw: Vec<(String, usize, usize)> = Vec::new();
    for (i, code) in code_row.iter().enumerate() {
        let code = code.trim();
        if code.is_empty() {
            match raw.last_mut() {
                Some(last) => last.2 += 1,
                None => {
                    return Err(CodecError::schema_mismatch(
                        "",
                        "code row starts with a continuation column",
                    ));
                }
            }
        } else {
            raw.push((code.to_string(), i, 1));
        }
    }

    for family in schema.block_families() {
        if let Some(pos) = raw.iter().position(|(code, _, _)| code == family.code) {
            let next = raw.get(pos + 1).map(|(code, _, _)| code.as_str());
            if next != Some(family.terminator) {
                return Err(CodecError::malformed_block(
                    "",
                    family.code,
                    format!("terminator {} absent after block", family.terminator),
                ));
            }
        }
    }

    let found: Vec<&str> = raw.iter().map(|(code, _, _)| code.as_str()).collect();
    let expected = schema.obs_codes();
    if found != expected {
        return Err(CodecError::schema_mismatch(
            "",
            format!(
                "observation codes {:?} do not match {} codes {:?}",
                found, schema.id, expected
            ),
        ));
    }

    raw.into_iter()
        .zip(&schema.obs_fields)
        .map(|((_, start, width), field)| {
            if field.shape.is_scalar() && width != 1 {
                return Err(CodecError::schema_mismatch(
                    "",
                    format!("scalar field {} spans {} columns", field.code, width),
                ));
            }
            Ok(Segment {
                field,
                start,
                width,
            })
        })
        .collect()
}

/// Cell ranges of each segment for one data row.
///
/// A row whose width differs from the code row is only accepted when there is
/// exactly one block: the scalars before it are anchored to the start of the
/// row, the scalars after it to the end, and the block takes what is left.
fn row_ranges(segments: &[Segment], row_len: usize, row_number: usize) -> Result<Vec<(usize, usize)>> {
    let total: usize = segments.iter().map(|s| s.width).sum();
    if row_len == total {
        return Ok(segments.iter().map(|s| (s.start, s.start + s.width)).collect());
    }

    let blocks: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.field.shape.is_scalar())
        .map(|(i, _)| i)
        .collect();
    let [block] = blocks.as_slice() else {
        return Err(CodecError::schema_mismatch(
            "",
            format!("row {} has {} cells, expected {}", row_number, row_len, total),
        ));
    };

    let before: usize = segments[..*block].iter().map(|s| s.width).sum();
    let after: usize = segments[block + 1..].iter().map(|s| s.width).sum();
    if row_len < before + after + 1 {
        return Err(CodecError::schema_mismatch(
            "",
            format!("row {} has {} cells, expected {}", row_number, row_len, total),
        ));
    }

    let block_end = row_len - after;
    let code_row_block_end = segments[*block].start + segments[*block].width;
    let mut ranges = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let range = if i < *block {
            (segment.start, segment.start + segment.width)
        } else if i == *block {
            (before, block_end)
        } else {
            let offset = segment.start - code_row_block_end;
            (block_end + offset, block_end + offset + segment.width)
        };
        ranges.push(range);
    }
    Ok(ranges)
}

pub fn decode(schema: &InstrumentSchema, rows: &[Vec<String>]) -> Result<Vec<ObservationRecord>> {
    let Some((code_row, data_rows)) = rows.split_first() else {
        return Err(CodecError::schema_mismatch("", "missing observation code row"));
    };
    let segments = segments(schema, code_row)?;
    debug!(
        "{}: {} segments, {} data rows",
        schema.id,
        segments.len(),
        data_rows.len()
    );

    let mut records = Vec::with_capacity(data_rows.len());
    for (n, row) in data_rows.iter().enumerate() {
        // Header and code rows come first in the file
        let row_number = n + 3;
        let ranges = row_ranges(&segments, row.len(), row_number)?;
        let mut record = ObservationRecord::new();
        for (segment, (start, end)) in segments.iter().zip(ranges) {
            let field = segment.field;
            let value = if field.shape.is_scalar() {
                parse_scalar(field.code, field.kind, &row[start])?
            } else {
                parse_block(field, &row[start..end])?
            };
            record.insert(field.code, value);
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use crate::schema::lookup;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_scalar_rows() {
        let schema = lookup("VIS").unwrap();
        let rows = vec![
            row(&["Datetime", "VIS_1MIN", "Q_VIS_1MIN", "VIS_10MIN", "Q_VIS_10MIN"]),
            row(&["2024-01-01 00:00:00", "12000", "0", "11800", "0"]),
            row(&["2024-01-01 00:01:00", "Nan", "8", "11750", "0"]),
        ];
        let records = decode(schema, &rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("VIS_1MIN"), Some(&Value::Number(12000.0)));
        assert_eq!(records[1].get("VIS_1MIN"), Some(&Value::Missing));
    }

    #[test]
    fn test_code_mismatch() {
        let schema = lookup("VIS").unwrap();
        let rows = vec![row(&["Datetime", "VIS"]), row(&["2024-01-01 00:00:00", "1"])];
        let err = decode(schema, &rows).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_missing_terminator_is_malformed_block() {
        let schema = lookup("FSD").unwrap();
        let mut codes = vec!["Datetime", "Numb_part_chan"];
        codes.extend(std::iter::repeat_n("", 19));
        let rows = vec![row(&codes)];
        let err = decode(schema, &rows).unwrap_err();
        assert!(
            matches!(err, CodecError::MalformedBlock { ref field, .. } if field == "Numb_part_chan")
        );
    }

    #[test]
    fn test_short_row_is_anchored_around_single_block() {
        let schema = lookup("FSD").unwrap();
        let mut codes = vec!["Datetime", "Numb_part_chan"];
        codes.extend(std::iter::repeat_n("", 19));
        codes.extend(["Numb_conc", "Volu_conc", "LWC", "MVD", "Q_data"]);

        // Two channel counts written as one merged cell
        let mut data = vec!["2024-01-01 00:00:00".to_string(), "100 101".to_string()];
        data.extend((2..20).map(|i| format!("{}", 100 + i)));
        data.extend(row(&["55.5", "NULL", "0.02", "9.5", "0"]));

        let records = decode(schema, &[row(&codes), data]).unwrap();
        let chan = records[0].get("Numb_part_chan").unwrap().as_array().unwrap();
        assert_eq!(chan.shape(), &[20]);
        assert_eq!(chan.data()[0], 100.0);
        assert_eq!(chan.data()[1], 101.0);
        assert_eq!(chan.data()[19], 119.0);
        assert_eq!(records[0].get("Numb_conc"), Some(&Value::Number(55.5)));
        assert_eq!(records[0].get("Volu_conc"), Some(&Value::Missing));
        assert_eq!(records[0].get("Q_data"), Some(&Value::Number(0.0)));
    }
}
