//! Cell-level value parsing shared by the flat decoders and document conversion.

use super::repair::repair_block;
use crate::error::{CodecError, Result};
use crate::models::{NdArray, TIMESTAMP_FORMAT, Value};
use crate::schema::{FieldShape, ObsField, ValueKind};
use chrono::{DateTime, NaiveDateTime};

const MISSING_TOKENS: [&str; 4] = ["Nan", "NaN", "nan", "NULL"];

pub fn is_missing_token(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw.trim())
}

/// Parse `YYYY-MM-DD HH:MM:SS`, its `T`-separated form with optional
/// fractional seconds, or an RFC 3339 instant (`Z` or offset), which is
/// converted to UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|e| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc())
                .map_err(|_| e)
        })
        .map_err(|e| CodecError::invalid_value(field, raw, e.to_string()))
}

fn parse_number(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| CodecError::invalid_value(field, raw, e.to_string()))
}

/// Parse one scalar cell according to its kind.
pub fn parse_scalar(field: &str, kind: ValueKind, raw: &str) -> Result<Value> {
    let blank = raw.trim().is_empty();
    match kind {
        ValueKind::Timestamp => parse_timestamp(field, raw).map(Value::Timestamp),
        ValueKind::OptionalTimestamp => {
            if blank || is_missing_token(raw) {
                Ok(Value::Missing)
            } else {
                parse_timestamp(field, raw).map(Value::Timestamp)
            }
        }
        ValueKind::Float | ValueKind::Integer => {
            if blank || is_missing_token(raw) {
                Ok(Value::Missing)
            } else {
                parse_number(field, raw).map(Value::Number)
            }
        }
        ValueKind::Text => {
            if is_missing_token(raw) {
                Ok(Value::Missing)
            } else {
                Ok(Value::Text(raw.to_string()))
            }
        }
        ValueKind::Code => {
            if is_missing_token(raw) {
                Ok(Value::Missing)
            } else {
                Ok(Value::Text(raw.split_whitespace().collect()))
            }
        }
    }
}

fn parse_cells(field: &str, cells: &[String]) -> Result<Vec<f64>> {
    cells
        .iter()
        .map(|cell| {
            if cell.trim().is_empty() || is_missing_token(cell) {
                Ok(f64::NAN)
            } else {
                parse_number(field, cell)
            }
        })
        .collect()
}

/// Build a fixed-shape array from the cells of one block, in arrival order.
pub fn parse_block(field: &ObsField, cells: &[String]) -> Result<Value> {
    let expected = field.shape.cells();
    let cells = repair_block(field.code, cells, expected);
    if cells.len() != expected {
        return Err(CodecError::malformed_block(
            "",
            field.code,
            format!("expected {} cells, found {}", expected, cells.len()),
        ));
    }
    let data = parse_cells(field.code, &cells)?;
    NdArray::new(field.shape.dims(), data)
        .map(Value::Array)
        .ok_or_else(|| CodecError::malformed_block("", field.code, "shape does not match cells"))
}

/// Build a matrix from rows that each carry one row of cells.
pub fn parse_matrix_rows(field: &ObsField, rows: &[Vec<String>]) -> Result<Value> {
    let FieldShape::Matrix(n_rows, n_cols) = field.shape else {
        let cells: Vec<String> = rows.iter().flatten().cloned().collect();
        return parse_block(field, &cells);
    };
    if rows.len() != n_rows {
        return Err(CodecError::malformed_block(
            "",
            field.code,
            format!("expected {} rows, found {}", n_rows, rows.len()),
        ));
    }
    let mut data = Vec::with_capacity(n_rows * n_cols);
    for row in rows {
        let row = repair_block(field.code, row, n_cols);
        if row.len() != n_cols {
            return Err(CodecError::malformed_block(
                "",
                field.code,
                format!("expected {} cells per row, found {}", n_cols, row.len()),
            ));
        }
        data.extend(parse_cells(field.code, &row)?);
    }
    NdArray::new(vec![n_rows, n_cols], data)
        .map(Value::Array)
        .ok_or_else(|| CodecError::malformed_block("", field.code, "shape does not match cells"))
}
