//! Independent sub-series laid side by side (precipitation gauge).
//!
//! Each sub-series occupies its own group of columns: a timestamp column
//! followed by its value columns. Groups have unequal lengths; a group ends at
//! its first blank timestamp cell. Rows of every group are merged back into
//! one record per timestamp, with fields no group reported left missing.
//! The merged records come out in timestamp order, whatever the row order.
//! A record that had no value in any group was never written, so decoding
//! cannot bring it back.

use super::values::{parse_scalar, parse_timestamp};
use crate::error::{CodecError, Result};
use crate::models::{ObservationRecord, Value};
use crate::schema::InstrumentSchema;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::debug;

pub fn decode(schema: &InstrumentSchema, rows: &[Vec<String>]) -> Result<Vec<ObservationRecord>> {
    let Some((code_row, data_rows)) = rows.split_first() else {
        return Err(CodecError::schema_mismatch("", "missing observation code row"));
    };
    let expected = schema.flat_code_row();
    let found: Vec<&str> = code_row.iter().map(|c| c.trim()).collect();
    if found != expected {
        return Err(CodecError::schema_mismatch(
            "",
            format!("sub-series codes {:?} do not match {:?}", found, expected),
        ));
    }

    let mut merged: BTreeMap<NaiveDateTime, ObservationRecord> = BTreeMap::new();
    let mut offset = 0;
    for series in schema.sub_series() {
        let mut count = 0;
        for (n, row) in data_rows.iter().enumerate() {
            let cell = |i: usize| row.get(offset + i).map(String::as_str).unwrap_or("");
            if cell(0).trim().is_empty() {
                break;
            }
            let ts = parse_timestamp(series.dimension, cell(0)).map_err(|e| {
                CodecError::schema_mismatch("", format!("row {}: {}", n + 3, e))
            })?;
            let record = merged.entry(ts).or_insert_with(|| blank_record(schema, ts));
            for (i, column) in series.columns.iter().enumerate() {
                record.insert(column.source, parse_scalar(column.code, column.kind, cell(i + 1))?);
            }
            count += 1;
        }
        debug!("{}: {} rows", series.dimension, count);
        offset += 1 + series.columns.len();
    }

    Ok(merged.into_values().collect())
}

/// A record holding only its timestamp; every other field is missing.
pub(crate) fn blank_record(schema: &InstrumentSchema, ts: NaiveDateTime) -> ObservationRecord {
    let mut record = ObservationRecord::new();
    for field in &schema.obs_fields {
        record.insert(field.code, Value::Missing);
    }
    record.insert(schema.primary_timestamp, Value::Timestamp(ts));
    record
}
