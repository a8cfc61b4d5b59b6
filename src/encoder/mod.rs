//! Encoders turning a day batch back into output forms.
//!
//! Both encoders start from [`prepare_header_at`]: the batch bounds and the
//! creation time are written into the last header slots, then the
//! instrument's header overrides are applied.

pub mod container;
pub mod flat;
pub mod sink;

pub use container::{
    Container, Dimension, Group, INT_FILL_VALUE, Variable, VariableData, encode_container,
    encode_container_at,
};
pub use flat::{encode_flat, encode_flat_at};
pub use sink::{ContainerSink, JsonContainerSink, write_atomic};

#[cfg(feature = "netcdf")]
pub use sink::NetCdfSink;

use crate::error::{CodecError, Result};
use crate::models::{DayBatch, HeaderRecord, ObservationRecord, TIMESTAMP_FORMAT};
use crate::schema::{HeaderOverride, InstrumentSchema, SubSeries};
use chrono::{Local, NaiveDateTime};
use tracing::debug;

/// Wall-clock creation time for a new output.
pub fn creation_time() -> NaiveDateTime {
    Local::now().naive_local()
}

fn in_series(series: &SubSeries, record: &ObservationRecord) -> bool {
    series
        .filter
        .iter()
        .any(|code| record.get(code).is_some_and(|v| !v.is_missing()))
}

/// Records of `batch` that belong to `series`, in batch order.
pub(crate) fn series_members<'a>(series: &SubSeries, batch: &'a DayBatch) -> Vec<&'a ObservationRecord> {
    batch.records().iter().filter(|r| in_series(series, r)).collect()
}

/// How many records of `batch` no sub-series takes. Such records have no
/// place in either output form and are left out.
pub fn unplaced_records(schema: &InstrumentSchema, batch: &DayBatch) -> usize {
    let series = schema.sub_series();
    if series.is_empty() {
        return 0;
    }
    batch
        .records()
        .iter()
        .filter(|r| !series.iter().any(|s| in_series(s, r)))
        .count()
}

/// Whether any two consecutive records are at most `max_gap_secs` apart.
fn has_fast_cadence(batch: &DayBatch, max_gap_secs: i64) -> bool {
    let times: Vec<NaiveDateTime> = batch
        .records()
        .iter()
        .filter_map(|r| r.timestamp(batch.primary_code()))
        .collect();
    times
        .windows(2)
        .any(|pair| (pair[1] - pair[0]).num_seconds().abs() <= max_gap_secs)
}

/// Copy of `header` with batch bounds, creation time and overrides written in.
pub fn prepare_header_at(
    schema: &InstrumentSchema,
    header: &HeaderRecord,
    batch: &DayBatch,
    created: NaiveDateTime,
) -> Result<HeaderRecord> {
    let n = schema.header_fields.len();
    if header.len() != n {
        return Err(CodecError::schema_mismatch(
            schema.id,
            format!("header has {} values, expected {}", header.len(), n),
        ));
    }

    let mut prepared = header.clone();
    let stamp = |ts: Option<NaiveDateTime>| {
        ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .ok_or_else(|| CodecError::MissingTimestamp {
                field: batch.primary_code().to_string(),
            })
    };
    prepared.set(n - 4, stamp(batch.start_time())?);
    prepared.set(n - 3, stamp(batch.end_time())?);
    prepared.set(n - 2, created.format(TIMESTAMP_FORMAT).to_string());

    for rule in &schema.overrides {
        match *rule {
            HeaderOverride::Fixed { code, value } => {
                if let Some(i) = schema.header_index(code) {
                    prepared.set(i, value);
                }
            }
            HeaderOverride::FastCadence {
                code,
                max_gap_secs,
                value,
            } => {
                if has_fast_cadence(batch, max_gap_secs) {
                    debug!("{}: fast cadence, {} set to {}", schema.id, code, value);
                    if let Some(i) = schema.header_index(code) {
                        prepared.set(i, value);
                    }
                }
            }
        }
    }
    Ok(prepared)
}

pub fn prepare_header(
    schema: &InstrumentSchema,
    header: &HeaderRecord,
    batch: &DayBatch,
) -> Result<HeaderRecord> {
    prepare_header_at(schema, header, batch, creation_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ObservationRecord, Value};
    use crate::schema::lookup;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn batch(times: &[&str]) -> DayBatch {
        let mut records = times
            .iter()
            .map(|t| ObservationRecord::new().with("Datetime", Value::Timestamp(ts(t))));
        let first = records.next().unwrap();
        let mut batch = DayBatch::new(ts(times[0]).date(), "Datetime", first);
        for r in records {
            batch.push(r);
        }
        batch
    }

    fn blank_header(schema: &InstrumentSchema) -> HeaderRecord {
        HeaderRecord::new(vec!["x".to_string(); schema.header_fields.len()])
    }

    #[test]
    fn test_bounds_and_creation_time() {
        let schema = lookup("VIS").unwrap();
        let b = batch(&["2024-01-01 00:00:00", "2024-01-01 23:59:00"]);
        let created = ts("2024-02-01 08:00:00");
        let header = prepare_header_at(schema, &blank_header(schema), &b, created).unwrap();
        let n = header.len();
        assert_eq!(header.get(n - 4), Some("2024-01-01 00:00:00"));
        assert_eq!(header.get(n - 3), Some("2024-01-01 23:59:00"));
        assert_eq!(header.get(n - 2), Some("2024-02-01 08:00:00"));
        assert_eq!(header.get(n - 1), Some("x"));
    }

    #[test]
    fn test_data_level_override() {
        let schema = lookup("RRD_Lave").unwrap();
        let b = batch(&["2024-01-01 00:00:00"]);
        let header = prepare_header_at(schema, &blank_header(schema), &b, creation_time()).unwrap();
        assert_eq!(header.get(22), Some("Lave"));
    }

    #[test]
    fn test_fast_cadence_override() {
        let schema = lookup("AERM").unwrap();
        let idx = schema.header_index("Time_resolution").unwrap();
        assert_eq!(idx, 18);

        let slow = batch(&["2024-01-01 00:00:00", "2024-01-01 00:01:00"]);
        let header = prepare_header_at(schema, &blank_header(schema), &slow, creation_time()).unwrap();
        assert_eq!(header.get(idx), Some("x"));

        let fast = batch(&["2024-01-01 00:00:00", "2024-01-01 00:00:06"]);
        let header = prepare_header_at(schema, &blank_header(schema), &fast, creation_time()).unwrap();
        assert_eq!(header.get(idx), Some("6"));
    }

    #[test]
    fn test_header_length_checked() {
        let schema = lookup("VIS").unwrap();
        let b = batch(&["2024-01-01 00:00:00"]);
        let err = prepare_header_at(schema, &HeaderRecord::new(vec![]), &b, creation_time()).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_records_outside_every_sub_series_are_counted() {
        let schema = lookup("PRE").unwrap();
        let at = ts("2024-06-01 00:00:00");
        let temperature = crate::decoder::blank_record(schema, at).with("TEM", Value::Number(20.0));
        let mut b = DayBatch::new(at.date(), "Datetime", temperature);
        b.push(crate::decoder::blank_record(schema, ts("2024-06-01 00:01:00")));
        b.push(crate::decoder::blank_record(schema, ts("2024-06-01 00:02:00")).with("PRE_Cum", Value::Number(0.4)));

        assert_eq!(unplaced_records(schema, &b), 1);
        assert_eq!(series_members(&schema.sub_series()[2], &b).len(), 1);
        assert_eq!(unplaced_records(lookup("VIS").unwrap(), &batch(&["2024-01-01 00:00:00"])), 0);
    }
}
