//! Core data structures shared by the decoder, day batcher and encoders.
//!
//! Defines observation values (scalars, the missing sentinel and fixed-shape
//! numeric arrays), header and observation records, day batches and the
//! per-run statistics reported by the CLI.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Timestamp layout used in every text form (flat rows, datastore documents,
/// container string variables).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel written for a value that was not observed at this tick.
pub const MISSING_SENTINEL: &str = "Nan";

/// Fixed-shape numeric array stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl NdArray {
    /// Build an array, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Option<Self> {
        let expected: usize = shape.iter().product();
        (expected == data.len()).then_some(Self { shape, data })
    }

    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Iterate over the rows of a 2-D array (a vector is a single row).
    pub fn rows(&self) -> std::slice::Chunks<'_, f64> {
        let width = self.shape.last().copied().unwrap_or(0).max(1);
        self.data.chunks(width)
    }

    /// Swap the axes of a 2-D array. Arrays of any other rank are returned unchanged.
    pub fn transposed(&self) -> Self {
        if self.shape.len() != 2 {
            return self.clone();
        }
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..cols {
            for r in 0..rows {
                data.push(self.data[r * cols + c]);
            }
        }
        Self {
            shape: vec![cols, rows],
            data,
        }
    }
}

/// A single observation value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Not observed this tick; rendered as [`MISSING_SENTINEL`].
    Missing,
    Text(String),
    Number(f64),
    Timestamp(NaiveDateTime),
    Array(NdArray),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// Text rendering of a scalar cell. Arrays render their cells space separated.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str(MISSING_SENTINEL),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            Value::Array(a) => {
                let cells: Vec<String> = a.data().iter().map(|v| v.to_string()).collect();
                f.write_str(&cells.join(" "))
            }
        }
    }
}

/// Header values aligned 1:1 with an instrument's header field codes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderRecord {
    values: Vec<String>,
}

impl HeaderRecord {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Replace the value at `index`; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.into();
        }
    }
}

/// One observation: field code to value. Every record of an instrument
/// carries the same key set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationRecord {
    fields: HashMap<String, Value>,
}

impl ObservationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, value: Value) {
        self.fields.insert(code.into(), value);
    }

    pub fn with(mut self, code: impl Into<String>, value: Value) -> Self {
        self.insert(code, value);
        self
    }

    pub fn get(&self, code: &str) -> Option<&Value> {
        self.fields.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.fields.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Timestamp held under `code`, if the field exists and is a timestamp.
    pub fn timestamp(&self, code: &str) -> Option<NaiveDateTime> {
        self.get(code).and_then(Value::as_timestamp)
    }
}

/// Records sharing one calendar date of the primary timestamp, in arrival order.
///
/// Never empty: a batch is opened with its first record.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBatch {
    date: NaiveDate,
    primary_code: String,
    records: Vec<ObservationRecord>,
}

impl DayBatch {
    pub fn new(date: NaiveDate, primary_code: impl Into<String>, first: ObservationRecord) -> Self {
        Self {
            date,
            primary_code: primary_code.into(),
            records: vec![first],
        }
    }

    pub fn push(&mut self, record: ObservationRecord) {
        self.records.push(record);
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn primary_code(&self) -> &str {
        &self.primary_code
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ObservationRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Primary timestamp of the first record.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.records.first()?.timestamp(&self.primary_code)
    }

    /// Primary timestamp of the last record.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.records.last()?.timestamp(&self.primary_code)
    }
}

/// Processing statistics for one run
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub instruments_processed: usize,
    pub instruments_failed: usize,
    pub files_decoded: usize,
    pub files_failed: usize,
    pub records_read: usize,
    pub batches_written: usize,
    /// Outputs that replaced a file written earlier (a date revisited out of order)
    pub files_overwritten: usize,
    pub outputs: Vec<PathBuf>,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn merge(&mut self, other: ProcessingStats) {
        self.instruments_processed += other.instruments_processed;
        self.instruments_failed += other.instruments_failed;
        self.files_decoded += other.files_decoded;
        self.files_failed += other.files_failed;
        self.records_read += other.records_read;
        self.batches_written += other.batches_written;
        self.files_overwritten += other.files_overwritten;
        self.outputs.extend(other.outputs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_swaps_axes() {
        let a = NdArray::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = a.transposed();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(t.transposed(), a);
    }

    #[test]
    fn test_ndarray_rejects_wrong_length() {
        assert!(NdArray::new(vec![2, 2], vec![1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_value_display() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-01-01 08:30:00");
        assert_eq!(Value::Missing.to_string(), "Nan");
        assert_eq!(Value::Number(12.0).to_string(), "12");
        assert_eq!(Value::Number(0.25).to_string(), "0.25");
    }

    #[test]
    fn test_batch_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let first = ObservationRecord::new().with(
            "Datetime",
            Value::Timestamp(day.and_hms_opt(0, 0, 0).unwrap()),
        );
        let last = ObservationRecord::new().with(
            "Datetime",
            Value::Timestamp(day.and_hms_opt(23, 59, 0).unwrap()),
        );
        let mut batch = DayBatch::new(day, "Datetime", first);
        batch.push(last);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.start_time(), day.and_hms_opt(0, 0, 0));
        assert_eq!(batch.end_time(), day.and_hms_opt(23, 59, 0));
    }
}
