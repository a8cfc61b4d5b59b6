//! Pipeline tests for the batch driver
//!
//! Drive the full datastore -> day batch -> encoder -> file path with
//! in-memory collections and temporary output directories.

pub mod sample_mode;

use crate::decoder::Document;
use serde_json::json;

/// Visibility document at `ts`
pub(crate) fn vis_document(ts: &str, vis: f64) -> Document {
    let value = json!({
        "Datetime": ts,
        "VIS_1MIN": vis,
        "Q_VIS_1MIN": 0,
        "VIS_10MIN": vis + 10.0,
        "Q_VIS_10MIN": 0
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// `per_day[i]` documents on day `i + 1` of January 2024
pub(crate) fn vis_days(per_day: &[usize]) -> Vec<Document> {
    per_day
        .iter()
        .enumerate()
        .flat_map(|(day, n)| {
            (0..*n).map(move |i| {
                vis_document(&format!("2024-01-{:02} 00:{:02}:00", day + 1, i), 1000.0 + i as f64)
            })
        })
        .collect()
}
