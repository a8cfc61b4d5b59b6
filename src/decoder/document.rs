//! Datastore documents to observation records.
//!
//! A document is a JSON object keyed by observation code. Scalars arrive as
//! strings or numbers, arrays as flat or nested JSON arrays or as whitespace
//! separated strings. Vectors stored as numbered scalar keys are gathered
//! back into one value.

use super::values::{parse_block, parse_matrix_rows, parse_scalar, parse_timestamp};
use crate::error::{CodecError, Result};
use crate::models::{NdArray, ObservationRecord, Value};
use crate::schema::{InstrumentSchema, ObsField, ValueKind};
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value as Json;

pub type Document = serde_json::Map<String, Json>;

fn cell_text(value: &Json) -> String {
    match value {
        Json::Null => "Nan".to_string(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn scalar_from_json(field: &ObsField, value: &Json) -> Result<Value> {
    match value {
        Json::Null => Ok(Value::Missing),
        Json::String(s) => parse_scalar(field.code, field.kind, s),
        Json::Number(n) => match field.kind {
            ValueKind::Float | ValueKind::Integer => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| CodecError::invalid_value(field.code, n.to_string(), "not representable as f64")),
            ValueKind::Text | ValueKind::Code => Ok(Value::Text(n.to_string())),
            ValueKind::Timestamp | ValueKind::OptionalTimestamp => Err(CodecError::invalid_value(
                field.code,
                n.to_string(),
                "expected a timestamp",
            )),
        },
        Json::Object(map) if field.kind.is_timestamp() => match map.get("$date") {
            Some(date) => extended_date(field.code, date).map(Value::Timestamp),
            None => Err(CodecError::invalid_value(field.code, value.to_string(), "unsupported object")),
        },
        other => Err(CodecError::invalid_value(
            field.code,
            other.to_string(),
            "expected a scalar",
        )),
    }
}

/// Extended-JSON `$date` payload: an ISO string, epoch milliseconds, or
/// `{"$numberLong": "<millis>"}`.
fn extended_date(code: &str, date: &Json) -> Result<NaiveDateTime> {
    let millis = match date {
        Json::String(s) => return parse_timestamp(code, s),
        Json::Number(n) => n.as_i64(),
        Json::Object(inner) => inner
            .get("$numberLong")
            .and_then(Json::as_str)
            .and_then(|s| s.parse::<i64>().ok()),
        _ => None,
    };
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| CodecError::invalid_value(code, date.to_string(), "unsupported $date value"))
}

fn array_from_json(field: &ObsField, value: &Json) -> Result<Value> {
    match value {
        Json::Null => {
            let data = vec![f64::NAN; field.shape.cells()];
            NdArray::new(field.shape.dims(), data)
                .map(Value::Array)
                .ok_or_else(|| CodecError::malformed_block("", field.code, "shape does not match cells"))
        }
        Json::String(s) => {
            let cells: Vec<String> = s.split_whitespace().map(str::to_string).collect();
            parse_block(field, &cells)
        }
        Json::Array(items) if items.iter().all(Json::is_array) && !items.is_empty() => {
            let rows: Vec<Vec<String>> = items
                .iter()
                .map(|row| match row {
                    Json::Array(cells) => cells.iter().map(cell_text).collect(),
                    _ => Vec::new(),
                })
                .collect();
            parse_matrix_rows(field, &rows)
        }
        Json::Array(items) => {
            let cells: Vec<String> = items.iter().map(cell_text).collect();
            parse_block(field, &cells)
        }
        other => Err(CodecError::invalid_value(
            field.code,
            other.to_string(),
            "expected an array",
        )),
    }
}

fn gather_scattered(field: &ObsField, prefix: &str, doc: &Document) -> Result<Value> {
    let cells = (0..field.shape.cells())
        .map(|i| {
            let key = format!("{}{}", prefix, i);
            doc.get(&key)
                .map(cell_text)
                .ok_or_else(|| CodecError::schema_mismatch("", format!("document lacks {}", key)))
        })
        .collect::<Result<Vec<_>>>()?;
    parse_block(field, &cells)
}

/// Convert one datastore document into a record carrying every schema field.
pub fn record_from_document(schema: &InstrumentSchema, doc: &Document) -> Result<ObservationRecord> {
    let mut record = ObservationRecord::new();
    for field in &schema.obs_fields {
        let value = if let Some(prefix) = field.scattered_prefix {
            gather_scattered(field, prefix, doc)?
        } else {
            let raw = doc.get(field.code).ok_or_else(|| {
                CodecError::schema_mismatch("", format!("document lacks {}", field.code))
            })?;
            if field.shape.is_scalar() {
                scalar_from_json(field, raw)?
            } else {
                array_from_json(field, raw)?
            }
        };
        record.insert(field.code, value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::lookup;
    use serde_json::json;

    fn doc(value: Json) -> Document {
        match value {
            Json::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_fsd_channels_are_gathered() {
        let schema = lookup("FSD").unwrap();
        let mut d = doc(json!({
            "_id": "abc",
            "Datetime": "2024-02-03 10:00:00",
            "Numb_conc": 12.5,
            "Volu_conc": "NULL",
            "LWC": "0.01",
            "MVD": 8.1,
            "Q_data": 0
        }));
        for i in 0..20 {
            d.insert(format!("Numb_part_ch{}", i), json!(i * 2));
        }
        let record = record_from_document(schema, &d).unwrap();
        let chan = record.get("Numb_part_chan").unwrap().as_array().unwrap();
        assert_eq!(chan.shape(), &[20]);
        assert_eq!(chan.data()[19], 38.0);
        assert_eq!(record.get("Volu_conc"), Some(&Value::Missing));
        assert_eq!(record.get("LWC"), Some(&Value::Number(0.01)));
        assert!(!record.contains("_id"));
    }

    #[test]
    fn test_missing_channel_key() {
        let schema = lookup("FSD").unwrap();
        let d = doc(json!({
            "Datetime": "2024-02-03 10:00:00",
            "Numb_conc": 1, "Volu_conc": 1, "LWC": 1, "MVD": 1, "Q_data": 0
        }));
        let err = record_from_document(schema, &d).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { ref reason, .. } if reason.contains("Numb_part_ch0")));
    }

    #[test]
    fn test_nested_matrix_and_date_object() {
        let schema = lookup("RSD").unwrap();
        let matrix: Vec<Vec<i64>> = (0..22).map(|r| (0..20).map(|c| r * 20 + c).collect()).collect();
        let d = doc(json!({
            "Datetime": {"$date": "2024-05-01T12:00:00"},
            "Syno_4678_1MIN": "R A",
            "Syno_4678_5MIN": "NULL",
            "Prec_inte": 0.5,
            "Prec_cumu": 3.2,
            "Rada_refl": 21.0,
            "MOR_VIS": 9000,
            "Numb_part": 120,
            "Prec_spec": matrix,
            "Q_data": 0
        }));
        let record = record_from_document(schema, &d).unwrap();
        assert_eq!(record.get("Syno_4678_1MIN"), Some(&Value::Text("RA".to_string())));
        assert_eq!(record.get("Syno_4678_5MIN"), Some(&Value::Missing));
        let spec = record.get("Prec_spec").unwrap().as_array().unwrap();
        assert_eq!(spec.shape(), &[22, 20]);
        assert_eq!(spec.data()[439], 439.0);
        assert_eq!(
            record.timestamp("Datetime").unwrap().to_string(),
            "2024-05-01 12:00:00"
        );
    }

    #[test]
    fn test_exported_date_forms() {
        let schema = lookup("VIS").unwrap();
        let dates = [
            json!({"$date": "2024-05-01T12:00:00.000Z"}),
            json!({"$date": "2024-05-01T12:00:00Z"}),
            json!({"$date": 1714564800000i64}),
            json!({"$date": {"$numberLong": "1714564800000"}}),
        ];
        for date in dates {
            let d = doc(json!({
                "Datetime": date.clone(),
                "VIS_1MIN": 12000, "Q_VIS_1MIN": 0, "VIS_10MIN": 11800, "Q_VIS_10MIN": 0
            }));
            let record = record_from_document(schema, &d).unwrap_or_else(|e| panic!("{}: {}", date, e));
            assert_eq!(
                record.timestamp("Datetime").unwrap().to_string(),
                "2024-05-01 12:00:00",
                "{}",
                date
            );
        }

        let d = doc(json!({
            "Datetime": {"$date": true},
            "VIS_1MIN": 1, "Q_VIS_1MIN": 0, "VIS_10MIN": 1, "Q_VIS_10MIN": 0
        }));
        let err = record_from_document(schema, &d).unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue { ref field, .. } if field == "Datetime"));
    }
}
