//! Flat-form decoder.
//!
//! A flat source has two sections: one header row aligned with the
//! instrument's header codes, then the observation section laid out as the
//! schema's [`RowLayout`] declares. Datastore documents are converted by
//! [`record_from_document`].

mod columnar;
mod document;
mod repair;
mod series;
mod tagged;
mod values;

pub use document::{Document, record_from_document};
pub use repair::repair_block;
pub use values::{is_missing_token, parse_timestamp};

pub(crate) use series::blank_record;

use crate::error::{CodecError, Result};
use crate::models::{HeaderRecord, ObservationRecord};
use crate::schema::{InstrumentSchema, RowLayout};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Read every row of a CSV source, keeping ragged rows as they are.
fn read_rows<R: Read>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn header_from_row(schema: &InstrumentSchema, row: &[String]) -> Result<HeaderRecord> {
    let expected = schema.header_fields.len();
    if row.len() != expected {
        return Err(CodecError::schema_mismatch(
            "",
            format!(
                "header has {} values, {} declares {}",
                row.len(),
                schema.id,
                expected
            ),
        ));
    }
    Ok(HeaderRecord::new(row.to_vec()))
}

fn decode_rows(
    schema: &InstrumentSchema,
    rows: &[Vec<String>],
) -> Result<(HeaderRecord, Vec<ObservationRecord>)> {
    let Some((header_row, observation_rows)) = rows.split_first() else {
        return Err(CodecError::schema_mismatch("", "empty source"));
    };
    let header = header_from_row(schema, header_row)?;
    debug!(
        "{}: {} observation rows, layout {:?}",
        schema.id,
        observation_rows.len(),
        schema.layout
    );

    let records = match schema.layout {
        RowLayout::Columnar => columnar::decode(schema, observation_rows)?,
        RowLayout::SubSeries => series::decode(schema, observation_rows)?,
        RowLayout::Tagged => tagged::decode(schema, observation_rows)?,
    };
    Ok((header, records))
}

/// Decode a flat source read from `reader`; `source_name` labels errors.
pub fn decode_reader<R: Read>(
    schema: &InstrumentSchema,
    reader: R,
    source_name: &str,
) -> Result<(HeaderRecord, Vec<ObservationRecord>)> {
    let rows = read_rows(reader).map_err(|e| e.with_source(source_name))?;
    let decoded = decode_rows(schema, &rows).map_err(|e| e.with_source(source_name))?;
    info!(
        "Decoded {} records from {} ({})",
        decoded.1.len(),
        source_name,
        schema.id
    );
    Ok(decoded)
}

pub fn decode_bytes(
    schema: &InstrumentSchema,
    bytes: &[u8],
    source_name: &str,
) -> Result<(HeaderRecord, Vec<ObservationRecord>)> {
    decode_reader(schema, bytes, source_name)
}

pub fn decode_file(
    schema: &InstrumentSchema,
    path: &Path,
) -> Result<(HeaderRecord, Vec<ObservationRecord>)> {
    let file = File::open(path)?;
    decode_reader(schema, file, &path.display().to_string())
}

/// Load a header template: a single CSV row of header values.
pub fn read_header_file(schema: &InstrumentSchema, path: &Path) -> Result<HeaderRecord> {
    let name = path.display().to_string();
    let rows = read_rows(File::open(path)?)?;
    let row = rows
        .first()
        .ok_or_else(|| CodecError::schema_mismatch(name.as_str(), "header template is empty"))?;
    header_from_row(schema, row).map_err(|e| e.with_source(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::lookup;
    use std::fs;
    use tempfile::TempDir;

    fn header_line(n: usize) -> String {
        (0..n).map(|i| format!("h{}", i)).collect::<Vec<_>>().join(",")
    }

    #[test]
    fn test_decode_vis_file() {
        let temp_dir = TempDir::new().unwrap();
        let schema = lookup("VIS").unwrap();
        let path = temp_dir.path().join("vis.csv");
        let content = format!(
            "{}\nDatetime,VIS_1MIN,Q_VIS_1MIN,VIS_10MIN,Q_VIS_10MIN\n2024-01-01 00:00:00,100,0,200,0\n",
            header_line(schema.header_fields.len())
        );
        fs::write(&path, content).unwrap();

        let (header, records) = decode_file(schema, &path).unwrap();
        assert_eq!(header.len(), schema.header_fields.len());
        assert_eq!(header.get(0), Some("h0"));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_short_header_names_source() {
        let schema = lookup("VIS").unwrap();
        let err = decode_bytes(schema, b"a,b,c\n", "vis.csv").unwrap_err();
        assert!(
            matches!(err, CodecError::SchemaMismatch { ref source_name, .. } if source_name == "vis.csv")
        );
    }

    #[test]
    fn test_header_template() {
        let temp_dir = TempDir::new().unwrap();
        let schema = lookup("AWS").unwrap();
        let path = temp_dir.path().join("AWS.csv");
        fs::write(&path, header_line(schema.header_fields.len())).unwrap();
        let header = read_header_file(schema, &path).unwrap();
        assert_eq!(header.len(), schema.header_fields.len());
    }
}
