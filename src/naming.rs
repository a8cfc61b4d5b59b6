//! Output file naming and directory layout.
//!
//! Names follow
//! `<class01>_MODI_<class03>_<class04>_<station>_<data>_<manufacturer>_<level>_<YYYYMMDD_HHMMSS>[_<format>][_QC].<ext>`
//! stamped from the first record of the batch.

use crate::error::{CodecError, Result};
use crate::schema::{FileNaming, InstrumentSchema, lookup};
use chrono::{Datelike, NaiveDateTime};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Format code for container outputs.
pub const CONTAINER_FORMAT: &str = "FMT";
/// Format code for flat outputs.
pub const FLAT_FORMAT: &str = "UFMT";

pub fn file_name(naming: &FileNaming, start: NaiveDateTime, format_code: Option<&str>, ext: &str) -> String {
    let mut name = format!(
        "{}_MODI_{}_{}_{}_{}_{}_{}_{}",
        naming.class01,
        naming.class03,
        naming.class04,
        naming.station,
        naming.data_code,
        naming.manufacturer,
        naming.level,
        start.format("%Y%m%d_%H%M%S"),
    );
    if let Some(code) = format_code {
        name.push('_');
        name.push_str(code);
    }
    if naming.quality_controlled {
        name.push_str("_QC");
    }
    name.push('.');
    name.push_str(ext);
    name
}

/// `<base>/<instrument>/<year>/<month>`, month without zero padding.
pub fn output_dir(base: &Path, instrument_id: &str, start: NaiveDateTime) -> PathBuf {
    base.join(instrument_id)
        .join(start.year().to_string())
        .join(start.month().to_string())
}

pub fn output_path(
    base: &Path,
    schema: &InstrumentSchema,
    start: NaiveDateTime,
    format_code: Option<&str>,
    ext: &str,
) -> PathBuf {
    output_dir(base, schema.id, start).join(file_name(&schema.naming, start, format_code, ext))
}

/// Fields recovered from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub class01: String,
    pub class03: String,
    pub class04: String,
    pub station: String,
    pub data_code: String,
    pub manufacturer: String,
    pub level: String,
    pub timestamp: NaiveDateTime,
    pub format_code: Option<String>,
    pub quality_controlled: bool,
    pub extension: String,
}

impl ParsedFileName {
    /// Instrument id implied by the name; ceilometer and radar ids carry the level.
    pub fn instrument_id(&self) -> String {
        match self.data_code.as_str() {
            "YCCL" | "RRD" => format!("{}_{}", self.data_code, self.level),
            other => other.to_string(),
        }
    }

    pub fn schema(&self) -> Result<&'static InstrumentSchema> {
        lookup(&self.instrument_id())
    }
}

fn file_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([A-Za-z0-9]+)_MODI_([A-Za-z0-9]+)_([A-Za-z0-9]+)_([A-Za-z0-9]+)_([A-Za-z0-9]+)_([A-Za-z0-9]+)_([A-Za-z0-9]+)_(\d{8}_\d{6})(?:_([A-Z]+))?(?:_(QC))?\.([A-Za-z0-9]+)$",
        )
        .expect("file name pattern is valid")
    })
}

pub fn parse_file_name(name: &str) -> Result<ParsedFileName> {
    let invalid = || CodecError::invalid_value("file_name", name, "does not follow the output naming scheme");
    let caps = file_name_regex().captures(name).ok_or_else(invalid)?;
    let get = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

    let timestamp = NaiveDateTime::parse_from_str(&get(8).unwrap_or_default(), "%Y%m%d_%H%M%S")
        .map_err(|_| invalid())?;
    let mut format_code = get(9);
    let mut quality_controlled = get(10).is_some();
    // A lone QC suffix is captured by the format group
    if format_code.as_deref() == Some("QC") && !quality_controlled {
        format_code = None;
        quality_controlled = true;
    }

    Ok(ParsedFileName {
        class01: get(1).unwrap_or_default(),
        class03: get(2).unwrap_or_default(),
        class04: get(3).unwrap_or_default(),
        station: get(4).unwrap_or_default(),
        data_code: get(5).unwrap_or_default(),
        manufacturer: get(6).unwrap_or_default(),
        level: get(7).unwrap_or_default(),
        timestamp,
        format_code,
        quality_controlled,
        extension: get(11).unwrap_or_default(),
    })
}

/// Detect the instrument of a flat file from its name.
pub fn detect_instrument(path: &Path) -> Result<&'static InstrumentSchema> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CodecError::invalid_value("file_name", path.display().to_string(), "not valid UTF-8"))?;
    parse_file_name(name)?.schema()
}
