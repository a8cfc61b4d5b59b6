//! Configuration management and validation.
//!
//! Provides the run configuration shared by the `generate` and `decode`
//! commands: where outputs go, which datastore to read, which output forms to
//! write and how sample mode behaves.

use crate::error::{CodecError, Result};
use crate::store::Credentials;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default collection suffix appended to the instrument id
pub const DEFAULT_COLLECTION_SUFFIX: &str = "_VQ";

/// Which output forms to write for each day batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Hierarchical container only
    Container,
    /// Flat tagged-row CSV only
    Flat,
    /// Both forms
    Both,
}

impl OutputFormat {
    pub fn writes_container(&self) -> bool {
        matches!(self, OutputFormat::Container | OutputFormat::Both)
    }

    pub fn writes_flat(&self) -> bool {
        matches!(self, OutputFormat::Flat | OutputFormat::Both)
    }
}

/// Main configuration for codec runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Base directory for `<instrument>/<year>/<month>/` output trees
    pub output_dir: PathBuf,

    /// Directory holding the JSON-lines collections
    pub datastore_root: PathBuf,

    /// Database name, a sub-directory of the datastore root when set
    pub database: Option<String>,

    /// Credentials handed to the datastore
    pub credentials: Credentials,

    /// Output forms to write
    pub format: OutputFormat,

    /// Stop after `sample_size` day batches per instrument
    pub sample_mode: bool,

    /// Number of batches written in sample mode
    pub sample_size: usize,

    /// Per-instrument collection suffix overrides (e.g. `_VQ1`)
    pub collection_suffixes: HashMap<String, String>,

    /// Directory of `<instrument>.csv` header templates
    pub header_dir: Option<PathBuf>,

    /// Show progress bars
    pub show_progress: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        let data_root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensor-codec");
        Self {
            output_dir: PathBuf::from("output"),
            datastore_root: data_root.join("store"),
            database: None,
            credentials: Credentials::default(),
            format: OutputFormat::Both,
            sample_mode: false,
            sample_size: 3,
            collection_suffixes: HashMap::new(),
            header_dir: None,
            show_progress: true,
        }
    }
}

impl CodecConfig {
    /// Create new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_datastore_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.datastore_root = root.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable sample mode writing at most `sample_size` batches
    pub fn with_sample(mut self, sample_size: usize) -> Self {
        self.sample_mode = true;
        self.sample_size = sample_size;
        self
    }

    pub fn with_collection_suffix(mut self, instrument_id: &str, suffix: &str) -> Self {
        self.collection_suffixes
            .insert(instrument_id.to_string(), suffix.to_string());
        self
    }

    pub fn with_header_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.header_dir = Some(dir.into());
        self
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Collection holding an instrument's documents
    pub fn collection_name(&self, instrument_id: &str) -> String {
        let suffix = self
            .collection_suffixes
            .get(instrument_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLLECTION_SUFFIX);
        format!("{}{}", instrument_id, suffix)
    }

    /// Directory the datastore reads collections from
    pub fn store_dir(&self) -> PathBuf {
        match &self.database {
            Some(db) => self.datastore_root.join(db),
            None => self.datastore_root.clone(),
        }
    }

    /// Batch limit for the day batcher, if any
    pub fn batch_limit(&self) -> Option<usize> {
        self.sample_mode.then_some(self.sample_size)
    }

    /// Header template path for an instrument, when a template directory is set
    pub fn header_template(&self, instrument_id: &str) -> Option<PathBuf> {
        self.header_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.csv", instrument_id)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_mode && self.sample_size == 0 {
            return Err(CodecError::Configuration {
                message: "sample size must be at least 1".to_string(),
            });
        }
        for (id, suffix) in &self.collection_suffixes {
            crate::schema::lookup(id)?;
            if suffix.is_empty() {
                return Err(CodecError::Configuration {
                    message: format!("empty collection suffix for {}", id),
                });
            }
        }
        Ok(())
    }
}
