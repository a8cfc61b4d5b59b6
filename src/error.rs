//! Error handling for codec operations.
//!
//! Provides error types with enough context (instrument, file or collection,
//! field code) to tell which input a decode/encode failure belongs to.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown instrument: {id}")]
    UnknownInstrument { id: String },

    #[error("Schema mismatch in {source_name}: {reason}")]
    SchemaMismatch { source_name: String, reason: String },

    #[error("Malformed block for field '{field}' in {source_name}: {reason}")]
    MalformedBlock {
        source_name: String,
        field: String,
        reason: String,
    },

    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Record has no usable primary timestamp in field '{field}'")]
    MissingTimestamp { field: String },

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Datastore error on collection {collection}: {reason}")]
    Datastore { collection: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[cfg(feature = "netcdf")]
    #[error("netCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

impl CodecError {
    pub fn schema_mismatch(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_block(
        source_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedBlock {
            source_name: source_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Attach the originating file or collection to decode errors raised
    /// before the source name was known.
    pub fn with_source(self, name: &str) -> Self {
        match self {
            Self::SchemaMismatch { source_name, reason } if source_name.is_empty() => {
                Self::SchemaMismatch {
                    source_name: name.to_string(),
                    reason,
                }
            }
            Self::MalformedBlock {
                source_name,
                field,
                reason,
            } if source_name.is_empty() => Self::MalformedBlock {
                source_name: name.to_string(),
                field,
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
