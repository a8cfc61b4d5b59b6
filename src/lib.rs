//! Sensor Codec Library
//!
//! Schema-driven encoding of environmental sensor observations.
//!
//! This library provides tools for:
//! - Describing twelve instruments (header fields, observation fields, shapes)
//! - Decoding flat tagged CSV files and datastore documents into records
//! - Splitting time-ordered records into calendar-day batches
//! - Encoding day batches as hierarchical containers and flat CSV files
//! - Naming and placing outputs under `<instrument>/<year>/<month>/`

pub mod batcher;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod models;
pub mod naming;
pub mod processor;
pub mod schema;
pub mod store;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use batcher::{DayBatcher, batch_records};
pub use config::{CodecConfig, OutputFormat};
pub use error::{CodecError, Result};
pub use models::{DayBatch, HeaderRecord, NdArray, ObservationRecord, ProcessingStats, Value};
pub use schema::{InstrumentSchema, lookup};
