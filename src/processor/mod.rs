//! Batch driver.
//!
//! Pulls records from a datastore cursor or a decoded flat file, splits them
//! into day batches and writes each batch in the configured output forms
//! under `<output_dir>/<instrument>/<year>/<month>/`.

#[cfg(test)]
pub mod tests;

use crate::batcher::DayBatcher;
use crate::config::CodecConfig;
use crate::decoder;
use crate::encoder::{
    ContainerSink, encode_container_at, encode_flat_at, unplaced_records, write_atomic,
};
use crate::error::{CodecError, Result};
use crate::models::{DayBatch, HeaderRecord, ObservationRecord, ProcessingStats};
use crate::naming::{CONTAINER_FORMAT, FLAT_FORMAT, output_path};
use crate::schema::{self, InstrumentSchema};
use crate::store::{CursorRecords, Datastore, DocumentCursor};
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Progress bar in the crate's style, hidden when progress is off.
pub fn progress_bar(len: u64, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Header with every value blank, used when no template is configured.
pub fn blank_header(schema: &InstrumentSchema) -> HeaderRecord {
    HeaderRecord::new(vec![String::new(); schema.header_fields.len()])
}

/// Files produced for one day batch.
#[derive(Debug, Default)]
pub struct WrittenBatch {
    pub paths: Vec<PathBuf>,
    /// How many of `paths` replaced an existing file
    pub overwritten: usize,
}

impl WrittenBatch {
    fn note_existing(&mut self, path: &Path) {
        if path.exists() {
            warn!("Overwriting existing output {}", path.display());
            self.overwritten += 1;
        }
    }
}

pub struct BatchProcessor {
    config: CodecConfig,
    store: Box<dyn Datastore>,
    sink: Box<dyn ContainerSink>,
    /// Fixed creation time for reproducible output
    created: Option<NaiveDateTime>,
}

impl BatchProcessor {
    pub fn new(config: CodecConfig, store: Box<dyn Datastore>) -> Self {
        Self {
            config,
            store,
            sink: default_sink(),
            created: None,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ContainerSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_creation_time(mut self, created: NaiveDateTime) -> Self {
        self.created = Some(created);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn creation_time(&self) -> NaiveDateTime {
        self.created.unwrap_or_else(crate::encoder::creation_time)
    }

    /// Header for an instrument: its template when configured, blank otherwise.
    pub fn header_for(&self, schema: &InstrumentSchema) -> Result<HeaderRecord> {
        match self.config.header_template(schema.id) {
            Some(path) if path.exists() => decoder::read_header_file(schema, &path),
            Some(path) => {
                warn!("No header template at {}; using blank header", path.display());
                Ok(blank_header(schema))
            }
            None => Ok(blank_header(schema)),
        }
    }

    /// Encode one batch in every configured form and write it out.
    pub fn write_batch(
        &self,
        schema: &InstrumentSchema,
        header: &HeaderRecord,
        batch: &DayBatch,
    ) -> Result<WrittenBatch> {
        let start = batch.start_time().ok_or_else(|| CodecError::MissingTimestamp {
            field: schema.primary_timestamp.to_string(),
        })?;
        let created = self.creation_time();
        let base = &self.config.output_dir;
        let mut written = WrittenBatch::default();

        let unplaced = unplaced_records(schema, batch);
        if unplaced > 0 {
            warn!(
                "{} {}: {} records have no sub-series value and are left out",
                schema.id,
                batch.date(),
                unplaced
            );
        }

        if self.config.format.writes_container() {
            let container = encode_container_at(schema, header, batch, created)?;
            let path = output_path(base, schema, start, Some(CONTAINER_FORMAT), self.sink.extension());
            written.note_existing(&path);
            self.sink.write(&container, &path)?;
            written.paths.push(path);
        }
        if self.config.format.writes_flat() {
            let bytes = encode_flat_at(schema, header, batch, created)?;
            let path = output_path(base, schema, start, Some(FLAT_FORMAT), "csv");
            written.note_existing(&path);
            write_atomic(&path, &bytes)?;
            written.paths.push(path);
        }
        info!(
            "{}: wrote {} records for {} to {} file(s)",
            schema.id,
            batch.len(),
            batch.date(),
            written.paths.len()
        );
        Ok(written)
    }

    /// Batch `records` by day and write every batch.
    fn write_all<I>(
        &self,
        schema: &InstrumentSchema,
        header: &HeaderRecord,
        records: I,
        pb: &ProgressBar,
    ) -> Result<ProcessingStats>
    where
        I: Iterator<Item = Result<ObservationRecord>>,
    {
        let mut batcher = DayBatcher::new(schema, records);
        if let Some(limit) = self.config.batch_limit() {
            debug!("Sample mode: at most {} batches", limit);
            batcher = batcher.with_limit(limit);
        }

        let mut stats = ProcessingStats::default();
        for batch in batcher.by_ref() {
            let batch = batch?;
            pb.set_message(format!("{} {}", schema.id, batch.date()));
            let written = self.write_batch(schema, header, &batch)?;
            stats.files_overwritten += written.overwritten;
            stats.outputs.extend(written.paths);
            stats.batches_written += 1;
            pb.tick();
        }
        stats.records_read = batcher.records_read();
        Ok(stats)
    }

    fn drain_cursor(
        &self,
        schema: &InstrumentSchema,
        header: &HeaderRecord,
        cursor: &mut dyn DocumentCursor,
        collection: &str,
        pb: &ProgressBar,
    ) -> Result<ProcessingStats> {
        let records = CursorRecords::new(schema, cursor, collection);
        self.write_all(schema, header, records, pb)
    }

    /// Generate daily outputs for one instrument from its datastore collection.
    ///
    /// The cursor is closed on every path, including errors and an early
    /// stop in sample mode.
    pub fn generate_instrument(
        &self,
        schema: &InstrumentSchema,
        header: &HeaderRecord,
    ) -> Result<ProcessingStats> {
        let collection = self.config.collection_name(schema.id);
        info!("{}: reading collection {}", schema.id, collection);
        let mut cursor = self.store.open(
            &collection,
            schema.primary_timestamp,
            &self.config.credentials,
        )?;

        let pb = ProgressBar::hidden();
        let result = self.drain_cursor(schema, header, cursor.as_mut(), &collection, &pb);
        let closed = cursor.close();

        let mut stats = result?;
        closed?;
        stats.instruments_processed = 1;
        Ok(stats)
    }

    /// Generate every listed instrument, skipping the ones that fail.
    pub fn generate(&self, instrument_ids: &[String]) -> ProcessingStats {
        let start = Instant::now();
        let mut stats = ProcessingStats::default();
        let pb = progress_bar(instrument_ids.len() as u64, self.config.show_progress);

        for id in instrument_ids {
            pb.set_message(id.clone());
            let outcome = schema::lookup(id).and_then(|schema| {
                let header = self.header_for(schema)?;
                self.generate_instrument(schema, &header)
            });
            match outcome {
                Ok(instrument_stats) => stats.merge(instrument_stats),
                Err(e) => {
                    error!("Skipping {}: {}", id, e);
                    stats.instruments_failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        stats.processing_time_ms = start.elapsed().as_millis();
        stats
    }

    /// Decode one flat file and re-emit it batch by batch.
    pub fn decode_file(&self, schema: &InstrumentSchema, path: &Path) -> Result<ProcessingStats> {
        let (header, records) = decoder::decode_file(schema, path)?;
        let pb = ProgressBar::hidden();
        let mut stats = self.write_all(schema, &header, records.into_iter().map(Ok), &pb)?;
        stats.files_decoded = 1;
        Ok(stats)
    }

    /// Decode several files, each with its own instrument; failures are counted and skipped.
    pub fn decode_files(&self, inputs: &[(PathBuf, &'static InstrumentSchema)]) -> ProcessingStats {
        let start = Instant::now();
        let mut stats = ProcessingStats::default();
        let pb = progress_bar(inputs.len() as u64, self.config.show_progress);

        for (path, schema) in inputs {
            pb.set_message(path.display().to_string());
            match self.decode_file(schema, path) {
                Ok(file_stats) => stats.merge(file_stats),
                Err(e) => {
                    error!("Failed to decode {}: {}", path.display(), e);
                    stats.files_failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        stats.processing_time_ms = start.elapsed().as_millis();
        stats
    }
}

#[cfg(feature = "netcdf")]
fn default_sink() -> Box<dyn ContainerSink> {
    Box::new(crate::encoder::NetCdfSink)
}

#[cfg(not(feature = "netcdf"))]
fn default_sink() -> Box<dyn ContainerSink> {
    Box::new(crate::encoder::JsonContainerSink)
}
