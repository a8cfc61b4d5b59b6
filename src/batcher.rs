//! Day batching of an observation stream.
//!
//! [`DayBatcher`] wraps any fallible record iterator (decoder output or a
//! datastore cursor) and yields one [`DayBatch`] per run of records sharing the
//! calendar date of the instrument's primary timestamp. The open batch is
//! flushed when the date changes and once more at end of input.

use crate::error::{CodecError, Result};
use crate::models::{DayBatch, ObservationRecord};
use crate::schema::InstrumentSchema;
use tracing::{debug, info, warn};

pub struct DayBatcher<I> {
    source: I,
    primary_code: &'static str,
    current: Option<DayBatch>,
    limit: Option<usize>,
    emitted: usize,
    records_read: usize,
    finished: bool,
}

impl<I> DayBatcher<I>
where
    I: Iterator<Item = Result<ObservationRecord>>,
{
    pub fn new(schema: &InstrumentSchema, source: I) -> Self {
        Self {
            source,
            primary_code: schema.primary_timestamp,
            current: None,
            limit: None,
            emitted: 0,
            records_read: 0,
            finished: false,
        }
    }

    /// Stop after `n` batches. Once the `n`th batch is out the source is not
    /// read again; only the record that closed that batch has been consumed.
    pub fn with_limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    pub fn batches_emitted(&self) -> usize {
        self.emitted
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|n| self.emitted >= n)
    }

    fn emit(&mut self, batch: DayBatch) -> Option<Result<DayBatch>> {
        self.emitted += 1;
        debug!(
            "Flushing batch {} for {} ({} records)",
            self.emitted,
            batch.date(),
            batch.len()
        );
        Some(Ok(batch))
    }
}

impl<I> Iterator for DayBatcher<I>
where
    I: Iterator<Item = Result<ObservationRecord>>,
{
    type Item = Result<DayBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.limit_reached() {
            self.finished = true;
            return None;
        }

        loop {
            let record = match self.source.next() {
                None => {
                    self.finished = true;
                    let batch = self.current.take()?;
                    return self.emit(batch);
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                Some(Ok(record)) => record,
            };
            self.records_read += 1;

            let Some(ts) = record.timestamp(self.primary_code) else {
                self.finished = true;
                return Some(Err(CodecError::MissingTimestamp {
                    field: self.primary_code.to_string(),
                }));
            };
            let date = ts.date();

            match self.current.as_mut() {
                None => {
                    info!("Found start time {}", ts);
                    self.current = Some(DayBatch::new(date, self.primary_code, record));
                }
                Some(batch) if batch.date() == date => batch.push(record),
                Some(batch) => {
                    if date < batch.date() {
                        warn!(
                            "Timestamp {} goes back from {}; starting a new batch",
                            ts,
                            batch.date()
                        );
                    }
                    let next = DayBatch::new(date, self.primary_code, record);
                    if let Some(done) = self.current.replace(next) {
                        return self.emit(done);
                    }
                }
            }
        }
    }
}

/// Batch an in-memory record list.
pub fn batch_records(
    schema: &InstrumentSchema,
    records: Vec<ObservationRecord>,
) -> Result<Vec<DayBatch>> {
    DayBatcher::new(schema, records.into_iter().map(Ok)).collect()
}
