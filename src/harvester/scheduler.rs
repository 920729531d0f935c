//! Batch scheduler
//!
//! Splits the identifier sequence into fixed-size batches and runs them one at
//! a time. Within a batch every identifier is dispatched at once; the position
//! in the batch pins it to a pool slot, so identifiers sharing a slot queue on
//! that slot's session. A batch is checkpointed only after all of its fetches
//! have finished, and the next batch starts only after the checkpoint is on
//! disk.

use crate::harvester::fetcher::{fetch_record, FetchContext};
use crate::identifier::Identifier;
use crate::output::CheckpointWriter;
use crate::record::{Record, NAME_FIELD};
use crate::session::{Session, SessionPool};
use crate::{FetchError, HarvestError};
use futures::stream::{FuturesUnordered, StreamExt};

/// Lifecycle of a single batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Fetches are being handed to pool slots
    Dispatching,
    /// Outcomes are being gathered in completion order
    Collecting,
    /// Records are durable on disk
    Checkpointed,
}

/// Outcome counts for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_number: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub no_data: usize,
    pub failed: usize,
    pub images: usize,
}

/// Cumulative result of a harvest
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Every successful record, batch by batch
    pub records: Vec<Record>,

    /// Per-batch outcome counts, in batch order
    pub batches: Vec<BatchReport>,
}

impl RunResult {
    pub fn attempted(&self) -> usize {
        self.batches.iter().map(|b| b.attempted).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.records.len()
    }

    pub fn no_data(&self) -> usize {
        self.batches.iter().map(|b| b.no_data).sum()
    }

    pub fn failed(&self) -> usize {
        self.batches.iter().map(|b| b.failed).sum()
    }

    pub fn images(&self) -> usize {
        self.batches.iter().map(|b| b.images).sum()
    }

    fn absorb(&mut self, records: Vec<Record>, report: BatchReport) {
        self.records.extend(records);
        self.batches.push(report);
    }
}

/// Runs batches of fetches against a session pool
pub struct BatchScheduler {
    ctx: FetchContext,
    batch_size: usize,
    writer: CheckpointWriter,
}

impl BatchScheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared fetch settings
    /// * `batch_size` - Identifiers per batch (at least 1)
    /// * `writer` - Destination for per-batch checkpoints
    pub fn new(ctx: FetchContext, batch_size: usize, writer: CheckpointWriter) -> Self {
        Self {
            ctx,
            batch_size: batch_size.max(1),
            writer,
        }
    }

    pub fn checkpoint_writer(&self) -> &CheckpointWriter {
        &self.writer
    }

    /// Number of batches the given identifiers will be split into
    pub fn batch_count(&self, identifiers: &[Identifier]) -> usize {
        identifiers.len().div_ceil(self.batch_size)
    }

    /// Harvests every identifier, checkpointing after each batch
    ///
    /// Per-identifier failures are logged and left out of the result. Only a
    /// failed checkpoint write stops the run.
    ///
    /// # Returns
    ///
    /// * `Ok(RunResult)` - All batches ran and were checkpointed
    /// * `Err(HarvestError::Checkpoint)` - A batch could not be persisted
    pub async fn run<S: Session>(
        &self,
        identifiers: &[Identifier],
        pool: &SessionPool<S>,
    ) -> Result<RunResult, HarvestError> {
        let total_batches = self.batch_count(identifiers);
        let mut result = RunResult::default();

        for (index, batch) in identifiers.chunks(self.batch_size).enumerate() {
            let batch_number = index + 1;
            tracing::info!(
                "Batch {}/{}: {} identifiers",
                batch_number,
                total_batches,
                batch.len()
            );

            let (records, report) = self.run_batch(batch_number, batch, pool).await;

            self.writer.write_batch(&records, batch_number).await?;
            tracing::debug!("Batch {} -> {:?}", batch_number, BatchPhase::Checkpointed);

            tracing::info!(
                "Batch {} done: {} records, {} without data, {} failed",
                batch_number,
                report.succeeded,
                report.no_data,
                report.failed
            );

            result.absorb(records, report);
        }

        Ok(result)
    }

    /// Dispatches one batch and collects its outcomes
    async fn run_batch<S: Session>(
        &self,
        batch_number: usize,
        batch: &[Identifier],
        pool: &SessionPool<S>,
    ) -> (Vec<Record>, BatchReport) {
        tracing::debug!("Batch {} -> {:?}", batch_number, BatchPhase::Dispatching);

        let ctx = &self.ctx;
        let mut in_flight: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(move |(position, identifier)| async move {
                let mut session = pool.acquire(position).await;
                let outcome = fetch_record(identifier, &mut *session, ctx).await;
                (identifier, outcome)
            })
            .collect();

        tracing::debug!("Batch {} -> {:?}", batch_number, BatchPhase::Collecting);

        let mut records = Vec::new();
        let mut report = BatchReport {
            batch_number,
            attempted: batch.len(),
            ..Default::default()
        };

        while let Some((identifier, outcome)) = in_flight.next().await {
            match outcome {
                Ok(record) => {
                    tracing::info!(
                        "✓ {}: {}",
                        identifier,
                        record.get(NAME_FIELD).unwrap_or("Not found")
                    );
                    if record.image_path().is_some() {
                        report.images += 1;
                    }
                    report.succeeded += 1;
                    records.push(record);
                }
                Err(FetchError::NoData { .. }) => {
                    tracing::info!("Failed to scrape data for student ID: {}", identifier);
                    report.no_data += 1;
                }
                Err(e @ FetchError::Unexpected { .. }) => {
                    tracing::warn!("{}", e);
                    report.failed += 1;
                }
            }
        }

        (records, report)
    }
}
