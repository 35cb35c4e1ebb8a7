//! Batch upsert classification.
//!
//! Coordinates one pipeline batch:
//! 1. Pre-filter no-signal rows
//! 2. Conditional write (with a pre-read under `PreReadCompare`)
//! 3. Fresh / duplicate accounting
//! 4. Batch summary log

use crate::error::{StoreError, UpsertError};
use crate::pipeline::context::BatchContext;
use crate::upsert::filter::PreFilter;
use crate::upsert::outcome::{BatchUpsertSummary, UpsertOutcome, UpsertStrategy, WriteOutcome};
use crate::upsert::row::UpsertRow;
use crate::upsert::writer::UpsertWriter;

/// How a batch is classified.
#[derive(Debug)]
pub struct UpsertOptions<R> {
    /// Pipeline name used in logs.
    pub pipeline: String,
    pub strategy: UpsertStrategy,
    pub pre_filter: PreFilter<R>,
    /// Retain one `UpsertOutcome` per written row in the summary.
    pub keep_outcomes: bool,
}

impl<R> UpsertOptions<R> {
    pub fn new(pipeline: &str) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            strategy: UpsertStrategy::default(),
            pre_filter: PreFilter::default(),
            keep_outcomes: false,
        }
    }

    pub fn strategy(mut self, strategy: UpsertStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn pre_filter(mut self, pre_filter: PreFilter<R>) -> Self {
        self.pre_filter = pre_filter;
        self
    }

    pub fn keep_outcomes(mut self, keep: bool) -> Self {
        self.keep_outcomes = keep;
        self
    }
}

/// Classify and write a batch of rows.
///
/// A writer failure aborts the batch with the failing row's key; rows
/// already written are not rolled back unless the writer runs inside a
/// transaction (see `storage::sqlite::classify_in_transaction`).
pub fn classify_upsert_batch<R, W>(
    rows: &[R],
    writer: &mut W,
    options: &UpsertOptions<R>,
) -> Result<BatchUpsertSummary, UpsertError>
where
    R: UpsertRow,
    W: UpsertWriter<R> + ?Sized,
{
    let ctx = BatchContext::new(&options.pipeline);
    let log_ctx = ctx.log_context();
    let mut summary = BatchUpsertSummary::new(options.strategy);

    for row in rows {
        if options.pre_filter.drops(row) {
            crate::log_debug!(log_ctx, "UPSERT_FILTERED", key = row.natural_key());
            summary.record_filtered();
            continue;
        }

        let outcome = classify_row(row, writer, options.strategy).map_err(|source| {
            let key = row.natural_key();
            log::error!("{} UPSERT_FAILED key={} error={}", log_ctx, key, source);
            UpsertError::Write { key, source }
        })?;

        summary.record_write(outcome);
        if options.keep_outcomes {
            summary.outcomes.push(UpsertOutcome {
                natural_key: row.natural_key(),
                outcome,
            });
        }
    }

    if summary.filtered > 0 {
        log::info!(
            "{} UPSERT_FILTERED filtered={} received={}",
            log_ctx,
            summary.filtered,
            summary.received
        );
    }

    log::info!(
        "{} UPSERT_BATCH_COMPLETE strategy={} {}",
        log_ctx,
        summary.strategy,
        summary
    );

    Ok(summary)
}

fn classify_row<R, W>(
    row: &R,
    writer: &mut W,
    strategy: UpsertStrategy,
) -> Result<WriteOutcome, StoreError>
where
    R: UpsertRow,
    W: UpsertWriter<R> + ?Sized,
{
    match strategy {
        UpsertStrategy::AffectedRows => writer.write(row),
        UpsertStrategy::PreReadCompare => {
            let existed = writer.exists(row)?;
            let signal = writer.write(row)?;
            Ok(match (existed, signal) {
                (false, _) => WriteOutcome::Inserted,
                // Row appeared between the read and the write
                (true, WriteOutcome::Inserted) => WriteOutcome::Updated,
                (true, other) => other,
            })
        }
    }
}
