//! Upsert outcomes and per-batch accounting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a single conditional write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Inserted,
    /// Key existed and the payload changed.
    Updated,
    /// Key existed and the payload was identical.
    Unchanged,
}

impl WriteOutcome {
    /// Only an insert adds a new fact.
    pub fn is_fresh(&self) -> bool {
        matches!(self, WriteOutcome::Inserted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Inserted => "inserted",
            WriteOutcome::Updated => "updated",
            WriteOutcome::Unchanged => "unchanged",
        }
    }
}

/// How inserts are told apart from re-observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertStrategy {
    /// Trust the write's affected-rows signal.
    #[default]
    AffectedRows,
    /// Check for an existing row before writing.
    PreReadCompare,
}

impl fmt::Display for UpsertStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertStrategy::AffectedRows => write!(f, "affected_rows"),
            UpsertStrategy::PreReadCompare => write!(f, "pre_read_compare"),
        }
    }
}

/// Classification of one written row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub natural_key: String,
    pub outcome: WriteOutcome,
}

/// Counters for one pipeline invocation.
///
/// `inserted + duplicates + filtered == received` holds for every summary
/// built through `record_*`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchUpsertSummary {
    pub strategy: UpsertStrategy,
    pub received: usize,
    /// Fresh rows.
    pub inserted: usize,
    /// Updated plus unchanged rows.
    pub duplicates: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Rows dropped by the pre-filter before any write.
    pub filtered: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<UpsertOutcome>,
}

impl BatchUpsertSummary {
    pub fn new(strategy: UpsertStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn record_filtered(&mut self) {
        self.received += 1;
        self.filtered += 1;
    }

    pub fn record_write(&mut self, outcome: WriteOutcome) {
        self.received += 1;
        match outcome {
            WriteOutcome::Inserted => self.inserted += 1,
            WriteOutcome::Updated => {
                self.duplicates += 1;
                self.updated += 1;
            }
            WriteOutcome::Unchanged => {
                self.duplicates += 1;
                self.unchanged += 1;
            }
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.inserted + self.duplicates + self.filtered == self.received
            && self.updated + self.unchanged == self.duplicates
    }

    /// Fold another batch of the same pipeline into this one.
    pub fn merge(&mut self, other: BatchUpsertSummary) {
        self.received += other.received;
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.filtered += other.filtered;
        self.outcomes.extend(other.outcomes);
    }
}

impl fmt::Display for BatchUpsertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} fresh={} duplicates={} filtered={}",
            self.received, self.inserted, self.duplicates, self.filtered
        )
    }
}
