//! The conditional-write seam.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::StoreResult;
use crate::storage::models::FieldValue;
use crate::upsert::outcome::WriteOutcome;
use crate::upsert::row::{SqlRow, UpsertRow};

/// Insert-or-update-on-conflict primitive.
pub trait UpsertWriter<R: ?Sized> {
    /// Write the row, reporting what the storage did.
    fn write(&mut self, row: &R) -> StoreResult<WriteOutcome>;

    /// Whether a row with the same natural key is already stored.
    fn exists(&mut self, row: &R) -> StoreResult<bool>;
}

/// Keyed in-memory store with the same write semantics as the SQL writer.
#[derive(Debug, Default)]
pub struct MemoryUpsertWriter {
    rows: HashMap<String, Vec<FieldValue>>,
}

impl MemoryUpsertWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[FieldValue]> {
        self.rows.get(key).map(|v| v.as_slice())
    }
}

impl<R: SqlRow> UpsertWriter<R> for MemoryUpsertWriter {
    fn write(&mut self, row: &R) -> StoreResult<WriteOutcome> {
        let payload = row.payload_values();
        match self.rows.entry(row.natural_key()) {
            Entry::Vacant(slot) => {
                slot.insert(payload);
                Ok(WriteOutcome::Inserted)
            }
            Entry::Occupied(slot) if *slot.get() == payload => Ok(WriteOutcome::Unchanged),
            Entry::Occupied(mut slot) => {
                slot.insert(payload);
                Ok(WriteOutcome::Updated)
            }
        }
    }

    fn exists(&mut self, row: &R) -> StoreResult<bool> {
        Ok(self.rows.contains_key(&UpsertRow::natural_key(row)))
    }
}
