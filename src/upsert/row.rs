//! Rows handed to the upsert classifier.

use serde::{Deserialize, Serialize};

use crate::storage::models::FieldValue;

/// A row with a natural key and, optionally, numeric signal fields.
pub trait UpsertRow {
    /// Key the storage uniqueness constraint is defined on.
    fn natural_key(&self) -> String;

    /// Payload values checked by the no-signal pre-filter. `None` is a
    /// missing value; anything other than zero counts as signal.
    fn signal_values(&self) -> Vec<Option<f64>> {
        Vec::new()
    }
}

/// A row that can be bound to an `UpsertTable` statement.
pub trait SqlRow: UpsertRow {
    fn key_values(&self) -> Vec<FieldValue>;
    fn payload_values(&self) -> Vec<FieldValue>;
}

/// Generic keyed row: key parts followed by payload values, in table
/// column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: Vec<FieldValue>,
    pub values: Vec<FieldValue>,
}

impl Record {
    pub fn new(key: Vec<FieldValue>, values: Vec<FieldValue>) -> Self {
        Self { key, values }
    }
}

impl UpsertRow for Record {
    fn natural_key(&self) -> String {
        self.key
            .iter()
            .map(FieldValue::key_part)
            .collect::<Vec<_>>()
            .join("|")
    }

    fn signal_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(signal_of).collect()
    }
}

/// Numeric view of a payload value. Non-numeric text is signal, so it maps
/// to NaN, which never compares equal to zero.
fn signal_of(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Text(s) if s.trim().is_empty() => None,
        FieldValue::Text(_) => Some(value.as_f64().unwrap_or(f64::NAN)),
        other => other.as_f64(),
    }
}

impl SqlRow for Record {
    fn key_values(&self) -> Vec<FieldValue> {
        self.key.clone()
    }

    fn payload_values(&self) -> Vec<FieldValue> {
        self.values.clone()
    }
}
