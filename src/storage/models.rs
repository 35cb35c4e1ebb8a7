//! Storage-side value types.

use serde::{Deserialize, Serialize};

/// Latest representable instant accepted as a timestamp (9999-12-31T23:59:59.999Z).
pub const MAX_TIMESTAMP_MILLIS: i64 = 253_402_300_799_999;

/// Result of the aggregate `COUNT/MAX/MIN` query, times in epoch ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamStats {
    pub total_records: u64,
    pub latest_millis: Option<i64>,
    pub earliest_millis: Option<i64>,
}

/// A column value for upsert statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Numeric view used by no-signal filters.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Real(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Null => None,
        }
    }

    /// Rendering used when joining natural key parts.
    pub fn key_part(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Real(f) => f.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Null => String::new(),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Accept an epoch-ms value only if it falls in `0..=MAX_TIMESTAMP_MILLIS`.
pub fn checked_millis(millis: i64) -> Option<i64> {
    (0..=MAX_TIMESTAMP_MILLIS).contains(&millis).then_some(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_millis_range() {
        assert_eq!(checked_millis(1_700_000_000_000), Some(1_700_000_000_000));
        assert_eq!(checked_millis(-1), None);
        assert_eq!(checked_millis(MAX_TIMESTAMP_MILLIS + 1), None);
    }

    #[test]
    fn test_field_value_numeric_view() {
        assert_eq!(FieldValue::from(0i64).as_f64(), Some(0.0));
        assert_eq!(FieldValue::from("0.00000000").as_f64(), Some(0.0));
        assert_eq!(FieldValue::from("BTCUSDT").as_f64(), None);
        assert_eq!(FieldValue::from(None::<f64>), FieldValue::Null);
    }
}
