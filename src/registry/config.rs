//! Per-stream configuration.
//!
//! A `StreamConfig` is immutable once built. Overrides (encoding,
//! thresholds) are applied on the builder before `build()`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

lazy_static! {
    /// Plain column identifier.
    static ref COLUMN_IDENT: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();

    /// Table identifier, optionally schema-qualified.
    static ref TABLE_IDENT: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap();
}

/// True for a plain column identifier.
pub fn is_column_identifier(name: &str) -> bool {
    COLUMN_IDENT.is_match(name)
}

/// True for a table identifier, optionally schema-qualified.
pub fn is_table_identifier(name: &str) -> bool {
    TABLE_IDENT.is_match(name)
}

/// How a stream's time column is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEncoding {
    #[default]
    EpochMillis,
    EpochSeconds,
    /// Wall-clock datetime text in UTC+7, converted in SQL.
    Datetime,
}

impl TimeEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeEncoding::EpochMillis => "epoch_millis",
            TimeEncoding::EpochSeconds => "epoch_seconds",
            TimeEncoding::Datetime => "datetime",
        }
    }
}

/// Maximum age in hours for each freshness bucket. Older than `moderate`
/// is stale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub very_fresh: f64,
    pub fresh: f64,
    pub moderate: f64,
}

impl Thresholds {
    pub const fn new(very_fresh: f64, fresh: f64, moderate: f64) -> Self {
        Self {
            very_fresh,
            fresh,
            moderate,
        }
    }

    /// Thresholds for daily-updated feeds such as the ETF streams.
    pub const fn daily() -> Self {
        Self::new(24.0, 48.0, 72.0)
    }

    pub fn validate(&self, stream: &str) -> RegistryResult<()> {
        let values = [self.very_fresh, self.fresh, self.moderate];

        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(RegistryError::InvalidThresholds {
                stream: stream.to_string(),
                reason: format!("thresholds must be finite and non-negative, got {:?}", values),
            });
        }

        if !(self.very_fresh < self.fresh && self.fresh < self.moderate) {
            return Err(RegistryError::InvalidThresholds {
                stream: stream.to_string(),
                reason: format!(
                    "thresholds must be strictly increasing, got very_fresh={} fresh={} moderate={}",
                    self.very_fresh, self.fresh, self.moderate
                ),
            });
        }

        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(1.0, 6.0, 24.0)
    }
}

/// Storage location and thresholds for one monitored stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamConfig {
    name: String,
    table: String,
    time_column: String,
    time_encoding: TimeEncoding,
    thresholds: Thresholds,
}

impl StreamConfig {
    pub fn builder(name: &str, table: &str, time_column: &str) -> StreamConfigBuilder {
        StreamConfigBuilder {
            name: name.to_string(),
            table: table.to_string(),
            time_column: time_column.to_string(),
            time_encoding: TimeEncoding::default(),
            thresholds: Thresholds::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    pub fn time_encoding(&self) -> TimeEncoding {
        self.time_encoding
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

/// Builder for `StreamConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfigBuilder {
    name: String,
    table: String,
    time_column: String,
    #[serde(default)]
    time_encoding: TimeEncoding,
    #[serde(default)]
    thresholds: Thresholds,
}

impl StreamConfigBuilder {
    pub fn encoding(mut self, encoding: TimeEncoding) -> Self {
        self.time_encoding = encoding;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(self) -> RegistryResult<StreamConfig> {
        if !is_table_identifier(&self.table) {
            return Err(RegistryError::InvalidIdentifier {
                stream: self.name,
                identifier: self.table,
            });
        }
        if !is_column_identifier(&self.time_column) {
            return Err(RegistryError::InvalidIdentifier {
                stream: self.name,
                identifier: self.time_column,
            });
        }
        self.thresholds.validate(&self.name)?;

        Ok(StreamConfig {
            name: self.name,
            table: self.table,
            time_column: self.time_column,
            time_encoding: self.time_encoding,
            thresholds: self.thresholds,
        })
    }
}
