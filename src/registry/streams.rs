//! The stream registry.
//!
//! Declaration order is preserved: reports list streams in the order they
//! were registered, not in evaluation completion order.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::config::{StreamConfig, StreamConfigBuilder, Thresholds, TimeEncoding};

/// Immutable, ordered set of stream configurations.
#[derive(Debug, Clone, Default)]
pub struct StreamRegistry {
    streams: Vec<StreamConfig>,
    index: HashMap<String, usize>,
}

impl StreamRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a stream. A miss is an error, never a default config.
    pub fn get(&self, name: &str) -> RegistryResult<&StreamConfig> {
        self.index
            .get(name)
            .map(|&i| &self.streams[i])
            .ok_or_else(|| RegistryError::UnknownStream(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Configs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &StreamConfig> {
        self.streams.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.streams.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Parse a registry from JSON.
    ///
    /// ```json
    /// {"streams": [{"name": "funding_rate", "table": "cg_funding_rate_history",
    ///               "time_column": "time", "time_encoding": "epoch_millis",
    ///               "thresholds": {"very_fresh": 1, "fresh": 6, "moderate": 24}}]}
    /// ```
    pub fn from_json_str(json: &str) -> RegistryResult<Self> {
        #[derive(Deserialize)]
        struct RegistryFile {
            streams: Vec<StreamConfigBuilder>,
        }

        let file: RegistryFile = serde_json::from_str(json)?;
        let mut builder = RegistryBuilder::default();
        for stream in file.streams {
            builder = builder.stream(stream)?;
        }
        let registry = builder.build();

        log::info!("REGISTRY_LOADED source=json streams={}", registry.len());
        Ok(registry)
    }

    /// Read and parse a registry file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading stream registry {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("parsing stream registry {}", path.display()))
    }

    /// The market-data streams monitored by the ingestion system.
    pub fn builtin() -> Self {
        use TimeEncoding::{Datetime, EpochMillis};

        let streams: &[(&str, &str, &str, TimeEncoding)] = &[
            // Futures
            ("funding_rate", "cg_funding_rate_history", "time", EpochMillis),
            ("oi_aggregated_history", "cg_open_interest_aggregated_history", "time", EpochMillis),
            ("long_short_ratio_top_account", "cg_long_short_top_account_ratio_history", "time", EpochMillis),
            ("long_short_ratio_global_account", "cg_long_short_global_account_ratio_history", "time", EpochMillis),
            // Spot
            ("spot_orderbook", "cg_spot_orderbook_history", "time", EpochMillis),
            ("spot_orderbook_aggregated", "cg_spot_orderbook_aggregated", "time", EpochMillis),
            ("spot_coins_markets", "cg_spot_coins_markets", "updated_at", Datetime),
            ("spot_pairs_markets", "cg_spot_pairs_markets", "updated_at", Datetime),
            ("spot_price_history", "cg_spot_price_history", "time", EpochMillis),
            // Bitcoin ETF
            ("bitcoin_etf_list", "cg_bitcoin_etf_list", "update_timestamp", EpochMillis),
            ("bitcoin_etf_premium_discount", "cg_bitcoin_etf_premium_discount_history", "timestamp", EpochMillis),
            // Macro
            ("bitcoin_vs_global_m2_growth", "cg_bitcoin_vs_global_m2_growth", "timestamp", EpochMillis),
            // Options
            ("option_exchange_oi_history", "cg_option_exchange_oi_history", "updated_at", Datetime),
            ("open_interest_aggregated_stablecoin_history", "cg_open_interest_aggregated_stablecoin_history", "time", EpochMillis),
            ("exchange_rank", "cg_exchange_rank", "create_time", EpochMillis),
            // Sentiment and on-chain
            ("fear_greed_index", "cg_fear_greed_index", "updated_at", Datetime),
            ("hyperliquid_whale_alert", "cg_hyperliquid_whale_alert", "create_time", EpochMillis),
            ("whale_transfer", "cg_whale_transfer", "block_timestamp", EpochMillis),
        ];

        // ETF feeds update once per trading day
        let daily = ["bitcoin_etf_list", "bitcoin_etf_premium_discount"];

        let mut registry = RegistryBuilder::default();
        for &(name, table, column, encoding) in streams {
            let mut builder = StreamConfig::builder(name, table, column).encoding(encoding);
            if daily.contains(&name) {
                builder = builder.thresholds(Thresholds::daily());
            }
            if let Err(e) = registry.push(builder) {
                log::error!("REGISTRY_BUILTIN_INVALID stream={} error={}", name, e);
            }
        }
        registry.build()
    }
}

/// Collects stream configs, rejecting duplicates.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    streams: Vec<StreamConfig>,
}

impl RegistryBuilder {
    /// Validate and add a stream.
    pub fn stream(mut self, builder: StreamConfigBuilder) -> RegistryResult<Self> {
        self.push(builder)?;
        Ok(self)
    }

    pub fn push(&mut self, builder: StreamConfigBuilder) -> RegistryResult<()> {
        let config = builder.build()?;
        if self.streams.iter().any(|s| s.name() == config.name()) {
            return Err(RegistryError::DuplicateStream(config.name().to_string()));
        }
        self.streams.push(config);
        Ok(())
    }

    pub fn build(self) -> StreamRegistry {
        let index = self
            .streams
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name().to_string(), i))
            .collect();

        StreamRegistry {
            streams: self.streams,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = StreamRegistry::builtin();
        assert_eq!(registry.len(), 18);

        let etf = registry.get("bitcoin_etf_list").unwrap();
        assert_eq!(*etf.thresholds(), Thresholds::daily());

        let fr = registry.get("funding_rate").unwrap();
        assert_eq!(*fr.thresholds(), Thresholds::default());

        let fgi = registry.get("fear_greed_index").unwrap();
        assert_eq!(fgi.time_encoding(), TimeEncoding::Datetime);
    }

    #[test]
    fn test_unknown_stream_is_error() {
        let registry = StreamRegistry::builtin();
        let err = registry.get("oi_history").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownStream(name) if name == "oi_history"));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let registry = StreamRegistry::builder()
            .stream(StreamConfig::builder("zeta", "t_zeta", "time"))
            .unwrap()
            .stream(StreamConfig::builder("alpha", "t_alpha", "time"))
            .unwrap()
            .build();

        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_duplicate_stream_rejected() {
        let err = StreamRegistry::builder()
            .stream(StreamConfig::builder("a", "t1", "time"))
            .unwrap()
            .stream(StreamConfig::builder("a", "t2", "time"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateStream(_)));
    }

    #[test]
    fn test_from_json_with_optional_fields() {
        let json = r#"{
            "streams": [
                {"name": "funding_rate", "table": "cg_funding_rate_history", "time_column": "time"},
                {"name": "fear_greed_index", "table": "cg_fear_greed_index",
                 "time_column": "updated_at", "time_encoding": "datetime",
                 "thresholds": {"very_fresh": 2, "fresh": 12, "moderate": 48}}
            ]
        }"#;

        let registry = StreamRegistry::from_json_str(json).unwrap();
        assert_eq!(registry.names(), vec!["funding_rate", "fear_greed_index"]);

        let fgi = registry.get("fear_greed_index").unwrap();
        assert_eq!(fgi.time_encoding(), TimeEncoding::Datetime);
        assert_eq!(*fgi.thresholds(), Thresholds::new(2.0, 12.0, 48.0));
    }

    #[test]
    fn test_from_json_rejects_bad_thresholds() {
        let json = r#"{"streams": [{"name": "s", "table": "t", "time_column": "time",
            "thresholds": {"very_fresh": 24, "fresh": 6, "moderate": 1}}]}"#;
        let err = StreamRegistry::from_json_str(json).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let err = StreamRegistry::from_path(Path::new("/nonexistent/registry.json")).unwrap_err();
        assert!(err.to_string().contains("reading stream registry"));
    }
}
