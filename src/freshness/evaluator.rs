//! Single-stream freshness evaluation.
//!
//! Evaluation never fails: query errors become an `ERROR` result for the
//! stream being evaluated and nothing else.

use crate::clock::{format_wib, MILLIS_PER_HOUR};
use crate::error::StoreResult;
use crate::freshness::continuity::find_gaps;
use crate::freshness::cycle::{cycle_duration_minutes, records_this_cycle};
use crate::freshness::recommendations::generate_recommendations;
use crate::freshness::status::{FreshnessResult, FreshnessStatus};
use crate::logging::structured::LogContext;
use crate::registry::config::{StreamConfig, Thresholds};
use crate::storage::store::StreamStore;

/// Bucket `hours` by ascending thresholds; each bucket includes its upper
/// bound. `None` (no usable latest timestamp) is `ERROR`.
pub fn classify_status(hours: Option<f64>, thresholds: &Thresholds) -> FreshnessStatus {
    let Some(hours) = hours else {
        return FreshnessStatus::Error;
    };

    if hours <= thresholds.very_fresh {
        FreshnessStatus::VeryFresh
    } else if hours <= thresholds.fresh {
        FreshnessStatus::Fresh
    } else if hours <= thresholds.moderate {
        FreshnessStatus::Moderate
    } else {
        FreshnessStatus::Stale
    }
}

/// Records per hour over the observed span, with a one-hour floor.
pub fn average_records_per_hour(total: u64, latest: Option<i64>, earliest: Option<i64>) -> Option<f64> {
    let (latest, earliest) = (latest?, earliest?);
    let span_hours = (latest - earliest) as f64 / MILLIS_PER_HOUR as f64;
    Some(total as f64 / span_hours.max(1.0))
}

/// Evaluate one stream against `store` at `now_ms`.
pub fn evaluate(
    config: &StreamConfig,
    store: &dyn StreamStore,
    now_ms: i64,
    log_ctx: &LogContext,
) -> FreshnessResult {
    match try_evaluate(config, store, now_ms) {
        Ok(result) => {
            crate::log_debug!(
                log_ctx,
                "STREAM_EVALUATED",
                status = result.status.as_str(),
                total_records = result.total_records,
                hours_since_latest = result.hours_since_latest,
                gaps = result.gap_count()
            );
            result
        }
        Err(e) => {
            crate::log_warn!(
                log_ctx,
                "STREAM_QUERY_FAILED",
                table = config.table(),
                error = e.to_string()
            );
            FreshnessResult::error(config.name(), e.to_string())
        }
    }
}

fn try_evaluate(config: &StreamConfig, store: &dyn StreamStore, now_ms: i64) -> StoreResult<FreshnessResult> {
    let stats = store.stream_stats(config)?;

    if stats.total_records == 0 {
        return Ok(FreshnessResult::no_data(config.name()));
    }

    let hours_since_latest = stats
        .latest_millis
        .map(|latest| (now_ms - latest) as f64 / MILLIS_PER_HOUR as f64);
    let status = classify_status(hours_since_latest, config.thresholds());

    if status == FreshnessStatus::Error {
        let mut result = FreshnessResult::error(
            config.name(),
            format!(
                "{} rows but no readable timestamp in {}.{}",
                stats.total_records,
                config.table(),
                config.time_column()
            ),
        );
        result.total_records = stats.total_records;
        result.earliest_timestamp = stats.earliest_millis;
        return Ok(result);
    }

    let gap_hours = find_gaps(config, store, now_ms)?;
    let records_this_cycle = records_this_cycle(config, store, now_ms)?;
    let cycle_duration_minutes = cycle_duration_minutes(config, store)?;

    let mut result = FreshnessResult {
        stream_name: config.name().to_string(),
        status,
        total_records: stats.total_records,
        latest_timestamp: stats.latest_millis,
        earliest_timestamp: stats.earliest_millis,
        latest_datetime: stats.latest_millis.and_then(format_wib),
        hours_since_latest,
        records_this_cycle,
        avg_records_per_hour: average_records_per_hour(
            stats.total_records,
            stats.latest_millis,
            stats.earliest_millis,
        ),
        gap_hours,
        cycle_duration_minutes,
        error_message: None,
        recommendations: Vec::new(),
    };
    result.recommendations = generate_recommendations(&result);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::testing::{FailingStore, VecStore};
    use crate::storage::models::StreamStats;
    use crate::error::StoreError;
    use proptest::prelude::*;

    const NOW: i64 = 1_769_644_800_000;

    fn config() -> StreamConfig {
        StreamConfig::builder("funding_rate", "cg_funding_rate_history", "time")
            .build()
            .unwrap()
    }

    fn ctx() -> LogContext {
        LogContext::new("cycle-test").with_stream("funding_rate")
    }

    /// One row every 10 minutes for `hours` hours, newest `age_hours` old.
    fn steady_rows(age_hours: i64, hours: i64) -> Vec<i64> {
        let newest = NOW - age_hours * MILLIS_PER_HOUR;
        (0..hours * 6).map(|i| newest - i * 10 * 60_000).collect()
    }

    #[test]
    fn test_classify_inclusive_bounds() {
        let t = Thresholds::default();
        assert_eq!(classify_status(Some(0.0), &t), FreshnessStatus::VeryFresh);
        assert_eq!(classify_status(Some(1.0), &t), FreshnessStatus::VeryFresh);
        assert_eq!(classify_status(Some(1.01), &t), FreshnessStatus::Fresh);
        assert_eq!(classify_status(Some(6.0), &t), FreshnessStatus::Fresh);
        assert_eq!(classify_status(Some(24.0), &t), FreshnessStatus::Moderate);
        assert_eq!(classify_status(Some(24.5), &t), FreshnessStatus::Stale);
        assert_eq!(classify_status(None, &t), FreshnessStatus::Error);
    }

    #[test]
    fn test_two_hours_old_is_fresh() {
        let result = evaluate(&config(), &VecStore::new(steady_rows(2, 30)), NOW, &ctx());
        assert_eq!(result.status, FreshnessStatus::Fresh);
        assert_eq!(result.hours_since_latest, Some(2.0));
        assert_eq!(result.total_records, 180);
        assert!(result.latest_datetime.is_some());
    }

    #[test]
    fn test_thirty_hours_old_is_stale() {
        let result = evaluate(&config(), &VecStore::new(steady_rows(30, 3)), NOW, &ctx());
        assert_eq!(result.status, FreshnessStatus::Stale);
        assert_eq!(result.gap_hours.len(), 24);
        assert_eq!(result.records_this_cycle, 0);
        assert_eq!(result.recommendations[0], "Data is 30.0h old - check pipeline");
    }

    #[test]
    fn test_zero_rows_is_no_data() {
        let result = evaluate(&config(), &VecStore::new(vec![]), NOW, &ctx());
        assert_eq!(result.status, FreshnessStatus::NoData);
        assert_eq!(result.total_records, 0);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_query_failure_is_error() {
        let result = evaluate(&config(), &FailingStore, NOW, &ctx());
        assert_eq!(result.status, FreshnessStatus::Error);
        assert!(result
            .error_message
            .as_deref()
            .unwrap_or_default()
            .contains("no such table: cg_funding_rate_history"));
        assert_eq!(
            result.recommendations,
            vec!["Error checking freshness - check database connection".to_string()]
        );
    }

    struct UnreadableLatest;

    impl StreamStore for UnreadableLatest {
        fn stream_stats(&self, _: &StreamConfig) -> StoreResult<StreamStats> {
            Ok(StreamStats {
                total_records: 4,
                latest_millis: None,
                earliest_millis: None,
            })
        }

        fn count_in_range(&self, _: &StreamConfig, _: i64, _: Option<i64>) -> StoreResult<u64> {
            Err(StoreError::Interrupted)
        }

        fn latest_timestamps(&self, _: &StreamConfig, _: usize) -> StoreResult<Vec<i64>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_rows_without_timestamp_is_error() {
        let result = evaluate(&config(), &UnreadableLatest, NOW, &ctx());
        assert_eq!(result.status, FreshnessStatus::Error);
        assert_eq!(result.total_records, 4);
        assert!(result.hours_since_latest.is_none());
    }

    #[test]
    fn test_average_rate_floor() {
        assert_eq!(average_records_per_hour(10, Some(NOW), Some(NOW)), Some(10.0));
        assert_eq!(
            average_records_per_hour(48, Some(NOW), Some(NOW - 4 * MILLIS_PER_HOUR)),
            Some(12.0)
        );
        assert_eq!(average_records_per_hour(48, Some(NOW), None), None);
    }

    #[test]
    fn test_frozen_clock_is_idempotent() {
        let store = VecStore::new(steady_rows(0, 5));
        let first = evaluate(&config(), &store, NOW, &ctx());
        let second = evaluate(&config(), &store, NOW, &ctx());
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_classification_monotonic(a in 0.0f64..200.0, b in 0.0f64..200.0) {
            let t = Thresholds::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo_status = classify_status(Some(lo), &t);
            let hi_status = classify_status(Some(hi), &t);
            prop_assert!(lo_status <= hi_status);
        }
    }
}
