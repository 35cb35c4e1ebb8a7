//! Operator recommendations derived from a `FreshnessResult`.

use crate::freshness::status::{FreshnessResult, FreshnessStatus};

/// More empty buckets than this in the trailing 24h is worth a recommendation.
pub const GAP_ALERT_THRESHOLD: usize = 2;

/// Recommendations for one result, in fixed order:
/// status advice, then gaps, then the current-cycle pulse.
pub fn generate_recommendations(result: &FreshnessResult) -> Vec<String> {
    let mut recommendations = Vec::new();

    match result.status {
        FreshnessStatus::Stale => {
            let hours = result.hours_since_latest.unwrap_or_default();
            recommendations.push(format!("Data is {:.1}h old - check pipeline", hours));
        }
        FreshnessStatus::NoData => recommendations
            .push("No data found - check table creation and pipeline execution".to_string()),
        FreshnessStatus::Error => recommendations
            .push("Error checking freshness - check database connection".to_string()),
        _ => {}
    }

    if result.gap_count() > GAP_ALERT_THRESHOLD {
        recommendations.push(format!(
            "Found {} hourly gaps - check automation schedule",
            result.gap_count()
        ));
    }

    if result.records_this_cycle == 0 && !is_diagnostic(result.status) {
        recommendations.push("No data in current cycle - check API connectivity".to_string());
    }

    recommendations
}

/// `NO_DATA` and `ERROR` already explain a missing pulse.
pub(crate) fn is_diagnostic(status: FreshnessStatus) -> bool {
    matches!(status, FreshnessStatus::NoData | FreshnessStatus::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: FreshnessStatus) -> FreshnessResult {
        let mut result = FreshnessResult::error("s", "boom");
        result.status = status;
        result.error_message = None;
        result.records_this_cycle = 5;
        result.recommendations.clear();
        result
    }

    #[test]
    fn test_healthy_stream_has_none() {
        assert!(generate_recommendations(&result(FreshnessStatus::VeryFresh)).is_empty());
    }

    #[test]
    fn test_stale_with_gaps_and_no_pulse_in_order() {
        let mut r = result(FreshnessStatus::Stale);
        r.hours_since_latest = Some(30.04);
        r.gap_hours = vec![0, 1, 2, 3];
        r.records_this_cycle = 0;

        assert_eq!(
            generate_recommendations(&r),
            vec![
                "Data is 30.0h old - check pipeline".to_string(),
                "Found 4 hourly gaps - check automation schedule".to_string(),
                "No data in current cycle - check API connectivity".to_string(),
            ]
        );
    }

    #[test]
    fn test_two_gaps_not_reported() {
        let mut r = result(FreshnessStatus::Fresh);
        r.gap_hours = vec![3, 7];
        assert!(generate_recommendations(&r).is_empty());
    }

    #[test]
    fn test_error_suppresses_cycle_advice() {
        let mut r = result(FreshnessStatus::Error);
        r.records_this_cycle = 0;
        assert_eq!(
            generate_recommendations(&r),
            vec!["Error checking freshness - check database connection".to_string()]
        );
    }
}
