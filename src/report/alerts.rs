//! Alert strings for streams that need attention.

use crate::freshness::recommendations::{is_diagnostic, GAP_ALERT_THRESHOLD};
use crate::freshness::status::{FreshnessResult, FreshnessStatus};

/// Alerts in input order. A stream may raise more than one: its status
/// alert, a gap alert and a missing-pulse alert are independent.
pub fn generate_alerts(results: &[FreshnessResult]) -> Vec<String> {
    let mut alerts = Vec::new();

    for result in results {
        let name = &result.stream_name;

        match result.status {
            FreshnessStatus::Stale => alerts.push(format!(
                "STALE DATA: {} - {:.1} hours old",
                name,
                result.hours_since_latest.unwrap_or_default()
            )),
            FreshnessStatus::NoData => alerts.push(format!("NO DATA: {} - No records found", name)),
            FreshnessStatus::Error => alerts.push(format!(
                "ERROR: {} - {}",
                name,
                result.error_message.as_deref().unwrap_or("unknown error")
            )),
            _ => {}
        }

        if result.gap_count() > GAP_ALERT_THRESHOLD {
            alerts.push(format!(
                "DATA GAPS: {} - {} hours with missing data",
                name,
                result.gap_count()
            ));
        }

        if result.records_this_cycle == 0 && !is_diagnostic(result.status) {
            alerts.push(format!("NO CYCLE DATA: {} - No data in current cycle", name));
        }
    }

    alerts
}
