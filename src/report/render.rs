//! Text report over one cycle's results.

use std::fmt::Write as _;

use serde::Serialize;

use crate::clock::millis_to_wib;
use crate::freshness::status::{FreshnessResult, FreshnessStatus};

const RULE_WIDTH: usize = 80;

/// Results of one status, stream order preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusGroup<'a> {
    pub status: FreshnessStatus,
    pub results: Vec<&'a FreshnessResult>,
}

/// Non-empty groups in status order.
pub fn group_by_status(results: &[FreshnessResult]) -> Vec<StatusGroup<'_>> {
    FreshnessStatus::ALL
        .iter()
        .map(|status| StatusGroup {
            status: *status,
            results: results.iter().filter(|r| r.status == *status).collect(),
        })
        .filter(|group| !group.results.is_empty())
        .collect()
}

/// Counts for callers that want numbers instead of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub healthy: usize,
    pub problematic: usize,
    /// Streams that are `STALE`, `NO_DATA` or `ERROR`.
    pub attention: Vec<String>,
}

impl ReportSummary {
    pub fn from_results(results: &[FreshnessResult]) -> Self {
        let healthy = results.iter().filter(|r| r.status.is_healthy()).count();
        Self {
            total: results.len(),
            healthy,
            problematic: results.len() - healthy,
            attention: results
                .iter()
                .filter(|r| r.status.requires_attention())
                .map(|r| r.stream_name.clone())
                .collect(),
        }
    }
}

fn marker(status: FreshnessStatus) -> &'static str {
    if status.is_healthy() {
        "[ok]"
    } else if status == FreshnessStatus::Moderate {
        "[warn]"
    } else {
        "[fail]"
    }
}

fn status_description(result: &FreshnessResult) -> String {
    if let Some(message) = &result.error_message {
        return message.clone();
    }
    match result.status {
        FreshnessStatus::Stale => format!(
            "Data is {:.1} hours old",
            result.hours_since_latest.unwrap_or_default()
        ),
        FreshnessStatus::NoData => "No records found".to_string(),
        FreshnessStatus::Error => "Error checking freshness".to_string(),
        other => format!("Data is {}", other.label().to_lowercase()),
    }
}

fn stream_line(result: &FreshnessResult) -> String {
    let time_info = match &result.latest_datetime {
        Some(latest) => match result.hours_since_latest {
            Some(hours) => format!("latest: {} WIB ({:.1}h ago)", latest, hours),
            None => format!("latest: {} WIB", latest),
        },
        None => "no timestamp".to_string(),
    };

    let mut record_info = format!("records: {}", result.total_records);
    if result.records_this_cycle > 0 {
        let _ = write!(record_info, " (+{} this cycle", result.records_this_cycle);
        if let Some(minutes) = result.cycle_duration_minutes {
            let _ = write!(record_info, " | {:.1}min/cycle", minutes);
        }
        record_info.push(')');
    }

    format!("   - {:<30} {:<40} | {}", result.stream_name, time_info, record_info)
}

/// Render the cycle report. `now_ms` is the analysis time shown in the banner.
pub fn render_report(results: &[FreshnessResult], now_ms: i64) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![rule.clone(), "DATA FRESHNESS MONITORING REPORT".to_string(), rule.clone()];

    let analysis_time = millis_to_wib(now_ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| now_ms.to_string());
    lines.push(format!("Analysis Time: {} WIB", analysis_time));
    lines.push(String::new());

    for group in group_by_status(results) {
        lines.push(format!(
            "{} {} ({} streams):",
            marker(group.status),
            group.status.label(),
            group.results.len()
        ));
        lines.extend(group.results.iter().map(|r| stream_line(r)));
        lines.push(String::new());
    }

    let summary = ReportSummary::from_results(results);
    lines.push(rule.clone());
    lines.push("SUMMARY".to_string());
    lines.push(rule.clone());
    lines.push(format!("Total Streams: {}", summary.total));
    lines.push(format!("Healthy Streams: {}", summary.healthy));
    lines.push(format!("Problematic Streams: {}", summary.problematic));

    if !summary.attention.is_empty() {
        lines.push(String::new());
        lines.push("REQUIRES ATTENTION:".to_string());
        for result in results.iter().filter(|r| r.status.requires_attention()) {
            lines.push(format!(
                "   {} {}: {}",
                marker(result.status),
                result.stream_name,
                status_description(result)
            ));
        }
    }
    lines.push(rule);

    lines.join("\n")
}

/// Emit the report through `log::info!`, one line per record.
pub fn log_report(results: &[FreshnessResult], now_ms: i64) {
    for line in render_report(results, now_ms).lines() {
        log::info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_769_644_800_000;

    fn result(name: &str, status: FreshnessStatus) -> FreshnessResult {
        let mut r = FreshnessResult::no_data(name);
        r.status = status;
        r.recommendations.clear();
        r
    }

    fn sample() -> Vec<FreshnessResult> {
        let mut fresh = result("funding_rate", FreshnessStatus::Fresh);
        fresh.total_records = 1200;
        fresh.latest_datetime = Some("29-01-2026 05:00".to_string());
        fresh.hours_since_latest = Some(2.0);
        fresh.records_this_cycle = 6;
        fresh.cycle_duration_minutes = Some(10.0);

        let mut stale = result("spot_orderbook", FreshnessStatus::Stale);
        stale.hours_since_latest = Some(30.0);

        vec![
            stale,
            fresh,
            FreshnessResult::error("open_interest", "[S002] Query failed: no such table"),
            result("volume_spot", FreshnessStatus::VeryFresh),
        ]
    }

    #[test]
    fn test_groups_in_status_order() {
        let results = sample();
        let groups = group_by_status(&results);
        let order: Vec<FreshnessStatus> = groups.iter().map(|g| g.status).collect();
        assert_eq!(
            order,
            vec![
                FreshnessStatus::VeryFresh,
                FreshnessStatus::Fresh,
                FreshnessStatus::Stale,
                FreshnessStatus::Error
            ]
        );
    }

    #[test]
    fn test_summary_counts() {
        let summary = ReportSummary::from_results(&sample());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.healthy, 2);
        assert_eq!(summary.problematic, 2);
        assert_eq!(summary.attention, vec!["spot_orderbook", "open_interest"]);
    }

    #[test]
    fn test_report_lists_every_stream() {
        let report = render_report(&sample(), NOW);

        assert!(report.contains("DATA FRESHNESS MONITORING REPORT"));
        assert!(report.contains("Analysis Time: 2026-01-29 07:00:00 WIB"));
        assert!(report.contains("latest: 29-01-2026 05:00 WIB (2.0h ago)"));
        assert!(report.contains("records: 1200 (+6 this cycle | 10.0min/cycle)"));
        assert!(report.contains("[fail] ERROR (1 streams):"));
        assert!(report.contains("Healthy Streams: 2"));
        assert!(report.contains("REQUIRES ATTENTION:"));
        assert!(report.contains("spot_orderbook: Data is 30.0 hours old"));
        assert!(report.contains("open_interest: [S002] Query failed: no such table"));
        for name in ["funding_rate", "spot_orderbook", "open_interest", "volume_spot"] {
            assert!(report.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_all_healthy_has_no_attention_section() {
        let results = vec![result("volume_spot", FreshnessStatus::VeryFresh)];
        let report = render_report(&results, NOW);
        assert!(!report.contains("REQUIRES ATTENTION"));
    }
}
