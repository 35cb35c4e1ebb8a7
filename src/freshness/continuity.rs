//! Hourly continuity scan over the trailing 24 hours.

use crate::clock::MILLIS_PER_HOUR;
use crate::error::StoreResult;
use crate::registry::config::StreamConfig;
use crate::storage::store::StreamStore;

/// Number of hourly buckets scanned.
pub const GAP_WINDOW_HOURS: u8 = 24;

/// Offsets `k` whose bucket `[now - (k+1)h, now - kh)` holds no rows,
/// most recent first.
pub fn find_gaps(config: &StreamConfig, store: &dyn StreamStore, now_ms: i64) -> StoreResult<Vec<u8>> {
    let mut gaps = Vec::new();

    for hours_ago in 0..GAP_WINDOW_HOURS {
        let end = now_ms - i64::from(hours_ago) * MILLIS_PER_HOUR;
        let start = end - MILLIS_PER_HOUR;
        if store.count_in_range(config, start, Some(end))? == 0 {
            gaps.push(hours_ago);
        }
    }

    Ok(gaps)
}
