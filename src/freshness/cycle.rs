//! Current-cycle pulse and cycle duration estimate.

use crate::clock::{MILLIS_PER_HOUR, MILLIS_PER_MINUTE};
use crate::error::StoreResult;
use crate::registry::config::StreamConfig;
use crate::storage::store::StreamStore;

pub const MIN_CYCLE_MINUTES: f64 = 0.1;
pub const MAX_CYCLE_MINUTES: f64 = 60.0;

/// Rows with a timestamp in the trailing hour.
pub fn records_this_cycle(config: &StreamConfig, store: &dyn StreamStore, now_ms: i64) -> StoreResult<u64> {
    store.count_in_range(config, now_ms - MILLIS_PER_HOUR, None)
}

/// Minutes between the two most recent rows, clamped to
/// `[MIN_CYCLE_MINUTES, MAX_CYCLE_MINUTES]`. `None` with fewer than two rows.
pub fn cycle_duration_minutes(config: &StreamConfig, store: &dyn StreamStore) -> StoreResult<Option<f64>> {
    let latest = store.latest_timestamps(config, 2)?;
    let duration = match latest.as_slice() {
        [newest, previous, ..] => {
            let minutes = (newest - previous) as f64 / MILLIS_PER_MINUTE as f64;
            Some(minutes.clamp(MIN_CYCLE_MINUTES, MAX_CYCLE_MINUTES))
        }
        _ => None,
    };
    Ok(duration)
}
