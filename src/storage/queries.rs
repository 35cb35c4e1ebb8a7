//! SQL query builders.
//!
//! Generates the monitoring and upsert statements. Table and column names
//! are interpolated, so they are validated as plain identifiers when the
//! stream or upsert table is configured.

use crate::clock::WIB_OFFSET_SECS;
use crate::registry::config::{StreamConfig, TimeEncoding};
use crate::storage::models::MAX_TIMESTAMP_MILLIS;

/// Expression normalizing the stream's time column to epoch milliseconds.
///
/// Non-numeric epoch values, unparseable datetimes and instants outside
/// `0..=MAX_TIMESTAMP_MILLIS` evaluate to NULL, so malformed timestamps are
/// excluded from MAX/MIN, ordering and range filters.
pub fn time_millis_expr(config: &StreamConfig) -> String {
    let col = config.time_column();
    let raw = match config.time_encoding() {
        TimeEncoding::EpochMillis => format!(
            "(CASE WHEN typeof({col}) IN ('integer', 'real') THEN CAST({col} AS INTEGER) END)"
        ),
        TimeEncoding::EpochSeconds => format!(
            "(CASE WHEN typeof({col}) IN ('integer', 'real') THEN CAST({col} AS INTEGER) * 1000 END)"
        ),
        // Stored as UTC+7 wall-clock text; strftime('%s') reads it as UTC
        TimeEncoding::Datetime => format!(
            "((CAST(strftime('%s', {col}) AS INTEGER) - {WIB_OFFSET_SECS}) * 1000)"
        ),
    };
    format!("(CASE WHEN {raw} BETWEEN 0 AND {MAX_TIMESTAMP_MILLIS} THEN {raw} END)")
}

/// Build the aggregate statistics query: `(total_records, latest, earliest)`.
pub fn build_stats_query(config: &StreamConfig) -> String {
    let expr = time_millis_expr(config);
    format!(
        "SELECT COUNT(*) AS total_records, MAX({expr}) AS latest_timestamp, \
         MIN({expr}) AS earliest_timestamp FROM {}",
        config.table()
    )
}

/// Build a `COUNT(*)` over `[?1, ?2)`, or `[?1, ∞)` when `bounded` is false.
pub fn build_range_count_query(config: &StreamConfig, bounded: bool) -> String {
    let expr = time_millis_expr(config);
    if bounded {
        format!(
            "SELECT COUNT(*) AS count FROM {} WHERE {expr} >= ?1 AND {expr} < ?2",
            config.table()
        )
    } else {
        format!("SELECT COUNT(*) AS count FROM {} WHERE {expr} >= ?1", config.table())
    }
}

/// Build the most-recent-timestamps query.
pub fn build_latest_query(config: &StreamConfig, limit: usize) -> String {
    let expr = time_millis_expr(config);
    format!(
        "SELECT {expr} AS timestamp_ms FROM {} WHERE {expr} IS NOT NULL \
         ORDER BY timestamp_ms DESC LIMIT {limit}",
        config.table()
    )
}

/// Target of a conditional upsert: natural-key columns plus payload columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertTable {
    pub table: String,
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
}

impl UpsertTable {
    pub fn new(table: &str, key_columns: &[&str], value_columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            value_columns: value_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Placeholder for key column `i` (keys come first).
    fn key_param(&self, i: usize) -> String {
        format!("?{}", i + 1)
    }

    /// Placeholder for value column `i` (after the keys).
    fn value_param(&self, i: usize) -> String {
        format!("?{}", self.key_columns.len() + i + 1)
    }

    fn key_predicate(&self) -> String {
        self.key_columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", c, self.key_param(i)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// Build `INSERT .. ON CONFLICT DO NOTHING`; one changed row means inserted.
pub fn build_insert_if_absent(table: &UpsertTable) -> String {
    let columns: Vec<&str> = table
        .key_columns
        .iter()
        .chain(table.value_columns.iter())
        .map(|c| c.as_str())
        .collect();
    let placeholders: Vec<String> = (0..columns.len()).map(|i| format!("?{}", i + 1)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO NOTHING",
        table.table,
        columns.join(", "),
        placeholders.join(", "),
        table.key_columns.join(", ")
    )
}

/// Build the payload update; it only touches the row when a value differs,
/// so one changed row means updated and zero means unchanged.
pub fn build_update_if_changed(table: &UpsertTable) -> Option<String> {
    if table.value_columns.is_empty() {
        return None;
    }

    let assignments: Vec<String> = table
        .value_columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = {}", c, table.value_param(i)))
        .collect();
    let changed: Vec<String> = table
        .value_columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} IS NOT {}", c, table.value_param(i)))
        .collect();

    Some(format!(
        "UPDATE {} SET {} WHERE {} AND ({})",
        table.table,
        assignments.join(", "),
        table.key_predicate(),
        changed.join(" OR ")
    ))
}

/// Build the pre-read existence check.
pub fn build_exists_query(table: &UpsertTable) -> String {
    format!(
        "SELECT 1 FROM {} WHERE {} LIMIT 1",
        table.table,
        table.key_predicate()
    )
}
