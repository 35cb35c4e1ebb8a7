//! SQLite backend.
//!
//! Monitoring sessions are opened read-only, one per evaluated stream.
//! The upsert writer borrows a caller-owned connection (usually a
//! transaction) and reports insert / update / no-op from `changes()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, InterruptHandle, OpenFlags, ToSql};

use crate::error::{StoreError, StoreResult, UpsertError};
use crate::registry::config::{is_column_identifier, is_table_identifier, StreamConfig};
use crate::storage::models::{checked_millis, FieldValue, StreamStats};
use crate::storage::queries::{
    build_exists_query, build_insert_if_absent, build_latest_query, build_range_count_query,
    build_stats_query, build_update_if_changed, UpsertTable,
};
use crate::storage::store::{QueryInterrupt, SessionFactory, StreamStore};
use crate::upsert::classifier::{classify_upsert_batch, UpsertOptions};
use crate::upsert::outcome::{BatchUpsertSummary, WriteOutcome};
use crate::upsert::row::SqlRow;
use crate::upsert::writer::UpsertWriter;

/// Default wait on a locked database before a query fails.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            FieldValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            FieldValue::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

fn query_err(err: rusqlite::Error, sql: &str) -> StoreError {
    match StoreError::from(err) {
        StoreError::QueryFailure { message, .. } => StoreError::query(message, sql),
        other => other,
    }
}

/// Decode a normalized timestamp column. Malformed values read as absent.
fn millis_from_value(value: Value, table: &str) -> Option<i64> {
    let parsed = match &value {
        Value::Null => return None,
        Value::Integer(i) => Some(*i),
        Value::Real(f) if f.is_finite() => Some(*f as i64),
        Value::Text(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let millis = parsed.and_then(checked_millis);
    if millis.is_none() {
        log::warn!("TIMESTAMP_MALFORMED table={} value={:?}", table, value);
    }
    millis
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// One SQLite session.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// In-memory database, mostly for tests and replays.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl StreamStore for SqliteStore {
    fn stream_stats(&self, config: &StreamConfig) -> StoreResult<StreamStats> {
        let sql = build_stats_query(config);
        let (total, latest, earliest): (i64, Value, Value) = self
            .conn
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(|e| query_err(e, &sql))?;

        Ok(StreamStats {
            total_records: count_to_u64(total),
            latest_millis: millis_from_value(latest, config.table()),
            earliest_millis: millis_from_value(earliest, config.table()),
        })
    }

    fn count_in_range(
        &self,
        config: &StreamConfig,
        start_ms: i64,
        end_ms: Option<i64>,
    ) -> StoreResult<u64> {
        let sql = build_range_count_query(config, end_ms.is_some());
        let mut stmt = self.conn.prepare_cached(&sql).map_err(|e| query_err(e, &sql))?;
        let count: i64 = match end_ms {
            Some(end) => stmt.query_row(params![start_ms, end], |row| row.get(0)),
            None => stmt.query_row(params![start_ms], |row| row.get(0)),
        }
        .map_err(|e| query_err(e, &sql))?;

        Ok(count_to_u64(count))
    }

    fn latest_timestamps(&self, config: &StreamConfig, limit: usize) -> StoreResult<Vec<i64>> {
        let sql = build_latest_query(config, limit);
        let mut stmt = self.conn.prepare_cached(&sql).map_err(|e| query_err(e, &sql))?;
        let values = stmt
            .query_map([], |row| row.get::<_, Value>(0))
            .map_err(|e| query_err(e, &sql))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| query_err(e, &sql))?;

        Ok(values
            .into_iter()
            .filter_map(|v| millis_from_value(v, config.table()))
            .collect())
    }

    fn interrupt_handle(&self) -> Option<Box<dyn QueryInterrupt>> {
        Some(Box::new(SqliteInterrupt(self.conn.get_interrupt_handle())))
    }
}

struct SqliteInterrupt(InterruptHandle);

impl QueryInterrupt for SqliteInterrupt {
    fn interrupt(&self) {
        self.0.interrupt();
    }
}

/// Opens read-only sessions on a database file.
#[derive(Debug, Clone)]
pub struct SqliteSessionFactory {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteSessionFactory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionFactory for SqliteSessionFactory {
    fn open_session(&self) -> StoreResult<Box<dyn StreamStore>> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            StoreError::Connection(format!("{}: {}", self.path.display(), e))
        })?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Box::new(SqliteStore::new(conn)))
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

/// Conditional writer for one `UpsertTable`.
pub struct SqliteUpsertWriter<'c> {
    conn: &'c Connection,
    table: UpsertTable,
    insert_sql: String,
    update_sql: Option<String>,
    exists_sql: String,
}

impl<'c> SqliteUpsertWriter<'c> {
    pub fn new(conn: &'c Connection, table: UpsertTable) -> StoreResult<Self> {
        if !is_table_identifier(&table.table) {
            return Err(StoreError::InvalidIdentifier(table.table));
        }
        if table.key_columns.is_empty() {
            return Err(StoreError::ShapeMismatch(format!(
                "{} has no natural-key columns",
                table.table
            )));
        }
        if let Some(bad) = table
            .key_columns
            .iter()
            .chain(table.value_columns.iter())
            .find(|c| !is_column_identifier(c))
        {
            return Err(StoreError::InvalidIdentifier(bad.clone()));
        }

        Ok(Self {
            conn,
            insert_sql: build_insert_if_absent(&table),
            update_sql: build_update_if_changed(&table),
            exists_sql: build_exists_query(&table),
            table,
        })
    }

    fn check_shape(&self, keys: &[FieldValue], values: &[FieldValue]) -> StoreResult<()> {
        if keys.len() != self.table.key_columns.len() || values.len() != self.table.value_columns.len() {
            return Err(StoreError::ShapeMismatch(format!(
                "{} expects {} key and {} value columns, row has {} and {}",
                self.table.table,
                self.table.key_columns.len(),
                self.table.value_columns.len(),
                keys.len(),
                values.len()
            )));
        }
        Ok(())
    }
}

impl<'c, R: SqlRow> UpsertWriter<R> for SqliteUpsertWriter<'c> {
    fn write(&mut self, row: &R) -> StoreResult<WriteOutcome> {
        let keys = row.key_values();
        let values = row.payload_values();
        self.check_shape(&keys, &values)?;
        let bound: Vec<&FieldValue> = keys.iter().chain(values.iter()).collect();

        let inserted = self
            .conn
            .prepare_cached(&self.insert_sql)
            .and_then(|mut stmt| stmt.execute(params_from_iter(bound.iter())))
            .map_err(|e| query_err(e, &self.insert_sql))?;
        if inserted == 1 {
            return Ok(WriteOutcome::Inserted);
        }

        let Some(update_sql) = &self.update_sql else {
            return Ok(WriteOutcome::Unchanged);
        };
        let updated = self
            .conn
            .prepare_cached(update_sql)
            .and_then(|mut stmt| stmt.execute(params_from_iter(bound.iter())))
            .map_err(|e| query_err(e, update_sql))?;

        Ok(if updated > 0 {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Unchanged
        })
    }

    fn exists(&mut self, row: &R) -> StoreResult<bool> {
        let keys = row.key_values();
        if keys.len() != self.table.key_columns.len() {
            return Err(StoreError::ShapeMismatch(format!(
                "{} expects {} key columns, row has {}",
                self.table.table,
                self.table.key_columns.len(),
                keys.len()
            )));
        }

        let mut stmt = self
            .conn
            .prepare_cached(&self.exists_sql)
            .map_err(|e| query_err(e, &self.exists_sql))?;
        stmt.exists(params_from_iter(keys.iter()))
            .map_err(|e| query_err(e, &self.exists_sql))
    }
}

/// Classify a batch inside one transaction: committed on success, rolled
/// back (on drop) when any row fails.
pub fn classify_in_transaction<R: SqlRow>(
    conn: &mut Connection,
    table: UpsertTable,
    rows: &[R],
    options: &UpsertOptions<R>,
) -> Result<BatchUpsertSummary, UpsertError> {
    let tx = conn
        .transaction()
        .map_err(|e| UpsertError::Transaction(StoreError::from(e)))?;

    let summary = {
        let mut writer = SqliteUpsertWriter::new(&tx, table).map_err(UpsertError::Transaction)?;
        classify_upsert_batch(rows, &mut writer, options)?
    };

    tx.commit()
        .map_err(|e| UpsertError::Transaction(StoreError::from(e)))?;
    Ok(summary)
}
