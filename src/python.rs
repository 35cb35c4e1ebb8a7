//! Python bindings for the ingestion driver.

use std::path::Path;
use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::freshness::status::FreshnessResult;
use crate::pipeline::monitor::{Monitor, MonitorConfig};
use crate::registry::streams::StreamRegistry;
use crate::report::{generate_alerts, log_report, render_report, ReportSummary};
use crate::storage::queries::UpsertTable;
use crate::storage::sqlite::{classify_in_transaction, SqliteSessionFactory};
use crate::upsert::classifier::UpsertOptions;
use crate::upsert::filter::PreFilter;
use crate::upsert::outcome::UpsertStrategy;
use crate::upsert::row::Record;

fn result_to_dict<'py>(py: Python<'py>, result: &FreshnessResult) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("stream_name", &result.stream_name)?;
    dict.set_item("status", result.status.as_str())?;
    dict.set_item("total_records", result.total_records)?;
    dict.set_item("latest_timestamp", result.latest_timestamp)?;
    dict.set_item("earliest_timestamp", result.earliest_timestamp)?;
    dict.set_item("latest_datetime", &result.latest_datetime)?;
    dict.set_item("hours_since_latest", result.hours_since_latest)?;
    dict.set_item("records_this_cycle", result.records_this_cycle)?;
    dict.set_item("avg_records_per_hour", result.avg_records_per_hour)?;
    dict.set_item("gap_hours", result.gap_hours.clone())?;
    dict.set_item("cycle_duration_minutes", result.cycle_duration_minutes)?;
    dict.set_item("error_message", &result.error_message)?;
    dict.set_item("recommendations", result.recommendations.clone())?;
    Ok(dict)
}

/// Evaluate every stream in the database and render the cycle report.
///
/// # Arguments
/// * `db_path` - SQLite database file, opened read-only
/// * `registry_json` - Stream registry JSON; the built-in registry when omitted
/// * `stream_timeout_secs` - Seconds allowed per stream
/// * `max_parallel` - Concurrent store sessions
///
/// # Returns
/// Dict with `report`, `alerts`, `summary` and `results`
#[pyfunction]
#[pyo3(signature = (db_path, registry_json=None, stream_timeout_secs=30, max_parallel=4))]
fn check_freshness(
    py: Python<'_>,
    db_path: String,
    registry_json: Option<String>,
    stream_timeout_secs: u64,
    max_parallel: usize,
) -> PyResult<PyObject> {
    crate::init_logger();

    let registry = match registry_json {
        Some(json) => StreamRegistry::from_json_str(&json)
            .map_err(|e| PyValueError::new_err(e.to_string()))?,
        None => StreamRegistry::builtin(),
    };

    let monitor = Monitor::new(
        Arc::new(registry),
        Arc::new(SqliteSessionFactory::new(Path::new(&db_path))),
    )
    .with_config(MonitorConfig {
        stream_timeout_secs,
        max_parallel,
    })
    .frozen();

    // Same instant as the evaluation
    let now_ms = monitor.clock().now_millis();
    let results = py.allow_threads(|| monitor.evaluate_all());
    log_report(&results, now_ms);

    let summary = ReportSummary::from_results(&results);
    let py_result = PyDict::new(py);
    py_result.set_item("report", render_report(&results, now_ms))?;
    py_result.set_item("alerts", generate_alerts(&results))?;

    let summary_dict = PyDict::new(py);
    summary_dict.set_item("total", summary.total)?;
    summary_dict.set_item("healthy", summary.healthy)?;
    summary_dict.set_item("problematic", summary.problematic)?;
    summary_dict.set_item("attention", summary.attention)?;
    py_result.set_item("summary", summary_dict)?;

    let results_list = PyList::empty(py);
    for result in results.iter() {
        results_list.append(result_to_dict(py, result)?)?;
    }
    py_result.set_item("results", results_list)?;

    Ok(py_result.into())
}

/// Upsert a batch of rows in one transaction and return its summary.
///
/// # Arguments
/// * `rows_json` - JSON list of `{"key": [...], "values": [...]}` in table column order
/// * `strategy` - "affected_rows" or "pre_read_compare"
/// * `drop_all_zero` - Filter rows whose values are all zero or null
#[pyfunction]
#[pyo3(signature = (db_path, pipeline, table, key_columns, value_columns, rows_json, strategy="affected_rows".to_string(), drop_all_zero=false))]
#[allow(clippy::too_many_arguments)]
fn upsert_batch(
    py: Python<'_>,
    db_path: String,
    pipeline: String,
    table: String,
    key_columns: Vec<String>,
    value_columns: Vec<String>,
    rows_json: String,
    strategy: String,
    drop_all_zero: bool,
) -> PyResult<PyObject> {
    crate::init_logger();

    let rows: Vec<Record> =
        serde_json::from_str(&rows_json).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let strategy = match strategy.as_str() {
        "affected_rows" => UpsertStrategy::AffectedRows,
        "pre_read_compare" => UpsertStrategy::PreReadCompare,
        other => {
            return Err(PyValueError::new_err(format!(
                "unknown upsert strategy: {}",
                other
            )))
        }
    };
    let pre_filter = if drop_all_zero {
        PreFilter::DropAllZero
    } else {
        PreFilter::KeepAll
    };
    let options = UpsertOptions::new(&pipeline)
        .strategy(strategy)
        .pre_filter(pre_filter);
    let table = UpsertTable {
        table,
        key_columns,
        value_columns,
    };

    let summary = py
        .allow_threads(|| {
            let mut conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| crate::error::UpsertError::Transaction(e.into()))?;
            classify_in_transaction(&mut conn, table, &rows, &options)
        })
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

    let py_result = PyDict::new(py);
    py_result.set_item("strategy", summary.strategy.to_string())?;
    py_result.set_item("received", summary.received)?;
    py_result.set_item("inserted", summary.inserted)?;
    py_result.set_item("duplicates", summary.duplicates)?;
    py_result.set_item("updated", summary.updated)?;
    py_result.set_item("unchanged", summary.unchanged)?;
    py_result.set_item("filtered", summary.filtered)?;

    Ok(py_result.into())
}

/// Names of the built-in streams, in report order.
#[pyfunction]
fn builtin_streams() -> PyResult<Vec<String>> {
    Ok(StreamRegistry::builtin().names())
}

/// Python module definition
#[pymodule]
fn ingestwatch_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(check_freshness, m)?)?;
    m.add_function(wrap_pyfunction!(upsert_batch, m)?)?;
    m.add_function(wrap_pyfunction!(builtin_streams, m)?)?;
    Ok(())
}
