//! Monitoring cycle orchestration.
//!
//! Evaluates every registered stream once per call:
//! 1. Cycle context and a single frozen "now"
//! 2. Waves of at most `max_parallel` workers, one store session each
//! 3. Per-wave deadline; late streams become `ERROR` and are interrupted
//! 4. Results in registry-declaration order

use std::ops::Deref;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::freshness::evaluator::evaluate;
use crate::freshness::status::FreshnessResult;
use crate::registry::config::StreamConfig;
use crate::registry::streams::StreamRegistry;
use crate::storage::store::{QueryInterrupt, SessionFactory};

use super::context::CycleContext;

/// Monitor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time allowed for one stream's evaluation.
    pub stream_timeout_secs: u64,
    /// Concurrent store sessions.
    pub max_parallel: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            stream_timeout_secs: 30,
            max_parallel: 4,
        }
    }
}

impl MonitorConfig {
    /// Timeout, at least one second.
    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs.max(1))
    }

    /// Worker count, at least one.
    pub fn parallelism(&self) -> usize {
        self.max_parallel.max(1)
    }
}

/// One cycle's results in registry-declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct StreamResults {
    results: Vec<FreshnessResult>,
}

impl StreamResults {
    pub fn get(&self, stream: &str) -> Option<&FreshnessResult> {
        self.results.iter().find(|r| r.stream_name == stream)
    }

    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.stream_name.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<FreshnessResult> {
        self.results
    }
}

impl Deref for StreamResults {
    type Target = [FreshnessResult];

    fn deref(&self) -> &Self::Target {
        &self.results
    }
}

impl From<Vec<FreshnessResult>> for StreamResults {
    fn from(results: Vec<FreshnessResult>) -> Self {
        Self { results }
    }
}

impl IntoIterator for StreamResults {
    type Item = FreshnessResult;
    type IntoIter = std::vec::IntoIter<FreshnessResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

type InterruptSlot = Arc<Mutex<Option<Box<dyn QueryInterrupt>>>>;

/// Freshness monitor over a registry and a session factory.
pub struct Monitor {
    registry: Arc<StreamRegistry>,
    factory: Arc<dyn SessionFactory>,
    clock: Arc<dyn Clock>,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(registry: Arc<StreamRegistry>, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            registry,
            factory,
            clock: Arc::new(SystemClock),
            config: MonitorConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin the clock to its current instant, so a report rendered after
    /// `evaluate_all` shares the cycle's "now".
    pub fn frozen(mut self) -> Self {
        let now_ms = self.clock.now_millis();
        self.clock = Arc::new(FixedClock::at_millis(now_ms));
        self
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Evaluate one stream by name. Unknown names yield `ERROR`.
    pub fn evaluate_stream(&self, name: &str) -> FreshnessResult {
        let cycle = CycleContext::new();
        let now_ms = self.clock.now_millis();

        let config = match self.registry.get(name) {
            Ok(config) => config.clone(),
            Err(e) => {
                crate::log_warn!(
                    cycle.stream_context(name),
                    "STREAM_UNKNOWN",
                    error = e.to_string()
                );
                return FreshnessResult::error(name, format!("Unknown stream: {}", name));
            }
        };

        self.evaluate_wave(&cycle, &[config], now_ms)
            .pop()
            .unwrap_or_else(|| FreshnessResult::error(name, "evaluation produced no result"))
    }

    /// Evaluate every registered stream.
    pub fn evaluate_all(&self) -> StreamResults {
        let cycle = CycleContext::new();
        let log_ctx = cycle.log_context();
        let now_ms = self.clock.now_millis();
        let started = Instant::now();

        crate::log_info!(
            log_ctx,
            "CYCLE_START",
            streams = self.registry.len(),
            backend = self.factory.backend(),
            max_parallel = self.config.parallelism()
        );

        let configs: Vec<StreamConfig> = self.registry.iter().cloned().collect();
        let mut results = Vec::with_capacity(configs.len());
        for wave in configs.chunks(self.config.parallelism()) {
            results.extend(self.evaluate_wave(&cycle, wave, now_ms));
        }

        let healthy = results.iter().filter(|r| r.status.is_healthy()).count();
        crate::log_info!(
            log_ctx,
            "CYCLE_COMPLETE",
            streams = results.len(),
            healthy = healthy,
            problematic = results.len() - healthy,
            elapsed_ms = started.elapsed().as_millis()
        );

        StreamResults::from(results)
    }

    /// Run one wave of workers and collect results by index.
    fn evaluate_wave(&self, cycle: &CycleContext, configs: &[StreamConfig], now_ms: i64) -> Vec<FreshnessResult> {
        let (tx, rx) = unbounded::<(usize, FreshnessResult)>();
        let mut slots: Vec<Option<FreshnessResult>> = vec![None; configs.len()];
        let interrupts: Vec<InterruptSlot> = configs.iter().map(|_| Arc::new(Mutex::new(None))).collect();

        for (idx, config) in configs.iter().enumerate() {
            let tx = tx.clone();
            let factory = Arc::clone(&self.factory);
            let interrupt = Arc::clone(&interrupts[idx]);
            let log_ctx = cycle.stream_context(config.name());
            let worker_config = config.clone();

            let spawned = thread::Builder::new()
                .name(format!("freshness-{}", config.name()))
                .spawn(move || {
                    let result = match factory.open_session() {
                        Ok(store) => {
                            *interrupt.lock() = store.interrupt_handle();
                            let result = evaluate(&worker_config, store.as_ref(), now_ms, &log_ctx);
                            interrupt.lock().take();
                            result
                        }
                        Err(e) => {
                            crate::log_error!(log_ctx, "SESSION_OPEN_FAILED", error = e.to_string());
                            FreshnessResult::error(worker_config.name(), e.to_string())
                        }
                    };
                    // Receiver is gone once the wave timed out
                    let _ = tx.send((idx, result));
                });

            if let Err(e) = spawned {
                crate::log_error!(
                    cycle.stream_context(config.name()),
                    "WORKER_SPAWN_FAILED",
                    error = e.to_string()
                );
                slots[idx] = Some(FreshnessResult::error(
                    config.name(),
                    format!("worker spawn failed: {}", e),
                ));
            }
        }
        drop(tx);

        let timeout = self.config.stream_timeout();
        let deadline = Instant::now() + timeout;
        let mut pending = slots.iter().filter(|s| s.is_none()).count();
        while pending > 0 {
            match rx.recv_deadline(deadline) {
                Ok((idx, result)) => {
                    if slots[idx].is_none() {
                        slots[idx] = Some(result);
                        pending -= 1;
                    }
                }
                Err(_) => break,
            }
        }

        slots
            .into_iter()
            .zip(configs)
            .zip(interrupts)
            .map(|((slot, config), interrupt)| {
                slot.unwrap_or_else(|| {
                    crate::log_warn!(
                        cycle.stream_context(config.name()),
                        "STREAM_TIMEOUT",
                        timeout_secs = timeout.as_secs()
                    );
                    if let Some(handle) = interrupt.lock().as_ref() {
                        handle.interrupt();
                    }
                    FreshnessResult::error(
                        config.name(),
                        format!("evaluation timed out after {}s", timeout.as_secs()),
                    )
                })
            })
            .collect()
    }
}
