//! Logging setup and relay counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Logs go to stderr; stdout carries relayed results.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    tasks_received: AtomicU64,
    results_posted: AtomicU64,
    relays_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_received(&self) {
        self.tasks_received.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_received", "Metric incremented");
    }

    pub fn result_posted(&self) {
        self.results_posted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "results_posted", "Metric incremented");
    }

    pub fn relay_failed(&self) {
        self.relays_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "relays_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_received: self.tasks_received.load(Ordering::Relaxed),
            results_posted: self.results_posted.load(Ordering::Relaxed),
            relays_failed: self.relays_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tasks_received: u64,
    pub results_posted: u64,
    pub relays_failed: u64,
}
