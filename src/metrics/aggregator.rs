use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::types::{MetricsSnapshot, RequestOutcome};

/// Run-wide outcome aggregator shared by every worker.
///
/// Counters are relaxed atomics; totals are only read after all workers have
/// been joined, so no cross-counter ordering is needed. The status histogram
/// only ever gains keys. Latency appends take a short lock that is never
/// held across an await.
#[derive(Debug, Default)]
pub struct Metrics {
    total: AtomicU64,
    success: AtomicU64,
    errors: AtomicU64,
    status_codes: DashMap<u16, AtomicU64>,
    latencies: Mutex<Vec<Duration>>,
}

impl Metrics {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            latencies: Mutex::new(Vec::with_capacity(capacity)),
            ..Self::default()
        }
    }

    pub fn record(&self, outcome: RequestOutcome) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if outcome.is_success() {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.bump_status(outcome.status);
        self.latencies.lock().push(outcome.latency);
    }

    fn bump_status(&self, status: u16) {
        if let Some(counter) = self.status_codes.get(&status) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.status_codes
            .entry(status)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Copies the current state. Only consistent once recording has stopped.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latencies = self.latencies.lock().clone();
        MetricsSnapshot::new(
            self.total.load(Ordering::Relaxed),
            self.success.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
            self.status_histogram(),
            latencies,
        )
    }

    /// Consumes the aggregator without copying the latency log.
    #[must_use]
    pub fn into_snapshot(self) -> MetricsSnapshot {
        let status_codes = self.status_histogram();
        MetricsSnapshot::new(
            self.total.into_inner(),
            self.success.into_inner(),
            self.errors.into_inner(),
            status_codes,
            self.latencies.into_inner(),
        )
    }

    fn status_histogram(&self) -> BTreeMap<u16, u64> {
        self.status_codes
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }
}
