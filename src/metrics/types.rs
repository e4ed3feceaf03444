use std::collections::BTreeMap;
use std::time::Duration;

/// Status recorded when no HTTP response was obtained.
pub const NETWORK_ERROR_STATUS: u16 = 0;
/// Report label used for [`NETWORK_ERROR_STATUS`].
pub const NETWORK_ERROR_LABEL: &str = "NetworkError";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    /// Status in `[200, 400)`.
    Success,
    /// A response arrived with any other status.
    HttpFailure,
    /// Connect, timeout, TLS or body-read failure.
    TransportFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub latency: Duration,
    pub class: OutcomeClass,
    pub status: u16,
}

impl RequestOutcome {
    #[must_use]
    pub const fn from_status(latency: Duration, status: u16) -> Self {
        let class = if status >= 200 && status < 400 {
            OutcomeClass::Success
        } else {
            OutcomeClass::HttpFailure
        };
        Self {
            latency,
            class,
            status,
        }
    }

    #[must_use]
    pub const fn transport_failure(latency: Duration) -> Self {
        Self {
            latency,
            class: OutcomeClass::TransportFailure,
            status: NETWORK_ERROR_STATUS,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.class, OutcomeClass::Success)
    }
}

/// Owned view of a finished run. The latency log is sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub success: u64,
    pub errors: u64,
    pub status_codes: BTreeMap<u16, u64>,
    latencies: Vec<Duration>,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn new(
        total: u64,
        success: u64,
        errors: u64,
        status_codes: BTreeMap<u16, u64>,
        mut latencies: Vec<Duration>,
    ) -> Self {
        latencies.sort_unstable();
        Self {
            total,
            success,
            errors,
            status_codes,
            latencies,
        }
    }

    #[must_use]
    pub fn latencies(&self) -> &[Duration] {
        &self.latencies
    }
}
