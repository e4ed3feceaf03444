//! Per-request outcomes and the shared run aggregator.
mod aggregator;
mod types;


pub use aggregator::Metrics;
pub use types::{
    MetricsSnapshot, NETWORK_ERROR_LABEL, NETWORK_ERROR_STATUS, OutcomeClass, RequestOutcome,
};
