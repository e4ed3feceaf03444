//! Core library for the `loadblast` CLI.
//!
//! A closed-loop HTTP load generator: a fixed pool of workers fires requests
//! at one target for a fixed duration, every outcome lands in a shared
//! aggregator, and the run ends in a report with nearest-rank latency
//! percentiles. The same engine backs the command line and the web API
//! started by `loadblast serve`.
pub mod api;
pub mod app;
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;

#[cfg(test)]
mod test_support;
