//! Run orchestration and reporting shared by the CLI and the API server.
pub(crate) mod export;
mod runner;
pub(crate) mod summary;


pub use export::ReportResponse;
pub use runner::{LoadTest, RunOutcome};
pub use summary::{Report, build_report, format_latency};

pub(crate) use export::export_json;
pub(crate) use summary::print_summary;
