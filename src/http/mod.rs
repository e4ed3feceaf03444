//! HTTP client construction, the request template and the worker loop.
mod client;
mod template;
mod worker;

#[cfg(test)]
mod tests;

pub use client::build_client;
pub use template::RequestTemplate;
pub use worker::{Worker, WorkerState};
