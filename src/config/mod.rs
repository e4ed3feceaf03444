//! Run configuration: file loading, CLI merging and validation.
mod apply;
mod loader;
mod run;
pub mod types;

#[cfg(test)]
mod tests;

pub use apply::apply_config;
pub use loader::load_config;
pub use run::{RunConfig, RunInput, capacity_estimate};

pub(crate) use loader::DEFAULT_CONFIG_FILES;
