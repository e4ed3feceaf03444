//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::{Command, ServeArgs, TesterArgs};
pub use types::{OutputFormat, PositiveUsize};

pub(crate) use defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_DURATION, DEFAULT_METHOD, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    MAX_CONCURRENCY,
};
pub(crate) use parsers::{parse_duration, parse_header};
#[cfg(test)]
pub(crate) use test_support::parse_test_args;
