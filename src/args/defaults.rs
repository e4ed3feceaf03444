use std::time::Duration;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("loadblast/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_METHOD: &str = "GET";
pub(crate) const DEFAULT_CONCURRENCY: usize = 50;
/// Upper bound on workers for a single run.
pub(crate) const MAX_CONCURRENCY: usize = 100_000;
pub(crate) const DEFAULT_DURATION: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub(crate) const DEFAULT_SHUTDOWN_GRACE: &str = "15s";
