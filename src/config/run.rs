use std::time::Duration;

use tracing::warn;

use crate::args::{
    DEFAULT_CONCURRENCY, DEFAULT_DURATION, DEFAULT_METHOD, DEFAULT_TIMEOUT, MAX_CONCURRENCY,
    TesterArgs,
};
use crate::error::ValidationError;

/// Latency samples assumed per worker per second when pre-sizing the log.
const ESTIMATED_RPS_PER_WORKER: usize = 100;
/// Pre-allocation used when no estimate can be derived.
const FALLBACK_CAPACITY: usize = 10_000;
/// Upper bound on pre-allocated latency slots (32 MiB of `Duration`s).
const MAX_PREALLOCATED_SAMPLES: usize = 4_194_304;

/// Raw run parameters as received from a front-end. Nothing here is trusted.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub url: Option<String>,
    pub method: Option<String>,
    pub concurrency: Option<i64>,
    pub duration: Option<Duration>,
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub disable_keepalive: bool,
    pub verify_tls: bool,
}

impl RunInput {
    #[must_use]
    pub fn from_args(args: &TesterArgs) -> Self {
        Self {
            url: args.url.clone(),
            method: args.method.clone(),
            concurrency: args
                .concurrency
                .map(|value| i64::try_from(value.get()).unwrap_or(i64::MAX)),
            duration: args.duration,
            timeout: args.timeout,
            headers: args.headers.clone(),
            body: args.body.clone(),
            disable_keepalive: args.disable_keepalive,
            verify_tls: args.verify_tls,
        }
    }
}

/// Validated parameters for a single run. Immutable once built.
#[derive(Debug, Clone)]
pub struct RunConfig {
    url: String,
    method: String,
    concurrency: usize,
    duration: Duration,
    timeout: Duration,
    headers: Vec<(String, String)>,
    body: Option<String>,
    keep_alive: bool,
    verify_tls: bool,
}

impl RunConfig {
    /// Validates raw input, substituting defaults for missing or
    /// non-positive numeric values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingUrl`] when the URL is absent or blank
    /// and [`ValidationError::ConcurrencyTooLarge`] above the worker limit.
    pub fn from_input(input: RunInput) -> Result<Self, ValidationError> {
        let url = input
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ValidationError::MissingUrl)?
            .to_owned();

        let method = input
            .method
            .as_deref()
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .map_or_else(|| DEFAULT_METHOD.to_owned(), str::to_ascii_uppercase);

        let concurrency = match input.concurrency {
            None => DEFAULT_CONCURRENCY,
            Some(value) => match usize::try_from(value) {
                Ok(workers) if workers > MAX_CONCURRENCY => {
                    return Err(ValidationError::ConcurrencyTooLarge {
                        value,
                        max: MAX_CONCURRENCY,
                    });
                }
                Ok(workers) if workers > 0 => workers,
                Ok(_) | Err(_) => {
                    warn!(
                        "Concurrency {} is not positive, using {}",
                        value, DEFAULT_CONCURRENCY
                    );
                    DEFAULT_CONCURRENCY
                }
            },
        };

        let duration = positive_or_default(input.duration, DEFAULT_DURATION, "duration");
        let timeout = positive_or_default(input.timeout, DEFAULT_TIMEOUT, "timeout");

        Ok(Self {
            url,
            method,
            concurrency,
            duration,
            timeout,
            headers: input.headers,
            body: input.body,
            keep_alive: !input.disable_keepalive,
            verify_tls: input.verify_tls,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    #[must_use]
    pub const fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    #[must_use]
    pub const fn verify_tls(&self) -> bool {
        self.verify_tls
    }
}

fn positive_or_default(value: Option<Duration>, default: Duration, field: &str) -> Duration {
    match value {
        None => default,
        Some(value) if value.is_zero() => {
            warn!("{} must be > 0, using {:?}", field, default);
            default
        }
        Some(value) => value,
    }
}

/// Expected number of latency samples for a run, used to pre-size the log.
#[must_use]
pub fn capacity_estimate(concurrency: usize, duration: Duration) -> usize {
    let mut secs = usize::try_from(duration.as_secs()).unwrap_or(usize::MAX);
    if duration.subsec_nanos() > 0 || secs == 0 {
        secs = secs.saturating_add(1);
    }
    let estimate = concurrency
        .checked_mul(ESTIMATED_RPS_PER_WORKER)
        .and_then(|per_sec| per_sec.checked_mul(secs))
        .unwrap_or(MAX_PREALLOCATED_SAMPLES);
    if estimate == 0 {
        return FALLBACK_CAPACITY;
    }
    estimate.min(MAX_PREALLOCATED_SAMPLES)
}
