use std::time::Duration;

use reqwest::{
    Client,
    header::{CONNECTION, HeaderMap, HeaderValue},
    redirect,
};
use tracing::error;

use crate::args::DEFAULT_USER_AGENT;
use crate::config::RunConfig;
use crate::error::{AppError, AppResult, HttpError};

/// Idle connections kept per host for each worker.
const IDLE_CONNECTIONS_PER_WORKER: usize = 2;
/// How long an idle pooled connection is kept open.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
/// Ceiling for connection establishment, TLS handshake included.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the single client shared by every worker of a run.
///
/// Redirects are never followed, so a 3xx is measured as the response it is.
/// Certificate and hostname checks are skipped unless the run asks for
/// verification.
///
/// # Errors
///
/// Returns an error when the underlying client cannot be constructed.
pub fn build_client(config: &RunConfig) -> AppResult<Client> {
    let mut client_builder = Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(MAX_CONNECT_TIMEOUT))
        .user_agent(DEFAULT_USER_AGENT)
        .redirect(redirect::Policy::none());

    if config.keep_alive() {
        client_builder = client_builder
            .pool_max_idle_per_host(
                config
                    .concurrency()
                    .saturating_mul(IDLE_CONNECTIONS_PER_WORKER),
            )
            .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT));
    } else {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        client_builder = client_builder
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Some(Duration::from_secs(0)));
    }

    if !config.verify_tls() {
        client_builder = client_builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    client_builder.build().map_err(|err| {
        error!("Failed to build HTTP client: {}", err);
        AppError::http(HttpError::BuildClientFailed { source: err })
    })
}
