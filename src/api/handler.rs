use std::time::Duration;

use serde::Deserialize;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::app::{LoadTest, ReportResponse, build_report};
use crate::config::{RunConfig, RunInput};
use crate::shutdown::ShutdownToken;

use super::http::{
    HttpRequest, read_http_request, write_empty_response, write_html_response,
    write_json_response,
};
use super::page::INDEX_HTML;

/// Time allowed for a client to send a complete request.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `POST /api/run`. Durations are whole seconds; missing, zero or
/// negative numbers fall back to the run defaults.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ApiRunRequest {
    pub(super) target_url: Option<String>,
    pub(super) method: Option<String>,
    pub(super) concurrency: Option<i64>,
    pub(super) duration: Option<i64>,
    pub(super) timeout: Option<i64>,
}

impl ApiRunRequest {
    fn into_input(self) -> RunInput {
        RunInput {
            url: self.target_url,
            method: self.method,
            concurrency: self.concurrency,
            duration: self.duration.map(whole_seconds),
            timeout: self.timeout.map(whole_seconds),
            ..RunInput::default()
        }
    }
}

fn whole_seconds(secs: i64) -> Duration {
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}

#[derive(Debug)]
pub(super) enum ApiResponse {
    Json(u16, ReportResponse),
    Html(&'static str),
    Empty(u16),
}

pub(super) async fn handle_connection(mut socket: TcpStream, runs: ShutdownToken) {
    let request =
        match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_http_request(&mut socket)).await {
            Ok(Ok(request)) => request,
            Ok(Err(err)) => {
                debug!("Rejected request: {}", err.message);
                if write_json_response(&mut socket, err.status, &ReportResponse::error(err.message))
                    .await
                    .is_err()
                {
                    // Socket closed while writing error response.
                }
                return;
            }
            Err(_elapsed) => {
                if write_json_response(&mut socket, 408, &ReportResponse::error("Request timeout"))
                    .await
                    .is_err()
                {
                    // Socket closed while writing error response.
                }
                return;
            }
        };

    debug!(
        "{} {} ({})",
        request.method,
        request.path,
        request
            .headers
            .get("user-agent")
            .map_or("unknown agent", String::as_str)
    );

    let written = match route(&request, &runs).await {
        ApiResponse::Json(status, response) => {
            write_json_response(&mut socket, status, &response).await
        }
        ApiResponse::Html(html) => write_html_response(&mut socket, 200, html).await,
        ApiResponse::Empty(status) => write_empty_response(&mut socket, status).await,
    };
    if let Err(err) = written {
        debug!("Failed to write response: {}", err);
    }
}

pub(super) async fn route(request: &HttpRequest, runs: &ShutdownToken) -> ApiResponse {
    match (request.method.as_str(), request.path.as_str()) {
        ("OPTIONS", _) => ApiResponse::Empty(200),
        ("GET", "/" | "/index.html") => ApiResponse::Html(INDEX_HTML),
        ("POST", "/api/run") => run_from_body(&request.body, runs).await,
        (_, "/api/run") => ApiResponse::Json(
            405,
            ReportResponse::error("Only POST is allowed on /api/run"),
        ),
        _ => ApiResponse::Json(404, ReportResponse::error("Not found")),
    }
}

async fn run_from_body(body: &[u8], runs: &ShutdownToken) -> ApiResponse {
    let request = match serde_json::from_slice::<ApiRunRequest>(body) {
        Ok(request) => request,
        Err(err) => {
            return ApiResponse::Json(
                400,
                ReportResponse::error(format!("Invalid JSON: {}", err)),
            );
        }
    };

    let config = match RunConfig::from_input(request.into_input()) {
        Ok(config) => config,
        Err(err) => return ApiResponse::Json(400, ReportResponse::error(err.to_string())),
    };
    let load_test = match LoadTest::prepare(config) {
        Ok(load_test) => load_test.with_parent(runs),
        Err(err) => return ApiResponse::Json(400, ReportResponse::error(err.to_string())),
    };

    info!(
        "API run: {} {} with {} workers for {:?}",
        load_test.config().method(),
        load_test.config().url(),
        load_test.config().concurrency(),
        load_test.config().duration()
    );
    let outcome = load_test.run().await;
    if outcome.interrupted {
        warn!("API run stopped early; returning partial results");
    }
    let report = build_report(&outcome.snapshot, outcome.elapsed);
    ApiResponse::Json(200, ReportResponse::from_report(&report))
}
