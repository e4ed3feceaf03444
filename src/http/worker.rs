use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::{Client, Request};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::metrics::{Metrics, RequestOutcome};
use crate::shutdown::ShutdownToken;

use super::RequestTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Stopped,
}

/// Closed-loop request issuer: one attempt in flight at a time, no pacing,
/// no retries.
pub struct Worker {
    id: usize,
    client: Client,
    template: Arc<RequestTemplate>,
    metrics: Arc<Metrics>,
    shutdown: ShutdownToken,
    state: WorkerState,
}

impl Worker {
    #[must_use]
    pub const fn new(
        id: usize,
        client: Client,
        template: Arc<RequestTemplate>,
        metrics: Arc<Metrics>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            id,
            client,
            template,
            metrics,
            shutdown,
            state: WorkerState::Running,
        }
    }

    #[cfg(test)]
    pub(crate) const fn id(&self) -> usize {
        self.id
    }

    #[cfg(test)]
    pub(crate) const fn state(&self) -> WorkerState {
        self.state
    }

    /// Issues requests until the shutdown token fires and returns how many
    /// outcomes were recorded. An attempt still in flight at cancellation is
    /// dropped without being recorded.
    pub async fn run(&mut self) -> u64 {
        let mut recorded: u64 = 0;

        while !self.shutdown.is_cancelled() {
            let Some(request) = self.template.derive() else {
                error!("Worker {} could not derive a request; stopping", self.id);
                break;
            };

            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                outcome = attempt(&self.client, request) => {
                    self.metrics.record(outcome);
                    recorded = recorded.saturating_add(1);
                }
            }
        }

        self.state = WorkerState::Stopped;
        debug!(
            "Worker {} {:?} after {} requests",
            self.id, self.state, recorded
        );
        recorded
    }
}

/// Sends one request and measures it from dispatch until the body is fully
/// read.
pub(crate) async fn attempt(client: &Client, request: Request) -> RequestOutcome {
    let started = Instant::now();
    match client.execute(request).await {
        Ok(response) => {
            let status = response.status().as_u16();
            match drain_response_body(response).await {
                Ok(_bytes) => RequestOutcome::from_status(started.elapsed(), status),
                Err(err) => {
                    debug!("Failed to read response body: {}", err);
                    RequestOutcome::transport_failure(started.elapsed())
                }
            }
        }
        Err(err) => {
            debug!("Request failed: {}", err);
            RequestOutcome::transport_failure(started.elapsed())
        }
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
