use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::{
    config::{RunConfig, capacity_estimate},
    error::{AppError, AppResult},
    http::{RequestTemplate, Worker, build_client},
    metrics::{Metrics, MetricsSnapshot},
    shutdown::{ShutdownToken, shutdown_token},
};

#[derive(Debug)]
pub struct RunOutcome {
    pub snapshot: MetricsSnapshot,
    pub elapsed: Duration,
    /// The run was stopped by the shutdown token before its deadline.
    pub interrupted: bool,
}

/// A prepared run: the client and request template are built and checked,
/// no worker exists yet.
pub struct LoadTest {
    config: RunConfig,
    client: Client,
    template: Arc<RequestTemplate>,
    shutdown: ShutdownToken,
}

impl LoadTest {
    /// Builds the shared client and request template for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built or the request is
    /// malformed.
    pub fn prepare(config: RunConfig) -> AppResult<Self> {
        let client = build_client(&config)?;
        let template = RequestTemplate::new(&client, &config).map_err(|err| {
            error!("Invalid request: {}", err);
            AppError::http(err)
        })?;
        Ok(Self {
            config,
            client,
            template: Arc::new(template),
            shutdown: shutdown_token(),
        })
    }

    /// Ties this run to `parent`: cancelling the parent stops the run, while
    /// stopping the run leaves the parent untouched.
    #[must_use]
    pub fn with_parent(mut self, parent: &ShutdownToken) -> Self {
        self.shutdown = parent.child_token();
        self
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Handle for stopping the run early. Cancelling it has the same effect
    /// as the deadline expiring.
    #[must_use]
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Spawns the workers, waits for the deadline or an early stop, joins
    /// every worker and snapshots the metrics. Dropping the returned future
    /// stops the workers.
    pub async fn run(self) -> RunOutcome {
        let stop_on_drop = self.shutdown.clone().drop_guard();
        let concurrency = self.config.concurrency();
        let duration = self.config.duration();
        let metrics = Arc::new(Metrics::with_capacity(capacity_estimate(
            concurrency,
            duration,
        )));

        info!(
            "Starting {} {} with {} workers for {:?}",
            self.template.method(),
            self.template.url(),
            concurrency,
            duration
        );

        let started = Instant::now();
        let mut worker_handles = Vec::with_capacity(concurrency);
        for id in 0..concurrency {
            let mut worker = Worker::new(
                id,
                self.client.clone(),
                Arc::clone(&self.template),
                Arc::clone(&metrics),
                self.shutdown.clone(),
            );
            worker_handles.push(tokio::spawn(async move { worker.run().await }));
        }

        let interrupted = tokio::select! {
            () = tokio::time::sleep(duration) => false,
            () = self.shutdown.cancelled() => true,
        };
        self.shutdown.cancel();
        if interrupted {
            info!("Stopping early after {:?}", started.elapsed());
        }

        let mut recorded: u64 = 0;
        for handle in worker_handles {
            match handle.await {
                Ok(count) => recorded = recorded.saturating_add(count),
                Err(err) => error!("Worker task failed: {}", err),
            }
        }
        let elapsed = started.elapsed();
        drop(stop_on_drop);

        let snapshot = match Arc::try_unwrap(metrics) {
            Ok(metrics) => metrics.into_snapshot(),
            Err(shared) => {
                warn!("Metrics still shared after join; copying snapshot");
                shared.snapshot()
            }
        };

        info!(
            "Run finished: {} requests ({} recorded by workers) in {:?}",
            snapshot.total, recorded, elapsed
        );

        RunOutcome {
            snapshot,
            elapsed,
            interrupted,
        }
    }
}
