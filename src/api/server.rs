use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, ServerError};
use crate::shutdown::{ShutdownToken, shutdown_token};

use super::handler::handle_connection;

/// Extra time given to stopped runs to write their partial reports.
const FORCED_STOP_WAIT: Duration = Duration::from_secs(2);

pub struct ApiServer {
    listener: TcpListener,
    shutdown_grace: Duration,
}

impl ApiServer {
    /// Binds the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is invalid or cannot be bound.
    pub async fn bind(listen: &str, shutdown_grace: Duration) -> AppResult<Self> {
        let addr: SocketAddr = listen.parse().map_err(|err| {
            AppError::server(ServerError::InvalidListenAddr {
                value: listen.to_owned(),
                source: err,
            })
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| AppError::server(ServerError::Bind { addr, source: err }))?;
        Ok(Self {
            listener,
            shutdown_grace,
        })
    }

    /// Address actually bound, useful when listening on port 0.
    ///
    /// # Errors
    ///
    /// Returns an error when the socket address cannot be read.
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        self.listener.local_addr().map_err(|err| {
            AppError::server(ServerError::Io {
                context: "read listener address",
                source: err,
            })
        })
    }

    /// Accepts connections until `shutdown` fires, then waits up to the grace
    /// period for in-flight requests. Runs still going after that are stopped
    /// and answer with their partial results.
    pub async fn run(self, shutdown: ShutdownToken) {
        let runs = shutdown_token();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        debug!("Accepted connection from {}", peer);
                        connections.spawn(handle_connection(socket, runs.clone()));
                    }
                    Err(err) => warn!("Failed to accept connection: {}", err),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(err) = joined {
                        warn!("Connection task failed: {}", err);
                    }
                }
            }
        }

        drop(self.listener);
        info!(
            "Shutting down; waiting up to {:?} for {} open connections",
            self.shutdown_grace,
            connections.len()
        );

        if tokio::time::timeout(self.shutdown_grace, drain(&mut connections))
            .await
            .is_err()
        {
            warn!("Grace period elapsed; stopping in-flight runs");
            runs.cancel();
            if tokio::time::timeout(FORCED_STOP_WAIT, drain(&mut connections))
                .await
                .is_err()
            {
                connections.abort_all();
            }
        }
        info!("Server stopped");
    }
}

async fn drain(connections: &mut JoinSet<()>) {
    while let Some(joined) = connections.join_next().await {
        if let Err(err) = joined {
            warn!("Connection task failed: {}", err);
        }
    }
}
