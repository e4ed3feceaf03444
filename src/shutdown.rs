use tokio_util::sync::CancellationToken;

/// One-shot stop signal shared by the orchestrator, its workers and the
/// process interrupt handler. Cancelling more than once is a no-op.
pub type ShutdownToken = CancellationToken;

#[must_use]
pub fn shutdown_token() -> ShutdownToken {
    CancellationToken::new()
}
