//! Interrupt handling for a run.
//!
//! Every polling loop watches the same root `CancellationToken`, so a single
//! Ctrl+C (or SIGTERM) makes each loop return `RunnerError::Cancelled` at its
//! next fetch or wait instead of the process being torn down mid-write.

// External crates
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Spawn the signal listener. It cancels `cancel` on the first interrupt and
/// exits quietly if the token is cancelled for any other reason.
#[instrument(
    name = "codebuild_shutdown_listener",
    target = "helpers::shutdown",
    level = "trace",
    skip_all
)]
pub fn listen_for_shutdown(cancel: CancellationToken) -> JoinHandle<()> {
    tracing::trace!("Installing interrupt listener");
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = interrupted() => {
                tracing::warn!("Interrupt received, cancelling run");
                cancel.cancel();
            }
        }
    })
}

#[cfg(unix)]
async fn interrupted() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "SIGTERM listener unavailable, watching Ctrl+C only");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn interrupted() {
    ctrl_c().await;
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "Ctrl+C listener unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_exits_when_run_finishes_first() {
        let cancel = CancellationToken::new();
        let listener = listen_for_shutdown(cancel.clone());

        cancel.cancel();

        assert!(listener.await.is_ok());
    }
}
