//! Fixed-interval polling loops over build status.
//!
//! Both loops check the cancellation token before every fetch and race it
//! against every wait, so a cancelled run never blocks on a poll.

pub mod log_location;
pub mod status;

// Local crates
use crate::runtime::errors::RunnerError;

// External crates
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleep for `interval` unless the run is cancelled first.
pub async fn pause(interval: Duration, cancel: &CancellationToken) -> Result<(), RunnerError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RunnerError::Cancelled),
        _ = tokio::time::sleep(interval) => Ok(()),
    }
}

/// Drive a single remote call, abandoning it if the run is cancelled.
pub async fn fetch<T, F>(call: F, cancel: &CancellationToken) -> Result<T, RunnerError>
where
    F: Future<Output = Result<T, RunnerError>>,
{
    if cancel.is_cancelled() {
        return Err(RunnerError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RunnerError::Cancelled),
        res = call => res,
    }
}
