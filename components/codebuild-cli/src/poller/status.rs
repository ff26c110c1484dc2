// Local crates
use crate::{
    helpers::load_config::PollSettings,
    models::build::{BuildHandle, BuildOutcome},
    poller::{fetch, pause},
    runtime::errors::RunnerError,
    service::BuildService,
};

// External crates
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, trace};

/// Poll the build until it reports a terminal state.
///
/// Once the terminal snapshot is seen the poller holds on for the completion
/// grace delay before reporting, so a concurrently running tailer gets a
/// chance to print trailing log records. Only `SUCCEEDED` is a success; any
/// other terminal outcome is returned as [`RunnerError::BuildFailed`].
#[instrument(
    name = "codebuild_poller::wait_for_completion",
    target = "poller::status",
    level = "debug",
    skip_all,
    fields(build_id = %build)
)]
pub async fn wait_for_completion(
    service: &dyn BuildService,
    build: &BuildHandle,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<BuildOutcome, RunnerError> {
    loop {
        let status = fetch(service.build_status(build), cancel).await?;

        if status.complete {
            info!(outcome = %status.outcome, "Build reached a terminal state");
            pause(settings.completion_grace, cancel).await?;

            return match status.outcome {
                BuildOutcome::Succeeded => Ok(BuildOutcome::Succeeded),
                outcome => Err(RunnerError::BuildFailed(outcome)),
            };
        }

        trace!(outcome = %status.outcome, "Build still running");
        pause(settings.status_interval, cancel).await?;
    }
}
