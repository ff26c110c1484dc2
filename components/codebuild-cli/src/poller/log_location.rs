// Local crates
use crate::{
    helpers::load_config::PollSettings,
    models::build::{BuildHandle, LogDestination},
    poller::{fetch, pause},
    runtime::errors::RunnerError,
    service::BuildService,
};

// External crates
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

/// Poll the build until the backend has assigned both a log group and a log
/// stream. A build that finishes without ever getting a destination ends the
/// wait with [`RunnerError::LogsUnavailable`] instead of polling forever,
/// whatever its outcome: a followed build with nothing to follow is an error.
#[instrument(
    name = "codebuild_poller::wait_for_log_destination",
    target = "poller::log_location",
    level = "debug",
    skip_all,
    fields(build_id = %build)
)]
pub async fn wait_for_log_destination(
    service: &dyn BuildService,
    build: &BuildHandle,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<LogDestination, RunnerError> {
    loop {
        let status = fetch(service.build_status(build), cancel).await?;

        if let Some(destination) = status.log_destination() {
            debug!(%destination, "CloudWatch log destination assigned");
            return Ok(destination);
        }

        if status.complete {
            return Err(RunnerError::LogsUnavailable(status.outcome));
        }

        trace!(
            has_group = status.log_group.is_some(),
            has_stream = status.log_stream.is_some(),
            "Log destination not assigned yet"
        );
        pause(settings.log_location_interval, cancel).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::build::{BuildOutcome, BuildStatus};
    use crate::service::mock::{ScriptedBuildService, finished, pending, running_with_logs};
    use std::time::Duration;
    use tokio::time::Instant;

    fn handle() -> BuildHandle {
        BuildHandle::new("demo:0001")
    }

    #[tokio::test(start_paused = true)]
    async fn waits_through_incomplete_snapshots() {
        let service = ScriptedBuildService::new();
        service.push_status(pending()).await;
        service.push_status(pending()).await;
        service
            .push_status(BuildStatus {
                log_group: Some("/aws/codebuild/demo".into()),
                ..pending()
            })
            .await;
        service
            .push_status(running_with_logs("/aws/codebuild/demo", "0001"))
            .await;

        let started = Instant::now();
        let destination = wait_for_log_destination(
            &service,
            &handle(),
            &PollSettings::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            destination,
            LogDestination {
                group: "/aws/codebuild/demo".into(),
                stream: "0001".into(),
            }
        );
        assert_eq!(service.status_fetches().await, 4);
        assert_eq!(started.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_build_without_logs_stops_waiting() {
        let service = ScriptedBuildService::new();
        service.push_status(pending()).await;
        service.push_status(finished(BuildOutcome::Fault)).await;

        let err = wait_for_log_destination(
            &service,
            &handle(),
            &PollSettings::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RunnerError::LogsUnavailable(BuildOutcome::Fault)));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeded_build_without_logs_is_still_unavailable() {
        let service = ScriptedBuildService::new();
        service.push_status(finished(BuildOutcome::Succeeded)).await;

        let err = wait_for_log_destination(
            &service,
            &handle(),
            &PollSettings::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RunnerError::LogsUnavailable(BuildOutcome::Succeeded)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(service.status_fetches().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_is_fatal() {
        let service = ScriptedBuildService::new();
        service.push_status_error("AccessDeniedException").await;

        let err = wait_for_log_destination(
            &service,
            &handle(),
            &PollSettings::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("AccessDeniedException"));
        assert_eq!(service.status_fetches().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_poll() {
        let service = ScriptedBuildService::new();
        service.push_status(pending()).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = wait_for_log_destination(&service, &handle(), &PollSettings::default(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::Cancelled));
        assert_eq!(service.status_fetches().await, 0);
    }
}
