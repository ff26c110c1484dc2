// Local crates
use crate::{
    helpers::load_config::RunConfig,
    models::build::BuildOutcome,
    poller::{fetch, log_location::wait_for_log_destination, status::wait_for_completion},
    runtime::errors::RunnerError,
    service::{BuildService, ServiceContext},
    tailer::{
        models::TailerHandle,
        tailer::{start_tailer, task_failure},
    },
};

// External crates
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

/// Run one build end to end.
///
/// Submits the build, then (when following) resolves the CloudWatch log
/// destination and tails it on a background task writing to `log_output`,
/// then (when waiting) polls the build to completion. The tailer is only
/// stopped after the status poller returns, including its grace delay, and
/// a tailer failure at any point fails the whole run.
#[instrument(
    name = "codebuild_runtime::run_build",
    target = "runtime::runtime",
    level = "debug",
    skip_all,
    fields(project = %config.request.project_name)
)]
pub async fn run_build<W>(
    service: Arc<dyn BuildService>,
    context: &ServiceContext,
    config: &RunConfig,
    log_output: W,
    cancel: &CancellationToken,
) -> Result<(), RunnerError>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let project = &config.request.project_name;

    println!("Starting AWS CodeBuild for project: {project}");
    let build = fetch(service.start_build(&config.request), cancel).await?;
    info!(build_id = %build, "Build started");
    println!("Build URL: {}", context.build_url(project, &build));

    let tailer = if config.follow {
        println!("Waiting for CloudWatch log info...");
        let destination =
            wait_for_log_destination(service.as_ref(), &build, &config.poll, cancel).await?;

        println!("Tailing logs from CloudWatch: {destination}");
        println!("{SEPARATOR}");
        Some(start_tailer(
            Arc::clone(&service),
            destination,
            log_output,
            config.poll.tail_interval,
            cancel,
        ))
    } else {
        None
    };

    if !config.wait {
        return Ok(());
    }

    let completion = wait_for_completion(service.as_ref(), &build, &config.poll, cancel);
    let outcome = match tailer {
        None => completion.await,
        Some(tailer) => race_tailer(completion, tailer).await,
    }?;

    info!(build_id = %build, %outcome, "Build completed");
    Ok(())
}

/// Run the status poller while watching the tailer task. Whichever fails
/// first decides the result; a successful poll stops the tailer afterwards.
async fn race_tailer<F>(completion: F, mut tailer: TailerHandle) -> Result<BuildOutcome, RunnerError>
where
    F: std::future::Future<Output = Result<BuildOutcome, RunnerError>>,
{
    let outcome = tokio::select! {
        res = completion => res,
        joined = &mut tailer.join => {
            return Err(match joined {
                Ok(Err(e)) => e,
                Ok(Ok(())) => RunnerError::backend("TailLogs", "log tailer stopped unexpectedly"),
                Err(e) => task_failure(e),
            });
        }
    };

    let stopped = tailer.stop().await;
    let outcome = outcome?;
    stopped?;
    Ok(outcome)
}
