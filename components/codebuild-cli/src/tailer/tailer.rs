// Local crates
use crate::{
    models::build::LogDestination,
    poller::{fetch, pause},
    runtime::errors::RunnerError,
    service::BuildService,
    tailer::models::{Tailer, TailerHandle},
};

// External crates
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

impl<W> Tailer<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Create a Tailer positioned at the head of `destination`.
    pub fn new(
        service: Arc<dyn BuildService>,
        destination: LogDestination,
        output: W,
        interval: Duration,
    ) -> Self {
        Self {
            destination,
            cursor: None,
            output,
            interval,
            service,
        }
    }

    /// Drain every page that is currently available and return how many
    /// records were written.
    ///
    /// Pages are requested until the forward token stops moving, which is how
    /// CloudWatch signals the end of the available data. An empty page with a
    /// new token is not the end: the stream may have a gap before more records.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<usize, RunnerError> {
        let mut written = 0;

        loop {
            let page = fetch(
                self.service.log_page(&self.destination, self.cursor.as_ref()),
                cancel,
            )
            .await?;

            for record in &page.records {
                self.output.write_all(record.as_bytes()).await?;
            }
            written += page.records.len();

            let advanced = match page.next_cursor {
                Some(next) if self.cursor.as_ref() != Some(&next) => {
                    trace!(cursor = %next, "Log cursor advanced");
                    self.cursor = Some(next);
                    true
                }
                _ => false,
            };

            if !advanced {
                break;
            }
        }

        self.output.flush().await?;
        Ok(written)
    }

    /// Tail until cancelled. Build completion does not stop the tailer since
    /// CloudWatch may still be delivering the last records.
    #[instrument(
        name = "codebuild_tailer::run",
        target = "tailer::tailer",
        level = "debug",
        skip_all,
        fields(destination = %self.destination)
    )]
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        debug!("Tailing CloudWatch log stream");
        loop {
            let written = self.poll_once(cancel).await?;
            trace!(written, "Tail cycle finished");
            pause(self.interval, cancel).await?;
        }
    }
}

/// Spawn a Tailer for `destination` writing to `output` as a background task.
/// `parent_cancel` cancelling also stops the tailer.
pub fn start_tailer<W>(
    service: Arc<dyn BuildService>,
    destination: LogDestination,
    output: W,
    interval: Duration,
    parent_cancel: &CancellationToken,
) -> TailerHandle
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let cancel = parent_cancel.child_token();
    let task_cancel = cancel.clone();

    let join = tokio::spawn(async move {
        let mut tailer = Tailer::new(service, destination, output, interval);
        tailer.run(&task_cancel).await
    });

    TailerHandle { join, cancel }
}

impl TailerHandle {
    /// Stop a running Tailer and wait for it to exit. A tailer that was
    /// stopped by this call is a clean exit; any earlier failure is returned.
    pub async fn stop(self) -> Result<(), RunnerError> {
        self.cancel.cancel();
        match self.join.await {
            Ok(Err(RunnerError::Cancelled)) | Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(task_failure(e)),
        }
    }
}

/// A tailer task that panicked or was aborted still has to fail the run.
pub fn task_failure(err: JoinError) -> RunnerError {
    RunnerError::backend("TailLogs", format!("log tailer task failed: {err}"))
}
