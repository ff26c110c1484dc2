// Local crates
use crate::{
    models::build::{LogCursor, LogDestination},
    runtime::errors::RunnerError,
    service::BuildService,
};

// External crates
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Follows one CloudWatch log stream and copies every record, byte for
/// byte, to `output`.
///
/// The `cursor` only ever moves forward: it starts at `None` (head of the
/// stream) and is replaced by each page's continuation token, so a record is
/// never printed twice across poll cycles.
pub struct Tailer<W> {
    pub destination: LogDestination,
    pub cursor: Option<LogCursor>,
    pub output: W,
    pub interval: Duration,
    pub service: Arc<dyn BuildService>,
}

impl<W> std::fmt::Debug for Tailer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tailer")
            .field("destination", &self.destination)
            .field("cursor", &self.cursor)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Control plane object for a running `Tailer` task. The task's result
/// comes back through `join`; the tailer never ends the process itself.
#[derive(Debug)]
pub struct TailerHandle {
    pub join: JoinHandle<Result<(), RunnerError>>,
    pub cancel: CancellationToken,
}
