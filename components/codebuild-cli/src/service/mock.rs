//! Scripted in-memory build service for driving the polling loops in tests.

use super::BuildService;
use crate::models::build::{
    BuildHandle, BuildOutcome, BuildRequest, BuildStatus, LogCursor, LogDestination, LogPage,
};
use crate::runtime::errors::RunnerError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// Replays a fixed script of status snapshots (the last one repeats forever)
/// and serves log pages keyed by the cursor they are requested with. A
/// cursor with no scripted page gets an empty page echoing that cursor,
/// which is how CloudWatch reports "no new data".
#[derive(Debug, Default)]
pub struct ScriptedBuildService {
    statuses: Mutex<VecDeque<Result<BuildStatus, String>>>,
    pages: Mutex<HashMap<Option<String>, Result<LogPage, String>>>,
    submitted: Mutex<Vec<BuildRequest>>,
    status_fetches: Mutex<usize>,
    log_cursors: Mutex<Vec<Option<String>>>,
}

impl ScriptedBuildService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_status(&self, status: BuildStatus) {
        self.statuses.lock().await.push_back(Ok(status));
    }

    pub async fn push_status_error(&self, message: &str) {
        self.statuses.lock().await.push_back(Err(message.to_string()));
    }

    /// Serve `records` when asked for `cursor`, continuing at `next`.
    pub async fn page(&self, cursor: Option<&str>, records: &[&str], next: &str) {
        self.pages.lock().await.insert(
            cursor.map(str::to_string),
            Ok(LogPage {
                records: records.iter().map(|r| r.to_string()).collect(),
                next_cursor: Some(LogCursor::new(next)),
            }),
        );
    }

    pub async fn page_error(&self, cursor: Option<&str>, message: &str) {
        self.pages
            .lock()
            .await
            .insert(cursor.map(str::to_string), Err(message.to_string()));
    }

    pub async fn submitted(&self) -> Vec<BuildRequest> {
        self.submitted.lock().await.clone()
    }

    pub async fn status_fetches(&self) -> usize {
        *self.status_fetches.lock().await
    }

    pub async fn log_cursors(&self) -> Vec<Option<String>> {
        self.log_cursors.lock().await.clone()
    }
}

/// Snapshot of a running build with no log info yet.
pub fn pending() -> BuildStatus {
    BuildStatus {
        complete: false,
        outcome: BuildOutcome::InProgress,
        log_group: None,
        log_stream: None,
    }
}

/// Snapshot of a running build whose logs have been assigned.
pub fn running_with_logs(group: &str, stream: &str) -> BuildStatus {
    BuildStatus {
        log_group: Some(group.to_string()),
        log_stream: Some(stream.to_string()),
        ..pending()
    }
}

/// Snapshot of a build that has reached a terminal state.
pub fn finished(outcome: BuildOutcome) -> BuildStatus {
    BuildStatus {
        complete: true,
        outcome,
        ..pending()
    }
}

#[async_trait]
impl BuildService for ScriptedBuildService {
    async fn start_build(&self, request: &BuildRequest) -> Result<BuildHandle, RunnerError> {
        let mut submitted = self.submitted.lock().await;
        submitted.push(request.clone());
        Ok(BuildHandle::new(format!(
            "{}:{:04}",
            request.project_name,
            submitted.len()
        )))
    }

    async fn build_status(&self, _build: &BuildHandle) -> Result<BuildStatus, RunnerError> {
        *self.status_fetches.lock().await += 1;

        let mut statuses = self.statuses.lock().await;
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };

        match next {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(RunnerError::backend("BatchGetBuilds", message)),
            None => Err(RunnerError::backend("BatchGetBuilds", "no status scripted")),
        }
    }

    async fn log_page(
        &self,
        _destination: &LogDestination,
        cursor: Option<&LogCursor>,
    ) -> Result<LogPage, RunnerError> {
        let key = cursor.map(|c| c.as_str().to_string());
        self.log_cursors.lock().await.push(key.clone());

        match self.pages.lock().await.get(&key).cloned() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(RunnerError::backend("GetLogEvents", message)),
            None => Ok(LogPage {
                records: Vec::new(),
                next_cursor: cursor.cloned(),
            }),
        }
    }
}
