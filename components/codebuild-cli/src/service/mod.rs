//! Remote build service seam.
//!
//! The polling loops only ever talk to a [`BuildService`]; the AWS
//! implementation lives in [`aws`], and tests drive the loops through a
//! scripted in-memory implementation.

pub mod aws;
#[cfg(test)]
pub mod mock;

// Local crates
use crate::{
    models::build::{BuildHandle, BuildRequest, BuildStatus, LogCursor, LogDestination, LogPage},
    runtime::errors::RunnerError,
};

// External crates
use async_trait::async_trait;

/// The three capabilities a run consumes from the build backend.
#[async_trait]
pub trait BuildService: Send + Sync {
    /// Submit a build. Called exactly once per run.
    async fn start_build(&self, request: &BuildRequest) -> Result<BuildHandle, RunnerError>;

    /// Fetch a fresh snapshot of the build.
    async fn build_status(&self, build: &BuildHandle) -> Result<BuildStatus, RunnerError>;

    /// Fetch the next page of log records after `cursor`, or from the head of
    /// the stream when `cursor` is `None`.
    async fn log_page(
        &self,
        destination: &LogDestination,
        cursor: Option<&LogCursor>,
    ) -> Result<LogPage, RunnerError>;
}

/// Display-only facts about the account the build runs in. Resolved once
/// per run and passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    pub region: String,
    pub account_id: String,
}

impl ServiceContext {
    /// Console URL for a build.
    pub fn build_url(&self, project: &str, build: &BuildHandle) -> String {
        format!(
            "https://{region}.console.aws.amazon.com/codesuite/codebuild/{account}/projects/{project}/build/{id}/?region={region}",
            region = self.region,
            account = self.account_id,
            project = project,
            id = build,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_is_built_from_context_project_and_id() {
        let ctx = ServiceContext {
            region: "eu-west-1".into(),
            account_id: "123456789012".into(),
        };
        let url = ctx.build_url("demo", &BuildHandle::new("demo:0f3c"));

        assert_eq!(
            url,
            "https://eu-west-1.console.aws.amazon.com/codesuite/codebuild/123456789012/projects/demo/build/demo:0f3c/?region=eu-west-1"
        );
    }
}
