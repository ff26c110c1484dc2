//! Conversions from AWS SDK response shapes into the snapshot types the
//! polling loops work with.
//!
//! These conversions are total: missing SDK fields map onto `None` (or an
//! in-progress outcome) rather than failing, since every snapshot is re-read
//! on the next poll anyway.

// Local crates
use crate::models::build::{BuildOutcome, BuildStatus, LogCursor, LogPage};

// External crates
use aws_sdk_cloudwatchlogs::operation::get_log_events::GetLogEventsOutput;
use aws_sdk_codebuild::types::Build;

/// Convert a CodeBuild `Build` -> `BuildStatus`.
impl From<&Build> for BuildStatus {
    fn from(build: &Build) -> Self {
        let logs = build.logs();

        Self {
            complete: build.build_complete(),
            outcome: build
                .build_status()
                .map(|status| BuildOutcome::from(status.as_str()))
                .unwrap_or(BuildOutcome::InProgress),
            log_group: logs.and_then(|l| l.group_name()).map(str::to_string),
            log_stream: logs.and_then(|l| l.stream_name()).map(str::to_string),
        }
    }
}

/// Convert a CloudWatch Logs `GetLogEvents` response -> `LogPage`.
/// Events without a message carry nothing to print and are dropped.
impl From<GetLogEventsOutput> for LogPage {
    fn from(output: GetLogEventsOutput) -> Self {
        let records = output
            .events()
            .iter()
            .filter_map(|event| event.message())
            .map(str::to_string)
            .collect();

        Self {
            records,
            next_cursor: output.next_forward_token().map(LogCursor::new),
        }
    }
}
