//! Error taxonomy for a single `codebuild` run.
//!
//! Nothing is retried or recovered internally: every variant aborts the loop
//! that produced it and travels up to `main`, which turns it into an exit code.

use crate::models::build::BuildOutcome;

/// Process exit code for usage errors (missing project, bad flag values).
pub const EXIT_USAGE: u8 = 2;
/// Process exit code for every runtime failure.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("{0}")]
    Usage(String),
    #[error("{operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
    #[error("build finished with status {0}")]
    BuildFailed(BuildOutcome),
    #[error("build finished with status {0} before CloudWatch log info was available")]
    LogsUnavailable(BuildOutcome),
    #[error("operation cancelled")]
    Cancelled,
    #[error("failed to write build logs: {0}")]
    Output(#[from] std::io::Error),
}

impl RunnerError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_usage_errors_exit_with_two() {
        assert_eq!(RunnerError::Usage("missing project".into()).exit_code(), 2);
        assert_eq!(RunnerError::backend("StartBuild", "denied").exit_code(), 1);
        assert_eq!(RunnerError::BuildFailed(BuildOutcome::Failed).exit_code(), 1);
        assert_eq!(RunnerError::Cancelled.exit_code(), 1);
    }

    #[test]
    fn build_failure_carries_the_outcome_code() {
        let err = RunnerError::BuildFailed(BuildOutcome::Failed);
        assert_eq!(err.to_string(), "build finished with status FAILED");
    }
}
