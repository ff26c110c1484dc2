//! `codebuild` starts an AWS CodeBuild build and, on request, streams its
//! CloudWatch logs and waits for it to finish.
//!
//! Exit codes: `0` success, `1` runtime/backend error or failed build,
//! `2` usage error.

mod cli;
mod helpers;
mod instrumentation;
mod models;
mod poller;
mod runtime;
mod service;
mod tailer;

use runtime::errors::{EXIT_FAILURE, EXIT_USAGE, RunnerError};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Main entrypoint simply delegates control to CLI layer and turns the
    // outcome into a process exit code.
    match cli::cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            let code = err
                .downcast_ref::<RunnerError>()
                .map_or(EXIT_FAILURE, RunnerError::exit_code);
            if code == EXIT_USAGE {
                eprintln!("Run 'codebuild --help' for usage.");
            }
            ExitCode::from(code)
        }
    }
}
