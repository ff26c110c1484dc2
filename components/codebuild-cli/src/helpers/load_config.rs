//! Run configuration resolution.
//!
//! Resolution happens in two explicit phases and yields one immutable
//! [`RunConfig`]:
//!
//! 1. command-line flags are parsed into a [`PartialConfig`] (every flag optional),
//! 2. each flag that was not given is looked up in the environment under its
//!    upper-cased name, e.g. `--source-version` -> `SOURCE_VERSION`.
//!
//! Source location/version are then backfilled from CI provider variables
//! based on the declared source type.

// Local crates
use crate::{
    models::build::{BuildRequest, SourceOverride},
    runtime::errors::RunnerError,
};

// External crates
use std::time::Duration;
use tracing::instrument;

pub const FLAG_COMPUTE_TYPE: &str = "compute-type";
pub const FLAG_SERVICE_ROLE: &str = "service-role";
pub const FLAG_ROLE_ARN: &str = "role-arn";
pub const FLAG_SOURCE_TYPE: &str = "source-type";
pub const FLAG_SOURCE_LOCATION: &str = "source-location";
pub const FLAG_SOURCE_VERSION: &str = "source-version";
pub const FLAG_FOLLOW: &str = "follow";
pub const FLAG_WAIT: &str = "wait";

/// Bitbucket Pipelines variables used to backfill a `BITBUCKET` source.
const BITBUCKET_LOCATION_VAR: &str = "BITBUCKET_GIT_HTTP_ORIGIN";
const BITBUCKET_VERSION_VAR: &str = "BITBUCKET_COMMIT";

/// Fixed polling intervals. Not user-configurable; tests shrink them or run
/// them on a paused clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub status_interval: Duration,
    pub log_location_interval: Duration,
    pub tail_interval: Duration,
    pub completion_grace: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(3),
            log_location_interval: Duration::from_secs(3),
            tail_interval: Duration::from_secs(3),
            completion_grace: Duration::from_secs(10),
        }
    }
}

/// Flags exactly as given on the command line. `None`/`false` means "not set".
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub project: String,
    pub env_vars: Vec<(String, String)>,
    pub compute_type: Option<String>,
    pub service_role: Option<String>,
    pub role_arn: Option<String>,
    pub source_type: Option<String>,
    pub source_location: Option<String>,
    pub source_version: Option<String>,
    pub follow: bool,
    pub wait: bool,
    pub verbose: u8,
}

/// Final, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub request: BuildRequest,
    pub follow: bool,
    pub wait: bool,
    pub role_arn: Option<String>,
    pub verbose: u8,
    pub poll: PollSettings,
}

impl RunConfig {
    /// Resolve `partial` against the environment reachable through `lookup`.
    #[instrument(
        name = "codebuild_config::resolve",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn resolve<F>(partial: PartialConfig, lookup: F) -> Result<Self, RunnerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = backfill_source(
            SourceOverride {
                source_type: fill(partial.source_type, FLAG_SOURCE_TYPE, &lookup),
                location: fill(partial.source_location, FLAG_SOURCE_LOCATION, &lookup),
                version: fill(partial.source_version, FLAG_SOURCE_VERSION, &lookup),
            },
            &lookup,
        )?;

        let request = BuildRequest::new(partial.project)
            .compute_type(fill(partial.compute_type, FLAG_COMPUTE_TYPE, &lookup))
            .service_role(fill(partial.service_role, FLAG_SERVICE_ROLE, &lookup))
            .source(source)
            .environment(partial.env_vars);

        let follow = fill_bool(partial.follow, FLAG_FOLLOW, &lookup)?;
        let wait = follow || fill_bool(partial.wait, FLAG_WAIT, &lookup)?;

        Ok(Self {
            request,
            follow,
            wait,
            role_arn: fill(partial.role_arn, FLAG_ROLE_ARN, &lookup).filter(|v| !v.is_empty()),
            verbose: partial.verbose,
            poll: PollSettings::default(),
        })
    }
}

/// Environment variable consulted for a flag, e.g. `compute-type` -> `COMPUTE_TYPE`.
pub fn env_name(flag: &str) -> String {
    flag.to_uppercase().replace('-', "_")
}

/// Parse one `NAME=VALUE` environment override. The value may itself
/// contain `=`.
pub fn parse_env_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}

/// An explicitly given flag always wins, even when empty; otherwise a
/// non-empty environment value is used.
fn fill<F>(explicit: Option<String>, flag: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit.or_else(|| lookup(&env_name(flag)).filter(|v| !v.is_empty()))
}

fn fill_bool<F>(explicit: bool, flag: &str, lookup: &F) -> Result<bool, RunnerError>
where
    F: Fn(&str) -> Option<String>,
{
    if explicit {
        return Ok(true);
    }

    let name = env_name(flag);
    match lookup(&name).filter(|v| !v.is_empty()) {
        None => Ok(false),
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            RunnerError::Usage(format!("invalid boolean value {raw:?} in {name}"))
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Fill a missing source location/version from the CI provider matching the
/// declared source type.
fn backfill_source<F>(mut source: SourceOverride, lookup: &F) -> Result<SourceOverride, RunnerError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(source_type) = source.source_type.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(source);
    };

    let (location_var, version_var) = match source_type {
        "BITBUCKET" => (BITBUCKET_LOCATION_VAR, BITBUCKET_VERSION_VAR),
        other => return Err(RunnerError::Usage(format!("Unknown source type: {other}"))),
    };

    if source.location.as_deref().is_none_or(str::is_empty) {
        source.location = lookup(location_var);
    }
    if source.version.as_deref().is_none_or(str::is_empty) {
        source.version = lookup(version_var);
    }

    Ok(source)
}
