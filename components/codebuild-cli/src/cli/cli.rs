// Local crates
use crate::{
    helpers::{
        load_config::{PartialConfig, RunConfig, parse_env_assignment},
        shutdown::listen_for_shutdown,
    },
    instrumentation,
    runtime::runtime::run_build,
    service::aws::{AwsBuildService, load_sdk_config, resolve_context},
};

// External crates
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(
    name = "codebuild",
    about = "Start an AWS CodeBuild build, optionally following its logs and waiting for the result",
    version,
    term_width = 100,
    after_help = "\
Every flag except --env falls back to an environment variable of the same name,
upper-cased with dashes replaced by underscores (e.g. --source-version -> SOURCE_VERSION),
when it is not given on the command line.

EXAMPLES:
    codebuild my-project
    codebuild --follow -e STAGE=prod -e REGION=eu-west-1 my-project
    SOURCE_TYPE=BITBUCKET codebuild --wait my-project"
)]
struct Cli {
    /// The name of the CodeBuild project
    project: String,

    /// Environment variable override (repeatable, e.g. -e NAME=value -e OTHER=value)
    #[arg(short, long = "env", value_name = "NAME=VALUE", value_parser = parse_env_assignment, action = ArgAction::Append)]
    env: Vec<(String, String)>,

    /// Compute type override (e.g. BUILD_GENERAL1_LARGE)
    #[arg(long)]
    compute_type: Option<String>,

    /// Service role override
    #[arg(long)]
    service_role: Option<String>,

    /// Role to assume for all AWS calls
    #[arg(long)]
    role_arn: Option<String>,

    /// Source type override; BITBUCKET also fills location/version from Bitbucket Pipelines
    #[arg(long)]
    source_type: Option<String>,

    /// Source location override
    #[arg(long)]
    source_location: Option<String>,

    /// Source version override (branch, tag or commit)
    #[arg(long)]
    source_version: Option<String>,

    /// Follow the build logs from CloudWatch (implies --wait)
    #[arg(short, long)]
    follow: bool,

    /// Wait for the build to complete
    #[arg(short, long)]
    wait: bool,

    /// Increase diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl From<Cli> for PartialConfig {
    fn from(cli: Cli) -> Self {
        Self {
            project: cli.project,
            env_vars: cli.env,
            compute_type: cli.compute_type,
            service_role: cli.service_role,
            role_arn: cli.role_arn,
            source_type: cli.source_type,
            source_location: cli.source_location,
            source_version: cli.source_version,
            follow: cli.follow,
            wait: cli.wait,
            verbose: cli.verbose,
        }
    }
}

/// Entry function for CLI
pub async fn run() -> Result<()> {
    // Usage errors from clap exit here with status 2
    let cli = Cli::parse();

    let config = RunConfig::resolve(cli.into(), |name| std::env::var(name).ok())?;

    let _tracing_guard = instrumentation::tracing::init_tracing(config.verbose);
    instrumentation::tracing::init_panic_handler();
    tracing::debug!(
        project = %config.request.project_name,
        follow = config.follow,
        wait = config.wait,
        assume_role = config.role_arn.is_some(),
        "Run configuration resolved"
    );

    let sdk_config = load_sdk_config(config.role_arn.as_deref()).await;
    let context = resolve_context(&sdk_config)
        .await
        .context("Failed to resolve AWS account details")?;
    let service = Arc::new(AwsBuildService::new(&sdk_config));

    let cancel = CancellationToken::new();
    let listener = listen_for_shutdown(cancel.clone());

    let result = run_build(service, &context, &config, tokio::io::stdout(), &cancel).await;

    cancel.cancel();
    if let Err(e) = listener.await {
        tracing::debug!(error = %e, "Shutdown listener did not exit cleanly");
    }

    result.map_err(Into::into)
}
