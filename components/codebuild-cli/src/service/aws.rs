//! AWS implementation of [`BuildService`]: CodeBuild for builds, CloudWatch
//! Logs for build output and STS for the caller identity.
//!
//! Credentials and region come from the standard AWS SDK resolution chain
//! (environment variables, shared config/credentials files, SSO, instance
//! profile). When a role ARN is configured every client runs with the
//! credentials of that assumed role.

// Local crates
use crate::{
    models::build::{BuildHandle, BuildRequest, BuildStatus, LogCursor, LogDestination, LogPage},
    runtime::errors::RunnerError,
    service::{BuildService, ServiceContext},
};

// External crates
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig, sts::AssumeRoleProvider};
use aws_sdk_cloudwatchlogs::Client as LogsClient;
use aws_sdk_codebuild::{
    Client as CodeBuildClient,
    error::DisplayErrorContext,
    types::{ComputeType, EnvironmentVariable, EnvironmentVariableType, SourceType},
};
use aws_sdk_sts::Client as StsClient;
use tracing::instrument;

const ASSUMED_ROLE_SESSION_NAME: &str = "codebuild-cli";

/// Load the shared SDK configuration, swapping in assumed-role credentials
/// when `role_arn` is set.
#[instrument(
    name = "codebuild_aws::load_sdk_config",
    target = "service::aws",
    level = "debug",
    skip_all
)]
pub async fn load_sdk_config(role_arn: Option<&str>) -> SdkConfig {
    let base = aws_config::defaults(BehaviorVersion::latest()).load().await;

    let Some(role_arn) = role_arn else {
        return base;
    };

    tracing::debug!(role_arn, "Assuming role for all AWS clients");
    let provider = AssumeRoleProvider::builder(role_arn)
        .session_name(ASSUMED_ROLE_SESSION_NAME)
        .configure(&base)
        .build()
        .await;

    aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(provider)
        .load()
        .await
}

/// Resolve the region and account the build will run in.
#[instrument(
    name = "codebuild_aws::resolve_context",
    target = "service::aws",
    level = "debug",
    skip_all
)]
pub async fn resolve_context(config: &SdkConfig) -> Result<ServiceContext, RunnerError> {
    let region = config.region().map(|r| r.as_ref().to_string()).ok_or_else(|| {
        RunnerError::backend(
            "CurrentRegion",
            "no AWS region configured, set AWS_REGION or a region in your AWS profile",
        )
    })?;

    let identity = StsClient::new(config)
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| RunnerError::backend("GetCallerIdentity", DisplayErrorContext(&e).to_string()))?;

    let account_id = identity
        .account()
        .ok_or_else(|| RunnerError::backend("GetCallerIdentity", "response did not include an account id"))?
        .to_string();

    tracing::debug!(%region, %account_id, "Resolved AWS service context");
    Ok(ServiceContext { region, account_id })
}

#[derive(Debug, Clone)]
pub struct AwsBuildService {
    codebuild: CodeBuildClient,
    logs: LogsClient,
}

impl AwsBuildService {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            codebuild: CodeBuildClient::new(config),
            logs: LogsClient::new(config),
        }
    }
}

#[async_trait]
impl BuildService for AwsBuildService {
    #[instrument(
        name = "codebuild_aws::start_build",
        target = "service::aws",
        level = "debug",
        skip_all,
        fields(project = %request.project_name)
    )]
    async fn start_build(&self, request: &BuildRequest) -> Result<BuildHandle, RunnerError> {
        tracing::debug!(payload = %request.payload(), "Submitting StartBuild request");

        let mut call = self
            .codebuild
            .start_build()
            .project_name(&request.project_name)
            .set_compute_type_override(request.compute_type_override.as_deref().map(ComputeType::from))
            .set_service_role_override(request.service_role_override.clone())
            .set_source_type_override(request.source_type_override.as_deref().map(SourceType::from))
            .set_source_location_override(request.source_location_override.clone())
            .set_source_version(request.source_version.clone());

        for (name, value) in &request.environment_variables_override {
            let variable = EnvironmentVariable::builder()
                .name(name)
                .value(value)
                .r#type(EnvironmentVariableType::Plaintext)
                .build()
                .map_err(|e| RunnerError::backend("StartBuild", e.to_string()))?;
            call = call.environment_variables_override(variable);
        }

        let output = call
            .send()
            .await
            .map_err(|e| RunnerError::backend("StartBuild", DisplayErrorContext(&e).to_string()))?;

        let id = output
            .build_value()
            .and_then(|build| build.id())
            .ok_or_else(|| RunnerError::backend("StartBuild", "response did not include a build id"))?;

        Ok(BuildHandle::new(id))
    }

    #[instrument(
        name = "codebuild_aws::build_status",
        target = "service::aws",
        level = "trace",
        skip_all,
        fields(build_id = %build)
    )]
    async fn build_status(&self, build: &BuildHandle) -> Result<BuildStatus, RunnerError> {
        let output = self
            .codebuild
            .batch_get_builds()
            .ids(build.as_str())
            .send()
            .await
            .map_err(|e| RunnerError::backend("BatchGetBuilds", DisplayErrorContext(&e).to_string()))?;

        let snapshot = output
            .builds()
            .first()
            .ok_or_else(|| RunnerError::backend("BatchGetBuilds", format!("build {build} was not found")))?;

        Ok(BuildStatus::from(snapshot))
    }

    #[instrument(
        name = "codebuild_aws::log_page",
        target = "service::aws",
        level = "trace",
        skip_all,
        fields(destination = %destination)
    )]
    async fn log_page(
        &self,
        destination: &LogDestination,
        cursor: Option<&LogCursor>,
    ) -> Result<LogPage, RunnerError> {
        let output = self
            .logs
            .get_log_events()
            .log_group_name(&destination.group)
            .log_stream_name(&destination.stream)
            .start_from_head(true)
            .set_next_token(cursor.map(|c| c.as_str().to_string()))
            .send()
            .await
            .map_err(|e| RunnerError::backend("GetLogEvents", DisplayErrorContext(&e).to_string()))?;

        Ok(LogPage::from(output))
    }
}
