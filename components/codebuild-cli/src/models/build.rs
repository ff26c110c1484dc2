// External crates
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single build submission. Every override is optional; empty strings are
/// normalised to `None` so they are never sent to the build service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub project_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_type_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_role_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_location_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment_variables_override: BTreeMap<String, String>,
}

impl BuildRequest {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            compute_type_override: None,
            service_role_override: None,
            source_type_override: None,
            source_location_override: None,
            source_version: None,
            environment_variables_override: BTreeMap::new(),
        }
    }

    pub fn compute_type(mut self, value: Option<String>) -> Self {
        self.compute_type_override = non_empty(value);
        self
    }

    pub fn service_role(mut self, value: Option<String>) -> Self {
        self.service_role_override = non_empty(value);
        self
    }

    pub fn source(mut self, source: SourceOverride) -> Self {
        self.source_type_override = non_empty(source.source_type);
        self.source_location_override = non_empty(source.location);
        self.source_version = non_empty(source.version);
        self
    }

    /// Later entries win over earlier ones with the same name.
    pub fn environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in vars {
            self.environment_variables_override
                .insert(name.into(), value.into());
        }
        self
    }

    /// JSON rendering of exactly what gets submitted, used for diagnostics.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Source type/location/version triple, each independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOverride {
    pub source_type: Option<String>,
    pub location: Option<String>,
    pub version: Option<String>,
}

/// Opaque identifier returned by a build submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildHandle(String);

impl BuildHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome code reported by the build service. Unknown codes are kept
/// verbatim so they can be surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded,
    Failed,
    Fault,
    TimedOut,
    InProgress,
    Stopped,
    Other(String),
}

impl BuildOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Fault => "FAULT",
            Self::TimedOut => "TIMED_OUT",
            Self::InProgress => "IN_PROGRESS",
            Self::Stopped => "STOPPED",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for BuildOutcome {
    fn from(code: &str) -> Self {
        match code {
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "FAULT" => Self::Fault,
            "TIMED_OUT" => Self::TimedOut,
            "IN_PROGRESS" => Self::InProgress,
            "STOPPED" => Self::Stopped,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a build's log records are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDestination {
    pub group: String,
    pub stream: String,
}

impl fmt::Display for LogDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.stream)
    }
}

/// One independent snapshot of a build, never a diff against a previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStatus {
    pub complete: bool,
    pub outcome: BuildOutcome,
    pub log_group: Option<String>,
    pub log_stream: Option<String>,
}

impl BuildStatus {
    /// Both halves of the destination, or nothing.
    pub fn log_destination(&self) -> Option<LogDestination> {
        match (&self.log_group, &self.log_stream) {
            (Some(group), Some(stream)) if !group.is_empty() && !stream.is_empty() => {
                Some(LogDestination {
                    group: group.clone(),
                    stream: stream.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Forward-only read position in a log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCursor(String);

impl LogCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A page of log records in arrival order, plus the token to continue from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPage {
    pub records: Vec<String>,
    pub next_cursor: Option<LogCursor>,
}
