//! Scenario files

use anyhow::{Context, Result};
use converge_core::{ApiError, DeletedSentinel, Poller, StateSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One scripted backend answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// The read succeeds and reports this lifecycle label
    State(String),
    /// The read fails with this HTTP status
    Status(u16),
    /// The read fails with HTTP 400 carrying this domain error code
    Code(String),
    /// The read fails before reaching the backend
    Error(String),
}

impl ScriptStep {
    /// Read result for this step; `position` is the 1-based step number.
    pub fn reply(&self, position: u32) -> Result<(String, u32), ApiError> {
        match self {
            Self::State(label) => Ok((label.clone(), position)),
            Self::Status(status) => Err(ApiError::http(*status, "scripted HTTP failure")),
            Self::Code(code) => {
                Err(ApiError::http(400, "scripted domain error").with_code(code.clone()))
            }
            Self::Error(message) => Err(ApiError::transport(message.clone())),
        }
    }
}

/// Which failed reads count as "already deleted"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct DeletedPolicy {
    /// Label reported when a read means the resource is gone
    #[garde(length(min = 1))]
    pub marker: String,

    /// HTTP statuses meaning "gone"
    #[serde(default = "default_deleted_statuses")]
    #[garde(skip)]
    pub statuses: Vec<u16>,

    /// Domain error codes meaning "gone"
    #[serde(default)]
    #[garde(skip)]
    pub codes: Vec<String>,
}

fn default_deleted_statuses() -> Vec<u16> {
    vec![403, 404]
}

impl DeletedPolicy {
    pub fn sentinel(&self) -> DeletedSentinel<String> {
        DeletedSentinel::new(self.marker.clone())
            .with_statuses(self.statuses.iter().copied())
            .with_codes(self.codes.iter().cloned())
    }
}

/// A waiter configuration plus a scripted backend
///
/// Validation is done via `garde::Validate`; state-set consistency is left
/// to the waiter so it can be reported as an outcome.
#[derive(Debug, Clone, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name used in logs
    #[serde(default = "default_resource")]
    #[garde(length(min = 1))]
    pub resource: String,

    #[serde(default)]
    #[garde(skip)]
    pub pending: Vec<String>,

    #[garde(skip)]
    pub target: Vec<String>,

    #[serde(default = "default_interval_secs")]
    #[garde(skip)]
    pub interval_secs: u64,

    #[serde(default = "default_min_interval_secs")]
    #[garde(skip)]
    pub min_interval_secs: u64,

    #[serde(default = "converge_core::defaults::default_operation_timeout")]
    #[garde(skip)]
    pub deadline_secs: u64,

    /// Defaults to one interval
    #[serde(default)]
    #[garde(skip)]
    pub initial_delay_secs: Option<u64>,

    #[serde(default = "default_target_occurrences")]
    #[garde(skip)]
    pub target_occurrences: u32,

    /// Backend answers in order; the last one repeats
    #[garde(length(min = 1))]
    pub steps: Vec<ScriptStep>,

    /// Present for delete waiters
    #[serde(default)]
    #[garde(dive)]
    pub deleted: Option<DeletedPolicy>,
}

fn default_resource() -> String {
    "simulated resource".to_string()
}

fn default_interval_secs() -> u64 {
    converge_core::defaults::STANDARD_INTERVAL.as_secs()
}

fn default_min_interval_secs() -> u64 {
    converge_core::defaults::STANDARD_MIN_INTERVAL.as_secs()
}

fn default_target_occurrences() -> u32 {
    1
}

impl Scenario {
    /// Load and validate a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file '{}'", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid scenario file '{}'", path.display()))
    }

    /// Parse and validate a scenario from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(json).context("Failed to parse scenario")?;
        garde::Validate::validate(&scenario).context("Scenario validation failed")?;
        Ok(scenario)
    }

    /// Apply the scenario's states and timing to a spec for `poller`.
    pub fn spec<P: Poller<Label = String>>(&self, poller: P) -> StateSpec<P> {
        let mut spec = StateSpec::new(self.resource.clone(), poller)
            .pending(self.pending.iter().cloned())
            .target(self.target.iter().cloned())
            .interval(Duration::from_secs(self.interval_secs))
            .min_interval(Duration::from_secs(self.min_interval_secs))
            .deadline(Duration::from_secs(self.deadline_secs))
            .target_occurrences(self.target_occurrences);
        if let Some(delay) = self.initial_delay_secs {
            spec = spec.initial_delay(Duration::from_secs(delay));
        }
        spec
    }
}
