//! Waiter and configuration errors
//!
//! The waiter returns structured errors so callers can tell "the resource
//! failed" apart from "we ran out of time" and give different advice for each.

use crate::wait::WaitPhase;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// Invalid [`StateSpec`](crate::StateSpec) configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// No target states were configured
    #[error("target state set cannot be empty")]
    EmptyTarget,

    /// A label appears in both the pending and the target set
    #[error("state '{label}' is both pending and target")]
    OverlappingStates { label: String },

    /// The poll interval is shorter than the configured floor
    #[error("interval {interval:?} is below the minimum interval {min_interval:?}")]
    IntervalBelowMinimum {
        interval: Duration,
        min_interval: Duration,
    },

    /// The overall deadline is zero
    #[error("deadline must be greater than 0")]
    ZeroDeadline,

    /// Convergence would require zero target observations
    #[error("target_occurrences must be at least 1")]
    ZeroTargetOccurrences,
}

/// Terminal failure of a [`wait()`](crate::wait())
#[derive(Debug, Error)]
pub enum WaitError<L, S> {
    /// The waiter configuration was rejected before polling started
    #[error("invalid waiter configuration: {0}")]
    InvalidSpec(#[from] SpecError),

    /// A poll attempt failed; the waiter does not retry
    #[error("poll attempt {attempts} failed: {source}")]
    Poll {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The resource reached a state that is neither pending nor target
    #[error("unexpected state '{state}' after {attempts} poll attempt(s)")]
    UnexpectedState { state: L, snapshot: S, attempts: u32 },

    /// The resource never left the pending states within the deadline
    #[error(
        "timed out after {elapsed:?} (deadline {deadline:?}, {attempts} poll attempt(s)); last observed state: {}",
        describe_last(.last_state)
    )]
    DeadlineExceeded {
        last_state: Option<L>,
        snapshot: Option<S>,
        attempts: u32,
        deadline: Duration,
        elapsed: Duration,
    },
}

fn describe_last<L: Display>(state: &Option<L>) -> String {
    match state {
        Some(s) => format!("'{s}'"),
        None => "none".to_string(),
    }
}

impl<L, S> WaitError<L, S> {
    /// Check if the wait ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }

    /// Check if the resource itself reported a failure state
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::UnexpectedState { .. })
    }

    /// Phase the wait ended in; a rejected spec never left `NotStarted`
    pub fn phase(&self) -> WaitPhase {
        match self {
            Self::InvalidSpec(_) => WaitPhase::NotStarted,
            Self::Poll { .. } => WaitPhase::PollError,
            Self::UnexpectedState { .. } => WaitPhase::UnexpectedState,
            Self::DeadlineExceeded { .. } => WaitPhase::DeadlineExceeded,
        }
    }

    /// Number of poll attempts made before the wait ended
    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidSpec(_) => 0,
            Self::Poll { attempts, .. }
            | Self::UnexpectedState { attempts, .. }
            | Self::DeadlineExceeded { attempts, .. } => *attempts,
        }
    }

    /// The last state the waiter observed, if any
    pub fn observed_state(&self) -> Option<&L> {
        match self {
            Self::UnexpectedState { state, .. } => Some(state),
            Self::DeadlineExceeded { last_state, .. } => last_state.as_ref(),
            Self::InvalidSpec(_) | Self::Poll { .. } => None,
        }
    }

    /// Get a user-facing hint for resolving this error.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::InvalidSpec(_) => "This is a provider bug; the waiter was misconfigured.",
            Self::Poll { .. } => {
                "The resource could not be read. Check credentials and connectivity, then retry."
            }
            Self::UnexpectedState { .. } => {
                "The resource entered a failure state. Inspect it in the portal before retrying."
            }
            Self::DeadlineExceeded { .. } => {
                "The resource is still converging. Increase the operation timeout or re-run to pick up where it left off."
            }
        }
    }
}

/// Configuration file and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A timeout field is zero
    #[error("invalid timeouts: {0}")]
    Invalid(String),

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<garde::Report> for ConfigError {
    fn from(report: garde::Report) -> Self {
        Self::Invalid(report.to_string())
    }
}
