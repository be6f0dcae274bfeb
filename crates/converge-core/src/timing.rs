//! Timing parameters and per-operation timeouts
//!
//! A [`Timing`] is what one waiter runs with. It is usually derived from a
//! [`Cadence`] preset (how often a backend tolerates being polled) and an
//! operation budget taken from [`OperationTimeouts`].

use crate::defaults::{
    SLOW_INTERVAL, STANDARD_INTERVAL, STANDARD_MIN_INTERVAL, default_operation_timeout,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timing parameters for a single wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Grace period before the first poll
    pub initial_delay: Duration,
    /// Delay between poll attempts
    pub interval: Duration,
    /// Floor for the delay between poll attempts
    pub min_interval: Duration,
    /// Overall budget, measured from the start of the wait
    pub deadline: Duration,
    /// Consecutive target observations required before converging
    pub target_occurrences: u32,
}

impl Timing {
    /// Create timing with the initial delay equal to `interval`.
    pub fn new(interval: Duration, min_interval: Duration, deadline: Duration) -> Self {
        Self {
            initial_delay: interval,
            interval,
            min_interval,
            deadline,
            target_occurrences: 1,
        }
    }

    /// Timing for `cadence` bounded by `deadline`.
    pub fn from_cadence(cadence: Cadence, deadline: Duration) -> Self {
        Self {
            initial_delay: cadence.initial_delay.unwrap_or(cadence.interval),
            interval: cadence.interval,
            min_interval: cadence.min_interval,
            deadline,
            target_occurrences: 1,
        }
    }

    /// Delay between two poll attempts: `max(interval, min_interval)`
    pub fn step(&self) -> Duration {
        self.interval.max(self.min_interval)
    }
}

/// How often a backend is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// Grace period before the first poll (`None` = one interval)
    pub initial_delay: Option<Duration>,
    pub interval: Duration,
    pub min_interval: Duration,
}

impl Cadence {
    /// 10s interval, 5s floor; used by most fabric and metal waiters
    pub const STANDARD: Cadence = Cadence {
        initial_delay: None,
        interval: STANDARD_INTERVAL,
        min_interval: STANDARD_MIN_INTERVAL,
    };

    /// 30s interval and floor; routing resources that take minutes to provision
    pub const SLOW: Cadence = Cadence {
        initial_delay: None,
        interval: SLOW_INTERVAL,
        min_interval: SLOW_INTERVAL,
    };

    /// Poll right away, then every `interval`
    pub const fn immediate(interval: Duration) -> Cadence {
        Cadence {
            initial_delay: Some(Duration::ZERO),
            interval,
            min_interval: interval,
        }
    }
}

/// A mutating (or reading) resource operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Read,
}

/// User-configurable per-operation timeouts, in seconds.
///
/// Missing fields fall back to 10 minutes. Validation is done via
/// `garde::Validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct OperationTimeouts {
    #[serde(default = "default_operation_timeout")]
    #[garde(range(min = 1))]
    pub create: u64,

    #[serde(default = "default_operation_timeout")]
    #[garde(range(min = 1))]
    pub update: u64,

    #[serde(default = "default_operation_timeout")]
    #[garde(range(min = 1))]
    pub delete: u64,

    #[serde(default = "default_operation_timeout")]
    #[garde(range(min = 1))]
    pub read: u64,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self::uniform(default_operation_timeout())
    }
}

impl OperationTimeouts {
    /// Same timeout for every operation
    pub fn uniform(secs: u64) -> Self {
        Self {
            create: secs,
            update: secs,
            delete: secs,
            read: secs,
        }
    }

    /// Load and validate timeouts from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Parse and validate timeouts from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let timeouts: Self = serde_json::from_str(json)?;
        garde::Validate::validate(&timeouts)?;
        Ok(timeouts)
    }

    /// Budget for `operation`
    pub fn budget(&self, operation: Operation) -> Duration {
        let secs = match operation {
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
            Operation::Read => self.read,
        };
        Duration::from_secs(secs)
    }

    /// Budget for `operation` minus `margin` (see [`reserve_margin`])
    pub fn budget_with_margin(&self, operation: Operation, margin: Duration) -> Duration {
        reserve_margin(self.budget(operation), margin)
    }
}

/// Hold `margin` back from `budget`.
///
/// If the margin would consume the whole budget the full budget is returned,
/// so a deadline never collapses to zero.
pub fn reserve_margin(budget: Duration, margin: Duration) -> Duration {
    match budget.checked_sub(margin) {
        Some(remaining) if !remaining.is_zero() => remaining,
        _ => budget,
    }
}
