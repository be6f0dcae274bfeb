//! Per-operation waiter configuration
//!
//! A [`StateSpec`] is built fresh for every create, update or delete, handed
//! to [`wait()`](crate::wait()) and consumed by it.

use crate::error::SpecError;
use crate::poll::Poller;
use crate::timing::{Cadence, Timing};
use std::collections::HashSet;
use std::time::Duration;

/// Pending and target states, the poller, and timing for one wait.
///
/// # Example
/// ```ignore
/// let spec = StateSpec::new("route aggregation ra-1", poller)
///     .pending([RouteAggregationState::Provisioning])
///     .target([RouteAggregationState::Provisioned])
///     .timing(Timing::from_cadence(Cadence::SLOW, timeout));
/// let route_aggregation = wait(spec).await?;
/// ```
pub struct StateSpec<P: Poller> {
    pub(crate) resource: String,
    pub(crate) pending: HashSet<P::Label>,
    pub(crate) target: HashSet<P::Label>,
    pub(crate) poller: P,
    pub(crate) timing: Timing,
}

impl<P: Poller> StateSpec<P> {
    /// Create a spec with empty state sets and the standard cadence.
    ///
    /// `resource` is only used to label log lines.
    pub fn new(resource: impl Into<String>, poller: P) -> Self {
        Self {
            resource: resource.into(),
            pending: HashSet::new(),
            target: HashSet::new(),
            poller,
            timing: Timing::from_cadence(
                Cadence::STANDARD,
                Duration::from_secs(crate::defaults::DEFAULT_OPERATION_TIMEOUT_SECS),
            ),
        }
    }

    /// Add states that mean "still in progress"
    pub fn pending(mut self, states: impl IntoIterator<Item = P::Label>) -> Self {
        self.pending.extend(states);
        self
    }

    /// Add states that mean "successfully converged"
    pub fn target(mut self, states: impl IntoIterator<Item = P::Label>) -> Self {
        self.target.extend(states);
        self
    }

    /// Replace all timing parameters
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Set the interval; the initial delay follows it unless set afterwards
    pub fn interval(mut self, interval: Duration) -> Self {
        self.timing.interval = interval;
        self.timing.initial_delay = interval;
        self
    }

    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.timing.min_interval = min_interval;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.timing.deadline = deadline;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.timing.initial_delay = delay;
        self
    }

    /// Require `n` consecutive target observations before converging
    pub fn target_occurrences(mut self, n: u32) -> Self {
        self.timing.target_occurrences = n;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn pending_states(&self) -> &HashSet<P::Label> {
        &self.pending
    }

    pub fn target_states(&self) -> &HashSet<P::Label> {
        &self.target
    }

    pub fn timing_params(&self) -> &Timing {
        &self.timing
    }

    /// Check state sets and timing without polling.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.target.is_empty() {
            return Err(SpecError::EmptyTarget);
        }
        if let Some(label) = self.pending.intersection(&self.target).next() {
            return Err(SpecError::OverlappingStates {
                label: label.to_string(),
            });
        }
        if self.timing.min_interval > self.timing.interval {
            return Err(SpecError::IntervalBelowMinimum {
                interval: self.timing.interval,
                min_interval: self.timing.min_interval,
            });
        }
        if self.timing.deadline.is_zero() {
            return Err(SpecError::ZeroDeadline);
        }
        if self.timing.target_occurrences == 0 {
            return Err(SpecError::ZeroTargetOccurrences);
        }
        Ok(())
    }
}

impl<P: Poller> std::fmt::Debug for StateSpec<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSpec")
            .field("resource", &self.resource)
            .field("pending", &self.pending)
            .field("target", &self.target)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
