//! The convergence state machine
//!
//! ```text
//! NotStarted -> Polling -> Converged
//!                       -> UnexpectedState
//!                       -> DeadlineExceeded
//!                       -> PollError
//! ```
//!
//! `Polling` is the only looping phase. Polls are strictly sequential, the
//! deadline is checked between polls (an in-flight poll always completes),
//! and poll errors are surfaced immediately rather than retried.

use crate::error::WaitError;
use crate::poll::{PollResult, Poller};
use crate::spec::StateSpec;
use backon::{BackoffBuilder, ConstantBuilder};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Phase of a single wait
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaitPhase {
    NotStarted,
    Polling,
    Converged,
    UnexpectedState,
    DeadlineExceeded,
    PollError,
}

impl WaitPhase {
    /// Check if the phase ends the wait
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NotStarted | Self::Polling)
    }
}

/// A successful wait, with the numbers behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converged<L, S> {
    /// The target state that was observed
    pub state: L,
    /// Snapshot returned by the converging poll
    pub snapshot: S,
    /// Number of poll attempts, including the converging one
    pub attempts: u32,
    /// Time from the start of the wait until convergence
    pub elapsed: Duration,
}

/// Wait for the resource described by `spec` to reach a target state.
///
/// Returns the snapshot from the poll that observed the target state.
pub async fn wait<P: Poller>(
    spec: StateSpec<P>,
) -> Result<P::Snapshot, WaitError<P::Label, P::Snapshot>> {
    wait_with_report(spec).await.map(|converged| converged.snapshot)
}

/// Like [`wait()`], but also reports the converged state, attempt count and
/// elapsed time.
pub async fn wait_with_report<P: Poller>(
    spec: StateSpec<P>,
) -> Result<Converged<P::Label, P::Snapshot>, WaitError<P::Label, P::Snapshot>> {
    spec.validate()?;

    let StateSpec {
        resource,
        pending,
        target,
        mut poller,
        timing,
    } = spec;

    let start = Instant::now();
    let step = timing.step();
    let mut delays = ConstantBuilder::default()
        .with_delay(step)
        .with_max_times(usize::MAX)
        .build();

    let mut attempts = 0u32;
    let mut streak = 0u32;
    let mut last: Option<(P::Label, P::Snapshot)> = None;

    debug!(
        resource = %resource,
        phase = %WaitPhase::NotStarted,
        initial_delay_ms = timing.initial_delay.as_millis(),
        deadline_ms = timing.deadline.as_millis(),
        "Waiting for resource to converge"
    );
    sleep(timing.initial_delay).await;

    loop {
        let elapsed = start.elapsed();
        if elapsed >= timing.deadline {
            let (last_state, snapshot) = last.unzip();
            warn!(
                resource = %resource,
                phase = %WaitPhase::DeadlineExceeded,
                attempts,
                elapsed_ms = elapsed.as_millis(),
                last_state = ?last_state,
                "Resource did not converge before the deadline"
            );
            return Err(WaitError::DeadlineExceeded {
                last_state,
                snapshot,
                attempts,
                deadline: timing.deadline,
                elapsed,
            });
        }

        attempts += 1;
        match poller.poll().await {
            PollResult::Failed(source) => {
                warn!(
                    resource = %resource,
                    phase = %WaitPhase::PollError,
                    attempt = attempts,
                    error = ?source,
                    "Poll attempt failed"
                );
                return Err(WaitError::Poll { attempts, source });
            }
            PollResult::Observed { state, snapshot } => {
                if target.contains(&state) {
                    streak += 1;
                    if streak >= timing.target_occurrences {
                        let elapsed = start.elapsed();
                        info!(
                            resource = %resource,
                            phase = %WaitPhase::Converged,
                            state = %state,
                            attempts,
                            elapsed_ms = elapsed.as_millis(),
                            "Resource converged"
                        );
                        return Ok(Converged {
                            state,
                            snapshot,
                            attempts,
                            elapsed,
                        });
                    }
                    debug!(
                        resource = %resource,
                        state = %state,
                        streak,
                        required = timing.target_occurrences,
                        "Target observed, confirming"
                    );
                    last = Some((state, snapshot));
                } else if pending.contains(&state) {
                    streak = 0;
                    debug!(
                        resource = %resource,
                        phase = %WaitPhase::Polling,
                        attempt = attempts,
                        state = %state,
                        "Resource still pending"
                    );
                    last = Some((state, snapshot));
                } else {
                    warn!(
                        resource = %resource,
                        phase = %WaitPhase::UnexpectedState,
                        attempt = attempts,
                        state = %state,
                        "Resource reached an unexpected state"
                    );
                    return Err(WaitError::UnexpectedState {
                        state,
                        snapshot,
                        attempts,
                    });
                }
            }
        }

        let delay = delays.next().unwrap_or(step);
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Poller that replays `states`, repeating the last one forever.
    fn scripted(
        states: &[&'static str],
        calls: Arc<AtomicU32>,
    ) -> impl Poller<Label = &'static str, Snapshot = u32> {
        let mut queue: VecDeque<&'static str> = states.iter().copied().collect();
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let state = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                *queue.front().unwrap()
            };
            async move { PollResult::observed(state, n) }
        }
    }

    fn spec_for(
        states: &[&'static str],
        calls: Arc<AtomicU32>,
    ) -> StateSpec<impl Poller<Label = &'static str, Snapshot = u32>> {
        StateSpec::new("test-resource", scripted(states, calls))
            .pending(["PROVISIONING"])
            .target(["PROVISIONED"])
            .interval(Duration::from_secs(1))
            .min_interval(Duration::from_secs(1))
            .deadline(Duration::from_secs(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_converges_after_pending_states() {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = spec_for(&["PROVISIONING", "PROVISIONING", "PROVISIONED"], calls.clone());

        let converged = wait_with_report(spec).await.unwrap();
        assert_eq!(converged.state, "PROVISIONED");
        assert_eq!(converged.snapshot, 3);
        assert_eq!(converged.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(converged.elapsed >= Duration::from_secs(2));
        assert!(converged.elapsed < Duration::from_secs(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = spec_for(&["FAILED"], calls.clone());

        let err = wait(spec).await.unwrap_err();
        assert!(matches!(
            err,
            WaitError::UnexpectedState {
                state: "FAILED",
                snapshot: 1,
                attempts: 1
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_spec_never_polls() {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = StateSpec::new("test-resource", scripted(&["PROVISIONED"], calls.clone()))
            .pending(["PROVISIONING"]);

        let err = wait(spec).await.unwrap_err();
        assert!(matches!(err, WaitError::InvalidSpec(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_precedes_first_poll() {
        let start = Instant::now();
        let spec = StateSpec::new("test-resource", move || async move {
            PollResult::observed("PROVISIONED", start.elapsed())
        })
        .target(["PROVISIONED"])
        .interval(Duration::from_secs(10))
        .min_interval(Duration::from_secs(5));

        let first_poll_at = wait(spec).await.unwrap();
        assert!(first_poll_at >= Duration::from_secs(10));
        assert!(first_poll_at < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_occurrences_require_a_streak() {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = spec_for(
            &["PROVISIONED", "PROVISIONING", "PROVISIONED", "PROVISIONED"],
            calls.clone(),
        )
        .target_occurrences(2);

        let converged = wait_with_report(spec).await.unwrap();
        assert_eq!(converged.attempts, 4);
        assert_eq!(converged.snapshot, 4);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!WaitPhase::NotStarted.is_terminal());
        assert!(!WaitPhase::Polling.is_terminal());
        assert!(WaitPhase::Converged.is_terminal());
        assert!(WaitPhase::DeadlineExceeded.is_terminal());
        assert_eq!(WaitPhase::PollError.to_string(), "poll_error");
    }
}
