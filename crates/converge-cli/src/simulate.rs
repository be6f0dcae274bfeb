//! Replaying a scenario through the waiter

use crate::scenario::{Scenario, ScriptStep};
use converge_core::{ApiError, PollResult, Poller, StateSpec, WaitError, WaitPhase, wait_with_report};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// How a simulated wait ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub resource: String,
    pub phase: WaitPhase,
    /// Last state observed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// 1-based script step that produced `state`; absent for the deleted marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    pub attempts: u32,
    /// Simulated time from the start of the wait
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Outcome {
    pub fn converged(&self) -> bool {
        self.phase == WaitPhase::Converged
    }
}

/// Backend that answers reads from a script; the last step repeats.
struct ScriptedBackend {
    steps: Vec<ScriptStep>,
    position: usize,
}

impl ScriptedBackend {
    fn new(steps: &[ScriptStep]) -> Self {
        Self {
            steps: steps.to_vec(),
            position: 0,
        }
    }

    fn read(&mut self) -> Result<(String, u32), ApiError> {
        let index = self.position.min(self.steps.len().saturating_sub(1));
        self.position += 1;
        match self.steps.get(index) {
            Some(step) => step.reply(index as u32 + 1),
            None => Err(ApiError::transport("scenario has no steps")),
        }
    }
}

/// Run `scenario` to completion.
///
/// Sleeps inside the waiter follow the tokio clock, so on a paused runtime
/// the whole wait completes without real delays.
pub async fn run(scenario: &Scenario) -> Outcome {
    let mut backend = ScriptedBackend::new(&scenario.steps);

    match &scenario.deleted {
        Some(policy) => {
            let raw = move || {
                let reply = backend.read();
                async move { reply }
            };
            report(scenario.spec(policy.sentinel().classify(raw))).await
        }
        None => {
            let poller = move || {
                let reply = backend.read();
                async move {
                    match reply {
                        Ok((state, step)) => PollResult::observed(state, step),
                        Err(err) => PollResult::failed(err),
                    }
                }
            };
            report(scenario.spec(poller)).await
        }
    }
}

async fn report<P>(spec: StateSpec<P>) -> Outcome
where
    P: Poller<Label = String>,
    P::Snapshot: Into<Option<u32>>,
{
    let resource = spec.resource().to_string();
    let start = Instant::now();

    let outcome = match wait_with_report(spec).await {
        Ok(converged) => Outcome {
            resource,
            phase: WaitPhase::Converged,
            state: Some(converged.state),
            step: converged.snapshot.into(),
            attempts: converged.attempts,
            elapsed_ms: millis(converged.elapsed),
            error: None,
            remediation: None,
        },
        Err(err) => {
            let phase = err.phase();
            let attempts = err.attempts();
            let error = Some(format!("{err}"));
            let remediation = Some(err.remediation().to_string());
            let (state, step) = match err {
                WaitError::UnexpectedState {
                    state, snapshot, ..
                } => (Some(state), snapshot.into()),
                WaitError::DeadlineExceeded {
                    last_state,
                    snapshot,
                    ..
                } => (last_state, snapshot.and_then(Into::into)),
                WaitError::InvalidSpec(_) | WaitError::Poll { .. } => (None, None),
            };
            Outcome {
                resource,
                phase,
                state,
                step,
                attempts,
                elapsed_ms: millis(start.elapsed()),
                error,
                remediation,
            }
        }
    };

    info!(
        resource = %outcome.resource,
        phase = %outcome.phase,
        attempts = outcome.attempts,
        elapsed_ms = outcome.elapsed_ms,
        "Simulation finished"
    );
    outcome
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
