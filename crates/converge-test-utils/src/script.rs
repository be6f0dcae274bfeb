//! Scripted pollers and API reads
//!
//! Each script is replayed in order and its last step repeats forever, so
//! "always pending" is a one-step script.

use converge_core::{ApiError, PollResult, Poller, RawPoll, StateLabel};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// One scripted poll outcome
#[derive(Debug, Clone)]
pub enum Step<L, S> {
    /// Report `state` with `snapshot`
    State(L, S),
    /// Fail the poll attempt with this message
    Fail(String),
}

/// Records when polls happen and whether any two ever overlapped.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Instant>>>,
    in_flight: Arc<AtomicBool>,
    overlapped: Arc<AtomicBool>,
}

impl CallLog {
    fn enter(&self) -> CallGuard {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(Instant::now());
        CallGuard { log: self.clone() }
    }

    /// Number of polls started so far
    pub fn count(&self) -> u32 {
        self.calls.lock().expect("call log poisoned").len() as u32
    }

    /// Start instants of every poll, in order
    pub fn instants(&self) -> Vec<Instant> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// Check if a poll ever started while another was still running
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

struct CallGuard {
    log: CallLog,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.log.in_flight.store(false, Ordering::SeqCst);
    }
}

fn next_from<T: Clone>(queue: &mut VecDeque<T>) -> T {
    if queue.len() > 1 {
        queue.pop_front().expect("queue has more than one item")
    } else {
        queue.front().cloned().expect("script must not be empty")
    }
}

/// A [`Poller`] that replays a script of [`Step`]s.
pub struct ScriptedPoller<L, S> {
    steps: VecDeque<Step<L, S>>,
    latency: Duration,
    log: CallLog,
}

impl<L: StateLabel, S: Clone + Send + 'static> ScriptedPoller<L, S> {
    /// Replay `steps`; panics on an empty script
    pub fn new(steps: impl IntoIterator<Item = Step<L, S>>) -> Self {
        let steps: VecDeque<_> = steps.into_iter().collect();
        assert!(!steps.is_empty(), "script must not be empty");
        Self {
            steps,
            latency: Duration::ZERO,
            log: CallLog::default(),
        }
    }

    /// Simulate a slow backend: every poll takes `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Handle for inspecting calls after the poller was moved into a spec
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl<L: StateLabel> ScriptedPoller<L, u32> {
    /// Replay `states`; each snapshot is the 1-based script position
    pub fn from_states(states: impl IntoIterator<Item = L>) -> Self {
        Self::new(
            states
                .into_iter()
                .enumerate()
                .map(|(i, state)| Step::State(state, i as u32 + 1)),
        )
    }
}

impl<L: StateLabel, S: Clone + Send + 'static> Poller for ScriptedPoller<L, S> {
    type Label = L;
    type Snapshot = S;

    async fn poll(&mut self) -> PollResult<L, S> {
        let _guard = self.log.enter();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match next_from(&mut self.steps) {
            Step::State(state, snapshot) => PollResult::observed(state, snapshot),
            Step::Fail(message) => PollResult::failed(anyhow::anyhow!(message)),
        }
    }
}

/// A [`RawPoll`] that replays scripted API answers.
pub struct ScriptedApi<L, S> {
    answers: VecDeque<Result<(L, S), ApiError>>,
    log: CallLog,
}

impl<L: StateLabel, S: Clone + Send + 'static> ScriptedApi<L, S> {
    /// Replay `answers`; panics on an empty script
    pub fn new(answers: impl IntoIterator<Item = Result<(L, S), ApiError>>) -> Self {
        let answers: VecDeque<_> = answers.into_iter().collect();
        assert!(!answers.is_empty(), "script must not be empty");
        Self {
            answers,
            log: CallLog::default(),
        }
    }

    /// An endpoint that always answers with `error`
    pub fn always(error: ApiError) -> Self {
        Self::new([Err(error)])
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl<L: StateLabel, S: Clone + Send + 'static> RawPoll for ScriptedApi<L, S> {
    type Label = L;
    type Snapshot = S;
    type Error = ApiError;

    async fn fetch(&mut self) -> Result<(L, S), ApiError> {
        let _guard = self.log.enter();
        next_from(&mut self.answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_step_repeats() {
        let mut poller = ScriptedPoller::from_states(["A", "B"]);
        let log = poller.log();

        assert_eq!(poller.poll().await.state(), Some(&"A"));
        assert_eq!(poller.poll().await.state(), Some(&"B"));
        assert_eq!(poller.poll().await.state(), Some(&"B"));
        assert_eq!(log.count(), 3);
        assert!(!log.overlapped());
    }

    #[tokio::test]
    async fn test_fail_step() {
        let mut poller: ScriptedPoller<&str, ()> =
            ScriptedPoller::new([Step::Fail("connection reset".to_string())]);
        assert!(poller.poll().await.is_failed());
    }

    #[tokio::test]
    async fn test_scripted_api() {
        let mut api: ScriptedApi<&str, ()> = ScriptedApi::always(ApiError::http(404, "gone"));
        let err = api.fetch().await.unwrap_err();
        assert_eq!(err.status, Some(404));
        assert_eq!(api.log().count(), 1);
    }
}
