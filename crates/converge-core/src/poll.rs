//! Poll results and the poller abstraction
//!
//! A poller performs one observation of a remote resource. The waiter only
//! sees the lifecycle label and an opaque snapshot; what the snapshot looks
//! like is up to the caller.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;

/// Anything usable as a lifecycle state label.
///
/// Implemented for `String`, `&'static str` and the closed per-backend state
/// enums alike.
pub trait StateLabel: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static {}

impl<T> StateLabel for T where T: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static {}

/// Outcome of a single poll attempt.
///
/// Either a state was observed or the attempt itself failed, never both. A
/// resource classified as already deleted is an observation of the sentinel
/// state, not a failure.
#[derive(Debug)]
pub enum PollResult<L, S> {
    /// The resource was read and reported `state`
    Observed { state: L, snapshot: S },
    /// The poll attempt failed (transport error, unclassified API error)
    Failed(anyhow::Error),
}

impl<L, S> PollResult<L, S> {
    pub fn observed(state: L, snapshot: S) -> Self {
        Self::Observed { state, snapshot }
    }

    pub fn failed(error: impl Into<anyhow::Error>) -> Self {
        Self::Failed(error.into())
    }

    /// The observed state label, if the attempt succeeded
    pub fn state(&self) -> Option<&L> {
        match self {
            Self::Observed { state, .. } => Some(state),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A source of poll results for one waiter.
///
/// The waiter calls [`Poller::poll`] strictly sequentially; an implementation
/// never sees two outstanding calls from the same wait. Closures returning a
/// future of [`PollResult`] implement this trait directly.
pub trait Poller: Send {
    /// Lifecycle label type reported by this poller
    type Label: StateLabel;
    /// Remote object snapshot returned on success
    type Snapshot: Send;

    fn poll(&mut self) -> impl Future<Output = PollResult<Self::Label, Self::Snapshot>> + Send;
}

impl<F, Fut, L, S> Poller for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = PollResult<L, S>> + Send,
    L: StateLabel,
    S: Send,
{
    type Label = L;
    type Snapshot = S;

    fn poll(&mut self) -> impl Future<Output = PollResult<L, S>> + Send {
        self()
    }
}
