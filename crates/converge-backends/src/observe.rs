//! Glue between typed API reads and the waiter
//!
//! Backend API traits return typed snapshots. These helpers turn a read into
//! a [`Poller`] (create/update) or a [`RawPoll`] (delete, to be wrapped by a
//! [`DeletedSentinel`](converge_core::DeletedSentinel)), using a function
//! that picks the lifecycle label out of the snapshot.

use converge_core::{ApiError, PollResult, Poller, RawPoll, StateLabel};
use std::future::Future;
use tracing::debug;

/// Poller that reads with `fetch` and labels snapshots with `state_of`.
pub fn observe<S, L, F, Fut>(
    state_of: fn(&S) -> L,
    mut fetch: F,
) -> impl Poller<Label = L, Snapshot = S>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<S, ApiError>> + Send,
    S: Send,
    L: StateLabel,
{
    move || {
        let read = fetch();
        async move {
            match read.await {
                Ok(snapshot) => PollResult::observed(state_of(&snapshot), snapshot),
                Err(err) => {
                    debug!(status = ?err.status, error = %err, "resource read failed");
                    PollResult::failed(err)
                }
            }
        }
    }
}

/// Raw read for delete waiters; errors are left for the classifier.
pub fn observe_raw<S, L, F, Fut>(
    state_of: fn(&S) -> L,
    mut fetch: F,
) -> impl RawPoll<Label = L, Snapshot = S, Error = ApiError>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<S, ApiError>> + Send,
    S: Send,
    L: StateLabel,
{
    move || {
        let read = fetch();
        async move { read.await.map(|snapshot| (state_of(&snapshot), snapshot)) }
    }
}

/// Add lenient label parsing helpers to lifecycle enums.
///
/// Each enum must derive `strum::EnumString` and carry a
/// `#[strum(default)] Unrecognized(String)` variant.
macro_rules! lifecycle_labels {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                /// Parse a wire label; unknown labels become `Unrecognized`
                pub fn from_label(label: &str) -> Self {
                    label
                        .parse()
                        .unwrap_or_else(|_| Self::Unrecognized(label.to_string()))
                }

                /// Check if the API reported a label this crate does not know
                pub fn is_unrecognized(&self) -> bool {
                    matches!(self, Self::Unrecognized(_))
                }
            }
        )+
    };
}

pub(crate) use lifecycle_labels;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
    #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
    enum WidgetState {
        Ready,
        #[strum(default)]
        Unrecognized(String),
    }

    lifecycle_labels!(WidgetState);

    #[test]
    fn test_from_label_keeps_unknown_labels() {
        assert_eq!(WidgetState::from_label("READY"), WidgetState::Ready);
        let odd = WidgetState::from_label("REDY");
        assert!(odd.is_unrecognized());
        assert_eq!(odd, WidgetState::Unrecognized("REDY".to_string()));
        assert!(!WidgetState::Ready.is_unrecognized());
    }

    #[derive(Debug)]
    struct Widget {
        state: &'static str,
    }

    #[tokio::test]
    async fn test_observe_labels_snapshot() {
        let mut poller = observe(
            |w: &Widget| w.state,
            || async { Ok::<_, ApiError>(Widget { state: "READY" }) },
        );
        let result = poller.poll().await;
        assert_eq!(result.state(), Some(&"READY"));
    }

    #[tokio::test]
    async fn test_observe_wraps_errors() {
        let mut poller = observe(
            |w: &Widget| w.state,
            || async { Err(ApiError::http(500, "boom")) },
        );
        assert!(poller.poll().await.is_failed());
    }

    #[tokio::test]
    async fn test_observe_raw_keeps_errors() {
        let mut raw = observe_raw(
            |w: &Widget| w.state,
            || async { Err::<Widget, _>(ApiError::http(404, "gone")) },
        );
        let err = raw.fetch().await.unwrap_err();
        assert_eq!(err.status, Some(404));
    }
}
