//! Deleted-sentinel classification for delete waiters
//!
//! Once a resource is really gone, most backends stop reporting a clean
//! "deleted" state and answer the read with 403/404 instead. Some embed a
//! domain error code in the body, sometimes while the resource still briefly
//! exists. [`DeletedSentinel`] maps those answers to a synthetic target state
//! so delete waiters can run the same state machine as create/update ones.
//!
//! There is no universal "already deleted" signal: every backend supplies its
//! own allow-list, and nothing is inferred beyond it.

use crate::poll::{PollResult, Poller, StateLabel};
use std::collections::BTreeSet;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// HTTP 403, returned by some APIs once the caller can no longer see a resource
pub const HTTP_FORBIDDEN: u16 = 403;

/// HTTP 404
pub const HTTP_NOT_FOUND: u16 = 404;

/// What a failed API call exposes to the classifier.
pub trait ApiFailure {
    /// HTTP status of the response, if one was received
    fn status(&self) -> Option<u16>;

    /// Machine-readable domain error codes from the response
    fn error_codes(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Raw response body, for APIs that only embed codes in free text
    fn body(&self) -> Option<&str> {
        None
    }
}

/// A failed call against a vendor REST API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.describe())]
pub struct ApiError {
    /// HTTP status code, `None` for transport failures
    pub status: Option<u16>,
    /// Domain error codes (e.g. `EQ-3044301`)
    pub codes: Vec<String>,
    /// Human-readable message
    pub message: String,
    /// Raw response body
    pub body: Option<String>,
}

impl ApiError {
    /// An HTTP error response
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            codes: Vec::new(),
            message: message.into(),
            body: None,
        }
    }

    /// A failure before any response was received
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            codes: Vec::new(),
            message: message.into(),
            body: None,
        }
    }

    /// Attach a domain error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.codes.push(code.into());
        self
    }

    /// Attach the raw response body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(status) = self.status {
            out.push_str(&format!("HTTP {status} "));
        }
        if !self.codes.is_empty() {
            out.push_str(&format!("[{}] ", self.codes.join(", ")));
        }
        out.push_str(&self.message);
        out
    }
}

impl ApiFailure for ApiError {
    fn status(&self) -> Option<u16> {
        self.status
    }

    fn error_codes(&self) -> Vec<&str> {
        self.codes.iter().map(String::as_str).collect()
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Why an error was classified as "already deleted"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelMatch {
    /// The HTTP status is on the allow-list
    Status(u16),
    /// A structured error code is on the allow-list
    Code(String),
    /// The raw body mentions an allowed error code
    BodyCode(String),
}

/// Per-backend policy mapping "already deleted" answers to a sentinel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedSentinel<L> {
    marker: L,
    statuses: BTreeSet<u16>,
    codes: Vec<String>,
}

impl<L: StateLabel> DeletedSentinel<L> {
    /// Sentinel reporting `marker`, matching HTTP 403 and 404.
    pub fn new(marker: L) -> Self {
        Self {
            marker,
            statuses: BTreeSet::from([HTTP_FORBIDDEN, HTTP_NOT_FOUND]),
            codes: Vec::new(),
        }
    }

    /// Also treat `status` as "already deleted"
    pub fn with_status(mut self, status: u16) -> Self {
        self.statuses.insert(status);
        self
    }

    /// Only treat the given statuses as "already deleted"
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Treat domain error `code` as "already deleted"
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.codes.push(code.into());
        self
    }

    pub fn with_codes<I, C>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.codes.extend(codes.into_iter().map(Into::into));
        self
    }

    /// The synthetic state reported for deleted resources
    pub fn marker(&self) -> &L {
        &self.marker
    }

    /// Decide whether `error` means the resource is already gone.
    pub fn matches<E: ApiFailure + ?Sized>(&self, error: &E) -> Option<SentinelMatch> {
        if let Some(status) = error.status() {
            if self.statuses.contains(&status) {
                return Some(SentinelMatch::Status(status));
            }
        }
        let codes = error.error_codes();
        if let Some(code) = self.codes.iter().find(|c| codes.contains(&c.as_str())) {
            return Some(SentinelMatch::Code(code.clone()));
        }
        if let Some(body) = error.body() {
            if let Some(code) = self.codes.iter().find(|c| body.contains(c.as_str())) {
                return Some(SentinelMatch::BodyCode(code.clone()));
            }
        }
        None
    }

    /// Wrap a raw delete-time read into a poller.
    ///
    /// Classified errors become an observation of [`marker`](Self::marker)
    /// with no snapshot; all other errors pass through as poll failures.
    pub fn classify<R: RawPoll<Label = L>>(self, raw: R) -> Classified<R> {
        Classified {
            sentinel: self,
            raw,
        }
    }
}

/// A raw read of a remote resource that may fail with an API error.
///
/// Closures returning a future of `Result<(label, snapshot), error>`
/// implement this trait directly.
pub trait RawPoll: Send {
    type Label: StateLabel;
    type Snapshot: Send;
    type Error: ApiFailure + std::error::Error + Send + Sync + 'static;

    fn fetch(
        &mut self,
    ) -> impl Future<Output = Result<(Self::Label, Self::Snapshot), Self::Error>> + Send;
}

impl<F, Fut, L, S, E> RawPoll for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<(L, S), E>> + Send,
    L: StateLabel,
    S: Send,
    E: ApiFailure + std::error::Error + Send + Sync + 'static,
{
    type Label = L;
    type Snapshot = S;
    type Error = E;

    fn fetch(&mut self) -> impl Future<Output = Result<(L, S), E>> + Send {
        self()
    }
}

/// A raw poll wrapped by a [`DeletedSentinel`].
pub struct Classified<R: RawPoll> {
    sentinel: DeletedSentinel<R::Label>,
    raw: R,
}

impl<R: RawPoll> Poller for Classified<R> {
    type Label = R::Label;
    type Snapshot = Option<R::Snapshot>;

    async fn poll(&mut self) -> PollResult<R::Label, Option<R::Snapshot>> {
        match self.raw.fetch().await {
            Ok((state, snapshot)) => PollResult::observed(state, Some(snapshot)),
            Err(err) => match self.sentinel.matches(&err) {
                Some(reason) => {
                    debug!(
                        marker = %self.sentinel.marker,
                        reason = ?reason,
                        error = %err,
                        "Treating error as already deleted"
                    );
                    PollResult::observed(self.sentinel.marker.clone(), None)
                }
                None => PollResult::failed(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "tf-marker-for-deleted-route-aggregation";

    fn sentinel() -> DeletedSentinel<&'static str> {
        DeletedSentinel::new(MARKER).with_code("EQ-3044301")
    }

    #[test]
    fn test_default_statuses() {
        let s = sentinel();
        assert_eq!(
            s.matches(&ApiError::http(404, "not found")),
            Some(SentinelMatch::Status(404))
        );
        assert_eq!(
            s.matches(&ApiError::http(403, "forbidden")),
            Some(SentinelMatch::Status(403))
        );
        assert_eq!(s.matches(&ApiError::http(500, "boom")), None);
        assert_eq!(s.matches(&ApiError::http(400, "bad request")), None);
    }

    #[test]
    fn test_structured_code() {
        let err = ApiError::http(400, "cannot read").with_code("EQ-3044301");
        assert_eq!(
            sentinel().matches(&err),
            Some(SentinelMatch::Code("EQ-3044301".to_string()))
        );
    }

    #[test]
    fn test_code_in_body() {
        let err = ApiError::http(500, "internal")
            .with_body(r#"[{"errorCode":"EQ-3044301","errorMessage":"already deleted"}]"#);
        assert_eq!(
            sentinel().matches(&err),
            Some(SentinelMatch::BodyCode("EQ-3044301".to_string()))
        );
    }

    #[test]
    fn test_unlisted_code_passes_through() {
        let err = ApiError::http(400, "invalid").with_code("EQ-3044402");
        assert_eq!(sentinel().matches(&err), None);
    }

    #[test]
    fn test_transport_error_passes_through() {
        assert_eq!(sentinel().matches(&ApiError::transport("connection reset")), None);
    }

    #[test]
    fn test_extra_and_replaced_statuses() {
        let with_400 = DeletedSentinel::new(MARKER).with_status(400);
        assert!(with_400.matches(&ApiError::http(400, "gone")).is_some());
        assert!(with_400.matches(&ApiError::http(404, "gone")).is_some());

        let only_404 = DeletedSentinel::new(MARKER).with_statuses([404]);
        assert!(only_404.matches(&ApiError::http(403, "forbidden")).is_none());
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::http(404, "route aggregation not found").with_code("EQ-3044301");
        assert_eq!(
            err.to_string(),
            "HTTP 404 [EQ-3044301] route aggregation not found"
        );
        assert_eq!(ApiError::transport("timeout").to_string(), "timeout");
    }

    #[tokio::test]
    async fn test_classified_poller() {
        let mut answers = vec![
            Err(ApiError::http(404, "gone")),
            Err(ApiError::http(502, "bad gateway")),
            Ok(("DEPROVISIONING", 1u8)),
        ];
        let mut poller = sentinel().classify(move || {
            let next = answers.pop().unwrap();
            async move { next }
        });

        let first = poller.poll().await;
        assert!(matches!(
            first,
            PollResult::Observed {
                state: "DEPROVISIONING",
                snapshot: Some(1)
            }
        ));

        let second = poller.poll().await;
        assert!(second.is_failed());

        let third = poller.poll().await;
        assert!(matches!(
            third,
            PollResult::Observed {
                state: MARKER,
                snapshot: None
            }
        ));
    }
}
