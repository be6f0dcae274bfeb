//! Stream asset attachment waiters
//!
//! Detaching an asset from a stream answers 400 on reads once the
//! attachment no longer exists, so 400 joins the usual 403/404 here.

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::{ApiError, Cadence, DeletedSentinel, Poller, StateSpec, Timing};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// HTTP status the attachment endpoint uses for a detached asset
pub const HTTP_BAD_REQUEST: u16 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamAttachmentState {
    Attaching,
    Attached,
    Detaching,
    Detached,
    Failed,
    #[strum(serialize = "tf-marker-for-deleted-stream-attachment")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(StreamAttachmentState);

/// Kind of asset attached to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AssetKind {
    Ports,
    Connections,
    RouterProviders,
    ServiceTokens,
}

/// Identifies one asset attached to one stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    pub stream_id: String,
    pub asset: AssetKind,
    pub asset_id: String,
}

impl std::fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} on stream {}", self.asset, self.asset_id, self.stream_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamAttachment {
    pub key: AttachmentKey,
    pub state: StreamAttachmentState,
}

pub trait StreamAttachmentsApi: Send + Sync + 'static {
    fn get_stream_attachment(
        &self,
        key: &AttachmentKey,
    ) -> impl Future<Output = Result<StreamAttachment, ApiError>> + Send;
}

fn state_of(attachment: &StreamAttachment) -> StreamAttachmentState {
    attachment.state.clone()
}

pub fn attach_spec<C: StreamAttachmentsApi>(
    client: Arc<C>,
    key: AttachmentKey,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = StreamAttachmentState, Snapshot = StreamAttachment>> {
    let resource = format!("stream attachment {key}");
    let poller = observe(state_of, move || {
        let client = Arc::clone(&client);
        let key = key.clone();
        async move { client.get_stream_attachment(&key).await }
    });

    StateSpec::new(resource, poller)
        .pending([StreamAttachmentState::Attaching])
        .target([StreamAttachmentState::Attached])
        .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}

/// Wait for an asset to be detached; a read may still report ATTACHED
/// right after the detach call.
pub fn detach_spec<C: StreamAttachmentsApi>(
    client: Arc<C>,
    key: AttachmentKey,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = StreamAttachmentState, Snapshot = Option<StreamAttachment>>> {
    let resource = format!("stream attachment {key}");
    let raw = observe_raw(state_of, move || {
        let client = Arc::clone(&client);
        let key = key.clone();
        async move { client.get_stream_attachment(&key).await }
    });
    let sentinel =
        DeletedSentinel::new(StreamAttachmentState::Deleted).with_status(HTTP_BAD_REQUEST);

    StateSpec::new(resource, sentinel.classify(raw))
        .pending([StreamAttachmentState::Attached, StreamAttachmentState::Detaching])
        .target([StreamAttachmentState::Detached, StreamAttachmentState::Deleted])
        .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}
