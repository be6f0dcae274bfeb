//! Stream waiters

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::{ApiError, Cadence, DeletedSentinel, Poller, StateSpec, Timing};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamState {
    Provisioning,
    Provisioned,
    Reprovisioning,
    Deprovisioning,
    Deprovisioned,
    Failed,
    #[strum(serialize = "tf-marker-for-deleted-stream")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(StreamState);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub uuid: String,
    pub name: String,
    pub state: StreamState,
}

pub trait StreamsApi: Send + Sync + 'static {
    fn get_stream(&self, uuid: &str) -> impl Future<Output = Result<Stream, ApiError>> + Send;
}

fn state_of(stream: &Stream) -> StreamState {
    stream.state.clone()
}

pub fn create_update_spec<C: StreamsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = StreamState, Snapshot = Stream>> {
    let id = uuid.to_string();
    let poller = observe(state_of, move || {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.get_stream(&id).await }
    });

    StateSpec::new(format!("stream {uuid}"), poller)
        .pending([StreamState::Provisioning])
        .target([StreamState::Provisioned])
        .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}

pub fn delete_spec<C: StreamsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = StreamState, Snapshot = Option<Stream>>> {
    let id = uuid.to_string();
    let raw = observe_raw(state_of, move || {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.get_stream(&id).await }
    });

    StateSpec::new(
        format!("stream {uuid}"),
        DeletedSentinel::new(StreamState::Deleted).classify(raw),
    )
    .pending([StreamState::Deprovisioning])
    .target([StreamState::Deprovisioned, StreamState::Deleted])
    .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}
