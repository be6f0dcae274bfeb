//! Waiters for attaching a route aggregation to a connection

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::{ApiError, Cadence, DeletedSentinel, Poller, StateSpec, Timing};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentState {
    Attaching,
    Attached,
    Detaching,
    Detached,
    PendingBgpConfiguration,
    Failed,
    #[strum(serialize = "tf-marker-for-deleted-connection-route-aggregation")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(AttachmentState);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRouteAggregation {
    pub connection_id: String,
    pub route_aggregation_id: String,
    pub state: AttachmentState,
}

pub trait ConnectionRouteAggregationsApi: Send + Sync + 'static {
    fn get_connection_route_aggregation(
        &self,
        connection_id: &str,
        route_aggregation_id: &str,
    ) -> impl Future<Output = Result<ConnectionRouteAggregation, ApiError>> + Send;
}

fn state_of(attachment: &ConnectionRouteAggregation) -> AttachmentState {
    attachment.state.clone()
}

fn resource_name(connection_id: &str, route_aggregation_id: &str) -> String {
    format!("route aggregation {route_aggregation_id} on connection {connection_id}")
}

/// Wait for the route aggregation to be attached.
pub fn attach_spec<C: ConnectionRouteAggregationsApi>(
    client: Arc<C>,
    connection_id: &str,
    route_aggregation_id: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = AttachmentState, Snapshot = ConnectionRouteAggregation>> {
    let (conn, ra) = (connection_id.to_string(), route_aggregation_id.to_string());
    let poller = observe(state_of, move || {
        let client = Arc::clone(&client);
        let (conn, ra) = (conn.clone(), ra.clone());
        async move { client.get_connection_route_aggregation(&conn, &ra).await }
    });

    StateSpec::new(resource_name(connection_id, route_aggregation_id), poller)
        .pending([AttachmentState::Attaching])
        .target([AttachmentState::Attached])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}

/// Wait for the route aggregation to be detached (or gone).
pub fn detach_spec<C: ConnectionRouteAggregationsApi>(
    client: Arc<C>,
    connection_id: &str,
    route_aggregation_id: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = AttachmentState, Snapshot = Option<ConnectionRouteAggregation>>>
{
    let (conn, ra) = (connection_id.to_string(), route_aggregation_id.to_string());
    let raw = observe_raw(state_of, move || {
        let client = Arc::clone(&client);
        let (conn, ra) = (conn.clone(), ra.clone());
        async move { client.get_connection_route_aggregation(&conn, &ra).await }
    });
    let sentinel = DeletedSentinel::new(AttachmentState::Deleted);

    StateSpec::new(
        resource_name(connection_id, route_aggregation_id),
        sentinel.classify(raw),
    )
    .pending([AttachmentState::Detaching])
    .target([AttachmentState::Detached, AttachmentState::Deleted])
    .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}
