//! Route aggregation waiters

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::{
    ApiError, Cadence, DeletedSentinel, Poller, StateSpec, Timing,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Route aggregation still exists but can no longer be read
pub const ALREADY_DELETED_CODE: &str = "EQ-3044301";

/// Route aggregation lifecycle states
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteAggregationState {
    Provisioning,
    Provisioned,
    Reprovisioning,
    Deprovisioning,
    Deprovisioned,
    NotProvisioned,
    NotDeprovisioned,
    /// Synthesized once the API reports the aggregation as gone
    #[strum(serialize = "tf-marker-for-deleted-route-aggregation")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(RouteAggregationState);

/// Route aggregation as read back from the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAggregation {
    pub uuid: String,
    pub name: String,
    pub state: RouteAggregationState,
}

/// The reads route aggregation waiters need
pub trait RouteAggregationsApi: Send + Sync + 'static {
    fn get_route_aggregation(
        &self,
        uuid: &str,
    ) -> impl Future<Output = Result<RouteAggregation, ApiError>> + Send;
}

fn state_of(ra: &RouteAggregation) -> RouteAggregationState {
    ra.state.clone()
}

/// Wait for a created or updated route aggregation to be provisioned.
pub fn create_update_spec<C: RouteAggregationsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = RouteAggregationState, Snapshot = RouteAggregation>> {
    let id = uuid.to_string();
    let poller = observe(state_of, move || {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.get_route_aggregation(&id).await }
    });

    StateSpec::new(format!("route aggregation {uuid}"), poller)
        .pending([RouteAggregationState::Provisioning])
        .target([RouteAggregationState::Provisioned])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}

/// Wait for a deleted route aggregation to disappear.
pub fn delete_spec<C: RouteAggregationsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = RouteAggregationState, Snapshot = Option<RouteAggregation>>> {
    let id = uuid.to_string();
    let raw = observe_raw(state_of, move || {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.get_route_aggregation(&id).await }
    });
    let sentinel =
        DeletedSentinel::new(RouteAggregationState::Deleted).with_code(ALREADY_DELETED_CODE);

    StateSpec::new(format!("route aggregation {uuid}"), sentinel.classify(raw))
        .pending([RouteAggregationState::Deprovisioning])
        .target([RouteAggregationState::Deleted])
        .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}
