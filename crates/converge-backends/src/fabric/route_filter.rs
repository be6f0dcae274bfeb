//! Route filter waiters

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::{ApiError, Cadence, DeletedSentinel, Poller, StateSpec, Timing};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteFilterState {
    Provisioning,
    Provisioned,
    Reprovisioning,
    Deprovisioning,
    Deprovisioned,
    NotProvisioned,
    NotDeprovisioned,
    Failed,
    #[strum(serialize = "tf-marker-for-deleted-route-filter")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(RouteFilterState);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFilter {
    pub uuid: String,
    pub name: String,
    pub state: RouteFilterState,
}

pub trait RouteFiltersApi: Send + Sync + 'static {
    fn get_route_filter(
        &self,
        uuid: &str,
    ) -> impl Future<Output = Result<RouteFilter, ApiError>> + Send;
}

fn state_of(filter: &RouteFilter) -> RouteFilterState {
    filter.state.clone()
}

pub fn create_update_spec<C: RouteFiltersApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = RouteFilterState, Snapshot = RouteFilter>> {
    let id = uuid.to_string();
    let poller = observe(state_of, move || {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.get_route_filter(&id).await }
    });

    StateSpec::new(format!("route filter {uuid}"), poller)
        .pending([RouteFilterState::Provisioning, RouteFilterState::Reprovisioning])
        .target([RouteFilterState::Provisioned])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}

/// Wait for a deleted route filter to go away. The filter may still read
/// PROVISIONED for a while after the delete call is accepted.
pub fn delete_spec<C: RouteFiltersApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = RouteFilterState, Snapshot = Option<RouteFilter>>> {
    let id = uuid.to_string();
    let raw = observe_raw(state_of, move || {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.get_route_filter(&id).await }
    });

    StateSpec::new(
        format!("route filter {uuid}"),
        DeletedSentinel::new(RouteFilterState::Deleted).classify(raw),
    )
    .pending([RouteFilterState::Provisioned, RouteFilterState::Deprovisioning])
    .target([RouteFilterState::Deprovisioned, RouteFilterState::Deleted])
    .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}
