//! Metal gateway waiters
//!
//! Gateways are usable as soon as the create call returns, so only
//! deletion is waited on.

use crate::observe::{lifecycle_labels, observe_raw};
use converge_core::defaults::{DEFAULT_OPERATION_TIMEOUT_SECS, GATEWAY_DELETE_TIMEOUT_SECS};
use converge_core::{
    ApiError, Cadence, DeletedSentinel, OperationTimeouts, Poller, StateSpec, Timing,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum GatewayState {
    Ready,
    Active,
    Deleting,
    #[strum(serialize = "tf-marker-for-deleted-gateway")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(GatewayState);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    pub id: String,
    pub vlan: Option<u32>,
    /// Set for VRF gateways
    pub vrf_id: Option<String>,
    pub state: GatewayState,
}

pub trait GatewaysApi: Send + Sync + 'static {
    fn get_gateway(&self, id: &str) -> impl Future<Output = Result<Gateway, ApiError>> + Send;
}

/// Gateway deletion can take up to 20 minutes.
pub fn default_timeouts() -> OperationTimeouts {
    OperationTimeouts {
        delete: GATEWAY_DELETE_TIMEOUT_SECS,
        ..OperationTimeouts::uniform(DEFAULT_OPERATION_TIMEOUT_SECS)
    }
}

fn state_of(gw: &Gateway) -> GatewayState {
    gw.state.clone()
}

pub fn delete_spec<C: GatewaysApi>(
    client: Arc<C>,
    id: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = GatewayState, Snapshot = Option<Gateway>>> {
    let gw_id = id.to_string();
    let raw = observe_raw(state_of, move || {
        let client = Arc::clone(&client);
        let gw_id = gw_id.clone();
        async move { client.get_gateway(&gw_id).await }
    });

    StateSpec::new(
        format!("metal gateway {id}"),
        DeletedSentinel::new(GatewayState::Deleted).classify(raw),
    )
    .pending([GatewayState::Deleting])
    .target([GatewayState::Deleted])
    .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}
