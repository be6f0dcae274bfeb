//! Virtual circuit waiters
//!
//! Both waiters hold back [`VIRTUAL_CIRCUIT_TIMEOUT_MARGIN`] from the
//! operation budget so the caller still has time to read the circuit back
//! after the wait.

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::defaults::VIRTUAL_CIRCUIT_TIMEOUT_MARGIN;
use converge_core::{
    ApiError, Cadence, DeletedSentinel, Poller, StateSpec, Timing, reserve_margin,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum VirtualCircuitStatus {
    Pending,
    WaitingOnCustomerVlan,
    Activating,
    ChangingVlan,
    Active,
    Deactivating,
    Deleting,
    ActivationFailed,
    DeactivationFailed,
    #[strum(serialize = "tf-marker-for-deleted-virtual-circuit")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(VirtualCircuitStatus);

/// A virtual circuit is either VLAN or VRF backed; both carry a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualCircuit {
    Vlan {
        id: String,
        vnid: Option<String>,
        status: VirtualCircuitStatus,
    },
    Vrf {
        id: String,
        vrf_id: String,
        status: VirtualCircuitStatus,
    },
}

impl VirtualCircuit {
    pub fn id(&self) -> &str {
        match self {
            Self::Vlan { id, .. } | Self::Vrf { id, .. } => id,
        }
    }

    pub fn status(&self) -> &VirtualCircuitStatus {
        match self {
            Self::Vlan { status, .. } | Self::Vrf { status, .. } => status,
        }
    }
}

pub trait VirtualCircuitsApi: Send + Sync + 'static {
    fn get_virtual_circuit(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<VirtualCircuit, ApiError>> + Send;
}

fn status_of(vc: &VirtualCircuit) -> VirtualCircuitStatus {
    vc.status().clone()
}

/// Wait for a new virtual circuit to become active.
///
/// `budget` is the full create timeout; the margin is taken off here.
pub fn create_spec<C: VirtualCircuitsApi>(
    client: Arc<C>,
    id: &str,
    budget: Duration,
) -> StateSpec<impl Poller<Label = VirtualCircuitStatus, Snapshot = VirtualCircuit>> {
    let vc_id = id.to_string();
    let poller = observe(status_of, move || {
        let client = Arc::clone(&client);
        let vc_id = vc_id.clone();
        async move { client.get_virtual_circuit(&vc_id).await }
    });

    StateSpec::new(format!("virtual circuit {id}"), poller)
        .pending([VirtualCircuitStatus::Activating])
        .target([VirtualCircuitStatus::Active])
        .timing(Timing::from_cadence(
            Cadence::STANDARD,
            reserve_margin(budget, VIRTUAL_CIRCUIT_TIMEOUT_MARGIN),
        ))
}

/// Wait for a deleted virtual circuit to disappear.
pub fn delete_spec<C: VirtualCircuitsApi>(
    client: Arc<C>,
    id: &str,
    budget: Duration,
) -> StateSpec<impl Poller<Label = VirtualCircuitStatus, Snapshot = Option<VirtualCircuit>>> {
    let vc_id = id.to_string();
    let raw = observe_raw(status_of, move || {
        let client = Arc::clone(&client);
        let vc_id = vc_id.clone();
        async move { client.get_virtual_circuit(&vc_id).await }
    });

    StateSpec::new(
        format!("virtual circuit {id}"),
        DeletedSentinel::new(VirtualCircuitStatus::Deleted).classify(raw),
    )
    .pending([VirtualCircuitStatus::Deleting])
    .target([VirtualCircuitStatus::Deleted])
    .timing(Timing::from_cadence(
        Cadence::STANDARD,
        reserve_margin(budget, VIRTUAL_CIRCUIT_TIMEOUT_MARGIN),
    ))
}
