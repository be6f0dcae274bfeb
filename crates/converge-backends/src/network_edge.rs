//! Network-edge BGP session waiters
//!
//! BGP sessions are polled right away: the configuration call returns once
//! the session has been accepted, and most sessions settle within seconds.

use crate::observe::{lifecycle_labels, observe};
use converge_core::{ApiError, Cadence, Poller, StateSpec, Timing};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Interval between BGP provisioning polls
pub const BGP_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BgpProvisioningStatus {
    Provisioning,
    PendingUpdate,
    Provisioned,
    Failed,
    Deprovisioning,
    Deprovisioned,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(BgpProvisioningStatus);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgpConfiguration {
    pub uuid: String,
    pub connection_uuid: String,
    pub local_asn: u32,
    pub remote_asn: u32,
    pub provisioning_status: BgpProvisioningStatus,
}

pub trait BgpApi: Send + Sync + 'static {
    fn get_bgp_configuration(
        &self,
        uuid: &str,
    ) -> impl Future<Output = Result<BgpConfiguration, ApiError>> + Send;
}

fn status_of(bgp: &BgpConfiguration) -> BgpProvisioningStatus {
    bgp.provisioning_status.clone()
}

/// Wait for a created or updated BGP configuration to be provisioned.
pub fn provisioning_spec<C: BgpApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = BgpProvisioningStatus, Snapshot = BgpConfiguration>> {
    let id = uuid.to_string();
    let poller = observe(status_of, move || {
        let client = Arc::clone(&client);
        let id = id.clone();
        async move { client.get_bgp_configuration(&id).await }
    });

    StateSpec::new(format!("BGP configuration {uuid}"), poller)
        .pending([
            BgpProvisioningStatus::Provisioning,
            BgpProvisioningStatus::PendingUpdate,
        ])
        .target([BgpProvisioningStatus::Provisioned])
        .timing(Timing::from_cadence(
            Cadence::immediate(BGP_POLL_INTERVAL),
            timeout,
        ))
}
