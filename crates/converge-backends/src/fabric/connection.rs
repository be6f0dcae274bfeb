//! Fabric connection waiters
//!
//! A connection has three independent lifecycles worth waiting on: its own
//! state, the status of the latest requested change, and (for service
//! provider connections) the provider side status.

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::defaults::{CONNECTION_OPERATION_TIMEOUT_SECS, DEFAULT_OPERATION_TIMEOUT_SECS};
use converge_core::{
    ApiError, Cadence, DeletedSentinel, OperationTimeouts, Poller, StateSpec, Timing,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Connection already deleted
pub const ALREADY_DELETED_CODE: &str = "EQ-3142509";

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Provisioning,
    Pending,
    Provisioned,
    Active,
    Reprovisioning,
    Deprovisioning,
    Deprovisioned,
    Failed,
    #[strum(serialize = "tf-marker-for-deleted-connection")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

/// Status of the most recent change request on a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    Requested,
    Approved,
    Completed,
    Failed,
    Rejected,
    #[strum(default)]
    Unrecognized(String),
}

/// Provider side status of a service provider connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    PendingApproval,
    Provisioning,
    Provisioned,
    Deprovisioning,
    Deprovisioned,
    Rejected,
    NotAvailable,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(ConnectionState, ChangeStatus, ProviderStatus);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub uuid: String,
    pub name: String,
    pub state: ConnectionState,
    /// Absent until a change has been requested
    pub change_status: Option<ChangeStatus>,
    pub provider_status: Option<ProviderStatus>,
}

pub trait ConnectionsApi: Send + Sync + 'static {
    fn get_connection(
        &self,
        uuid: &str,
    ) -> impl Future<Output = Result<Connection, ApiError>> + Send;
}

/// Connections take longer than most resources to provision and update.
pub fn default_timeouts() -> OperationTimeouts {
    OperationTimeouts {
        create: CONNECTION_OPERATION_TIMEOUT_SECS,
        update: CONNECTION_OPERATION_TIMEOUT_SECS,
        delete: CONNECTION_OPERATION_TIMEOUT_SECS,
        read: DEFAULT_OPERATION_TIMEOUT_SECS,
    }
}

fn state_of(conn: &Connection) -> ConnectionState {
    conn.state.clone()
}

// A connection that was never changed has no change record yet; treat it as
// a change still waiting for approval.
fn change_status_of(conn: &Connection) -> ChangeStatus {
    conn.change_status.clone().unwrap_or(ChangeStatus::Requested)
}

fn provider_status_of(conn: &Connection) -> ProviderStatus {
    conn.provider_status
        .clone()
        .unwrap_or_else(|| ProviderStatus::Unrecognized(String::new()))
}

macro_rules! read_connection {
    ($client:expr, $uuid:expr) => {{
        let client = $client;
        let id = $uuid.to_string();
        move || {
            let client = Arc::clone(&client);
            let id = id.clone();
            async move { client.get_connection(&id).await }
        }
    }};
}

/// Wait for a new connection to leave PROVISIONING.
pub fn create_spec<C: ConnectionsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = ConnectionState, Snapshot = Connection>> {
    let poller = observe(state_of, read_connection!(client, uuid));

    StateSpec::new(format!("connection {uuid}"), poller)
        .pending([ConnectionState::Provisioning])
        .target([
            ConnectionState::Pending,
            ConnectionState::Provisioned,
            ConnectionState::Active,
        ])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}

/// Wait for the latest change request to complete.
pub fn update_spec<C: ConnectionsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = ChangeStatus, Snapshot = Connection>> {
    let poller = observe(change_status_of, read_connection!(client, uuid));

    StateSpec::new(format!("connection {uuid} change"), poller)
        .pending([ChangeStatus::Requested, ChangeStatus::Approved])
        .target([ChangeStatus::Completed])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}

/// Wait for the service provider to finish provisioning its side.
pub fn provider_status_spec<C: ConnectionsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = ProviderStatus, Snapshot = Connection>> {
    let poller = observe(provider_status_of, read_connection!(client, uuid));

    StateSpec::new(format!("connection {uuid} provider"), poller)
        .pending([ProviderStatus::PendingApproval, ProviderStatus::Provisioning])
        .target([ProviderStatus::Provisioned])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}

/// Wait for a deleted connection to be deprovisioned or gone.
pub fn delete_spec<C: ConnectionsApi>(
    client: Arc<C>,
    uuid: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = ConnectionState, Snapshot = Option<Connection>>> {
    let raw = observe_raw(state_of, read_connection!(client, uuid));
    let sentinel = DeletedSentinel::new(ConnectionState::Deleted).with_code(ALREADY_DELETED_CODE);

    StateSpec::new(format!("connection {uuid}"), sentinel.classify(raw))
        .pending([
            ConnectionState::Deprovisioning,
            ConnectionState::Active,
            ConnectionState::Pending,
        ])
        .target([ConnectionState::Deprovisioned, ConnectionState::Deleted])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}
