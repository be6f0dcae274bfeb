//! Default timing values shared by every waiter
//!
//! These constants keep resource handlers consistent with each other instead
//! of each one picking its own numbers.

use std::time::Duration;

/// Default budget for create, update, delete and read operations (10 minutes)
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 600;

/// Default budget for fabric connection create/update (15 minutes)
pub const CONNECTION_OPERATION_TIMEOUT_SECS: u64 = 900;

/// Default budget for metal gateway deletion (20 minutes)
pub const GATEWAY_DELETE_TIMEOUT_SECS: u64 = 1200;

/// Portion of the operation budget held back from virtual circuit waiters
pub const VIRTUAL_CIRCUIT_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// Interval for most waiters
pub const STANDARD_INTERVAL: Duration = Duration::from_secs(10);

/// Minimum interval for most waiters
pub const STANDARD_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Interval and minimum for slow-to-provision routing resources
pub const SLOW_INTERVAL: Duration = Duration::from_secs(30);

// Serde default functions for struct field defaults

/// Returns the default operation timeout in seconds
pub fn default_operation_timeout() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}
