//! converge-core - Waiting for remote resources to reach a lifecycle state
//!
//! Backends that provision asynchronously answer a mutating call long before
//! the resource is usable. This crate provides one reusable state machine that
//! polls such a resource until it reaches a target state, fails fast on
//! unexpected states and poll errors, and gives up after a deadline.
//!
//! ## Modules
//!
//! - [`poll`]: poll results, state labels and the [`Poller`] trait
//! - [`spec`]: [`StateSpec`], the per-operation waiter configuration
//! - [`wait`]: the convergence state machine ([`wait()`], [`wait_with_report()`])
//! - [`classify`]: the deleted-sentinel classifier for delete waiters
//! - [`timing`]: cadences, timing parameters and per-operation timeouts
//! - [`defaults`]: default timeout and cadence values
//! - [`error`]: typed waiter and configuration errors

pub mod classify;
pub mod defaults;
pub mod error;
pub mod poll;
pub mod spec;
pub mod timing;
pub mod wait;

pub use classify::{ApiError, ApiFailure, Classified, DeletedSentinel, RawPoll, SentinelMatch};
pub use error::{ConfigError, SpecError, WaitError};
pub use poll::{PollResult, Poller, StateLabel};
pub use spec::StateSpec;
pub use timing::{Cadence, Operation, OperationTimeouts, Timing, reserve_margin};
pub use wait::{Converged, WaitPhase, wait, wait_with_report};
