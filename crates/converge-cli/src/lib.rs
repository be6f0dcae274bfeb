//! converge-cli - Scenario simulator for the convergence waiter
//!
//! A scenario describes a waiter configuration plus a script of what the
//! backend answers on each read. [`simulate::run`] replays the script through
//! the real [`converge_core::wait_with_report()`] on a paused clock and
//! reports how the wait ended.

pub mod scenario;
pub mod simulate;

pub use scenario::{DeletedPolicy, Scenario, ScriptStep};
pub use simulate::{Outcome, run};
