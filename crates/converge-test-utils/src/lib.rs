//! Shared test utilities for the converge workspace
//!
//! This crate provides scripted pollers and API fakes that can be used across
//! multiple test suites without each one re-implementing them.
//!
//! ## Modules
//!
//! - [`script`]: scripted pollers and raw API reads with call recording
//! - [`logging`]: test log initialization

pub mod script;
pub mod logging;

// Re-export commonly used items
pub use script::{CallLog, ScriptedApi, ScriptedPoller, Step};
pub use logging::init_test_tracing;
