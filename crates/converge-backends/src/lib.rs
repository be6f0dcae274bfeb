//! converge-backends - Waiter builders for each backend resource
//!
//! Every resource handler used to carry its own copy of the polling loop,
//! each with slightly different rules. Here a handler only describes its
//! states and how to read the resource; the loop itself is
//! [`converge_core::wait()`].
//!
//! Builders take the narrow API trait they need (not a whole-provider
//! client), an identifier, and a deadline, and return a ready
//! [`StateSpec`](converge_core::StateSpec).
//!
//! ## Modules
//!
//! - [`fabric`]: interconnection fabric (route aggregations, streams, connections, ...)
//! - [`metal`]: bare-metal virtual circuits and gateways
//! - [`network_edge`]: network-edge BGP sessions
//! - [`observe`]: shared glue turning API reads into pollers

pub mod fabric;
pub mod metal;
pub mod network_edge;
pub mod observe;
