//! Interconnection fabric resources
//!
//! Fabric reads answer 403 or 404 once a resource is gone. Some endpoints
//! additionally return a domain error code (sometimes only inside the body)
//! while the resource is still being torn down; those codes are listed per
//! resource and are the only ones treated as "already deleted".

pub mod connection;
pub mod connection_route_aggregation;
pub mod route_aggregation;
pub mod route_aggregation_rule;
pub mod route_filter;
pub mod stream;
pub mod stream_attachment;
