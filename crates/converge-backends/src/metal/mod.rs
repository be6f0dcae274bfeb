//! Bare-metal interconnection resources
//!
//! Metal labels are lowercase snake_case. Reads answer 403 or 404 once a
//! resource is gone; no domain codes are involved.

pub mod gateway;
pub mod virtual_circuit;
