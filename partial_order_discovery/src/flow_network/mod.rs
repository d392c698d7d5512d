//! Flow Networks
//!
//! Maximum flow computation on small dense networks.

/// Highest-label preflow-push maximum flow
pub mod max_flow_preflow;

pub use max_flow_preflow::{MaxFlowAssignment, MaxFlowError, MaxFlowPreflowN3};
