//! Process Discovery
//!
//! Discovery of partial orders from event logs and of process models from
//! partial orders.

/// Concurrency Oracle: from traces to partial orders
pub mod concurrency;
/// Isomorphism of labeled Petri nets
pub mod isomorphism;
/// Iterative synthesis of process models from partial orders
pub mod prime_miner;
