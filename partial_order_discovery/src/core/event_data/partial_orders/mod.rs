//! Partial Orderings of Events
//!
//! In contrast to total ordering, pairs of events can be unordered.
pub(crate) mod partial_order_struct;

pub use partial_order_struct::*;
