//! Event data
//!
//! Event logs as plain sequences of activity labels, and partial orders of events.
#[doc(hidden)]
pub(crate) mod event_log_struct;
pub mod io;
pub mod partial_orders;

#[doc(inline)]
pub use event_log_struct::*;
