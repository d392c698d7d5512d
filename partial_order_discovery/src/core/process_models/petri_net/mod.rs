//! Petri nets
//!
//! Partial orders and sequential models are all represented as [`PetriNet`]s.
pub(crate) mod petri_net_struct;
pub use petri_net_struct::*;
