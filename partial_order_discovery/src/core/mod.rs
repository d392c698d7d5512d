//! Core modules for partial order discovery

pub mod event_data;

/// IO Traits
pub mod io;

pub mod process_models;

pub use event_data::{EventLog, Trace};
pub use process_models::petri_net::PetriNet;
