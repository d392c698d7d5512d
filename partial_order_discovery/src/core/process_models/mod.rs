//! Process models
pub mod petri_net;
