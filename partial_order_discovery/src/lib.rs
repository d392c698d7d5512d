#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![doc = include_str!("../README.md")]

/// Event logs, partial orders and Petri nets
pub mod core;

/// Discovery of partial orders and process models
pub mod discovery;

/// Maximum flow on dense networks
pub mod flow_network;

/// Util module with smaller helper structs used by the algorithms
pub mod utils;

#[doc(inline)]
pub use crate::core::{EventLog, PetriNet, Trace};

#[doc(inline)]
pub use crate::core::io::Importable;

#[doc(inline)]
pub use crate::core::event_data::partial_orders::PartialOrderTrace;

#[doc(inline)]
pub use discovery::concurrency::{
    determine_concurrency, determine_concurrency_with_matrix, determine_concurrency_with_relation,
    ConcurrencyError, ConcurrencyOracleConfig, ConcurrencyRelation, ConcurrencyResult,
};

#[doc(inline)]
pub use discovery::isomorphism::{are_isomorphic, deduplicate_isomorphic};

#[doc(inline)]
pub use discovery::prime_miner::{
    PrimeMiner, PrimeMinerError, PrimeMinerResult, RegionSynthesis, RegionsConfiguration,
};

#[doc(inline)]
pub use flow_network::MaxFlowPreflowN3;

///
/// Serialize a [`PetriNet`] as a JSON [`String`]
///
pub fn petrinet_to_json(net: &PetriNet) -> String {
    net.to_json()
}

///
/// Deserialize a [`PetriNet`] from a JSON [`String`]
///
pub fn json_to_petrinet(net_json: &str) -> Result<PetriNet, serde_json::Error> {
    PetriNet::from_json(net_json)
}
