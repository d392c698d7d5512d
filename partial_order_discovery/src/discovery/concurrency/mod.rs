//! Concurrency Oracle
//!
//! Turns the trace variants of an event log into partial orders: activities observed
//! in both orders (within a look-ahead window) are considered concurrent and the
//! ordering between them is dropped. Alternatively, the concurrent events can be given
//! as a [`ConcurrencyRelation`].
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{
    process_models::petri_net::{PetriNet, PetriNetError, PlaceID, TransitionID},
    Trace,
};
use crate::discovery::isomorphism::deduplicate_isomorphic;
use crate::utils::prefix_tree::PrefixTreeError;

/// Explicitly given concurrency between event occurrences
pub mod concurrency_relation;
/// Pairwise observed-before relation over labels
pub mod occurrence_matrix;
/// Splitting chains into partial orders
pub mod partial_order_conversion;
/// Prefix-tree based conversion of traces into chain nets
pub mod sequence_builder;
/// Artificial start and end activities
pub mod start_stop;
/// Removal of implied ordering places
pub mod transitive_reduction;

pub use concurrency_relation::{ConcurrencyRelation, LabelConcurrency};
pub use occurrence_matrix::OccurrenceMatrix;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Options of [`determine_concurrency`]
pub struct ConcurrencyOracleConfig {
    /// Number of preceding labels each label is related to (at least 1)
    pub look_ahead_distance: usize,
    /// Drop variants that are a strict prefix of another variant
    pub discard_prefixes: bool,
    /// Keep the artificial start and end activities in the result
    pub add_start_stop_event: bool,
}

impl Default for ConcurrencyOracleConfig {
    fn default() -> Self {
        Self {
            look_ahead_distance: 1,
            discard_prefixes: false,
            add_start_stop_event: false,
        }
    }
}

impl ConcurrencyOracleConfig {
    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Errors of the Concurrency Oracle
#[derive(Debug, thiserror::Error)]
pub enum ConcurrencyError {
    /// Invalid option values
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A trace uses one of the reserved start/end labels
    #[error("trace {trace} contains the reserved label {label:?}")]
    ReservedLabel {
        /// Index of the trace in the log
        trace: usize,
        /// The offending label
        label: String,
    },
    /// A net expected to be a chain has not exactly one input and one output place
    #[error("expected one input and one output place, found {input_places} and {output_places}")]
    NotAChain {
        /// Number of places without ingoing arcs
        input_places: usize,
        /// Number of places without outgoing arcs
        output_places: usize,
    },
    /// The artificial start or end activity cannot be found
    #[error("net is not framed by start and end activities")]
    MissingStartStop,
    /// A place has more than one ingoing or outgoing arc
    #[error("place {0:?} has more than one producer or consumer")]
    NotAPartialOrder(PlaceID),
    /// The transitions of a net form a cycle
    #[error("cycle through transition {0:?}")]
    CycleDetected(TransitionID),
    /// Inconsistent Petri net
    #[error(transparent)]
    PetriNet(#[from] PetriNetError),
    /// Inconsistent prefix tree
    #[error(transparent)]
    PrefixTree(#[from] PrefixTreeError),
}

#[derive(Debug, Clone)]
/// Partial orders discovered by [`determine_concurrency_with_matrix`]
pub struct ConcurrencyResult {
    /// Pairwise non-isomorphic partial orders, with the number of traces they represent
    pub partial_orders: Vec<PetriNet>,
    /// Orderings observed in the log
    pub occurrence_matrix: OccurrenceMatrix,
}

///
/// Discover the partial orders behind the trace variants of `log`
///
/// Every kept variant becomes a chain framed by artificial start and end activities,
/// is split into a partial order and transitively reduced. Isomorphic results are
/// merged (adding up their frequencies). Unless [`ConcurrencyOracleConfig::add_start_stop_event`]
/// is set, the artificial activities are removed again at the end.
///
pub fn determine_concurrency(
    log: &[Trace],
    config: &ConcurrencyOracleConfig,
) -> Result<Vec<PetriNet>, ConcurrencyError> {
    Ok(determine_concurrency_with_matrix(log, config)?.partial_orders)
}

/// Like [`determine_concurrency`], but also returns the [`OccurrenceMatrix`]
pub fn determine_concurrency_with_matrix(
    log: &[Trace],
    config: &ConcurrencyOracleConfig,
) -> Result<ConcurrencyResult, ConcurrencyError> {
    let sequence_builder::TraceConversionResult {
        nets,
        occurrence_matrix,
    } = sequence_builder::convert_log_to_sequences(log, config)?;
    log::debug!("{} trace variants", nets.len());

    let partial_orders = into_partial_orders(nets, &occurrence_matrix)?;
    let partial_orders = finish(partial_orders, config)?;
    Ok(ConcurrencyResult {
        partial_orders,
        occurrence_matrix,
    })
}

///
/// Discover partial orders using explicitly given concurrency
///
/// Events are matched with the pairs of `relation` by their occurrence within the trace
/// (see [`concurrency_relation::occurrence_label`]). The returned nets carry the
/// original labels again. No occurrence matrix is consulted.
///
pub fn determine_concurrency_with_relation(
    log: &[Trace],
    relation: &ConcurrencyRelation,
    config: &ConcurrencyOracleConfig,
) -> Result<Vec<PetriNet>, ConcurrencyError> {
    let mut originals: HashMap<String, String> = HashMap::new();
    let relabeled: Vec<Trace> = log
        .iter()
        .map(|trace| concurrency_relation::relabel_occurrences(trace, &mut originals))
        .collect();
    let nets = sequence_builder::convert_log_to_sequences(&relabeled, config)?.nets;
    log::debug!(
        "{} trace variants, {} concurrent pairs given",
        nets.len(),
        relation.len()
    );

    let mut partial_orders = into_partial_orders(nets, relation)?;
    for net in partial_orders.iter_mut() {
        for t in net.transition_ids() {
            if let Some(original) = net.label_of(t).and_then(|l| originals.get(l)) {
                net.set_label(t, Some(original.clone()))?;
            }
        }
    }
    finish(partial_orders, config)
}

/// Frame, split and reduce every chain
fn into_partial_orders<C: LabelConcurrency + ?Sized>(
    nets: Vec<PetriNet>,
    concurrency: &C,
) -> Result<Vec<PetriNet>, ConcurrencyError> {
    let mut partial_orders = Vec::with_capacity(nets.len());
    for mut net in nets {
        start_stop::add_start_stop_events(&mut net)?;
        partial_order_conversion::convert_sequence_to_partial_order(&mut net, concurrency)?;
        transitive_reduction::transitive_reduction(&mut net)?;
        partial_orders.push(net);
    }
    Ok(partial_orders)
}

/// Merge isomorphic partial orders and strip the artificial activities if requested
fn finish(
    partial_orders: Vec<PetriNet>,
    config: &ConcurrencyOracleConfig,
) -> Result<Vec<PetriNet>, ConcurrencyError> {
    let before = partial_orders.len();
    let mut partial_orders = deduplicate_isomorphic(partial_orders);
    log::debug!(
        "Merged {} isomorphic partial orders, {} remain",
        before - partial_orders.len(),
        partial_orders.len()
    );

    if !config.add_start_stop_event {
        for net in partial_orders.iter_mut() {
            start_stop::remove_start_stop_events(net)?;
        }
    }
    Ok(partial_orders)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::core::event_data::{END_ACTIVITY, START_ACTIVITY};

    fn transition(net: &PetriNet, label: &str) -> TransitionID {
        net.transitions()
            .find(|t| t.label.as_deref() == Some(label))
            .map(TransitionID::from).unwrap()
    }

    fn successor_labels(net: &PetriNet, label: &str) -> Vec<String> {
        let mut res: Vec<String> = net
            .successor_transitions(transition(net, label))
            .into_iter()
            .filter_map(|t| net.label_of(t).map(str::to_string))
            .collect();
        res.sort();
        res
    }

    #[test]
    fn swapped_pair_becomes_concurrent() {
        let log = vec![Trace::new(["a", "b"]), Trace::new(["b", "a"])];
        let res = determine_concurrency_with_matrix(&log, &ConcurrencyOracleConfig::default())
            .unwrap();
        assert!(res.occurrence_matrix.are_concurrent("a", "b"));
        assert_eq!(res.partial_orders.len(), 1);
        let net = &res.partial_orders[0];
        assert_eq!(net.frequency(), 2);
        assert_eq!(net.number_of_transitions(), 2);
        assert!(successor_labels(net, "a").is_empty());
        assert!(successor_labels(net, "b").is_empty());
        assert_eq!(net.input_places().len(), 2);
        assert_eq!(net.output_places().len(), 2);
    }

    #[test]
    fn single_trace_stays_a_chain() {
        let log = vec![Trace::new(["a", "b", "c"])];
        let nets = determine_concurrency(&log, &ConcurrencyOracleConfig::default()).unwrap();
        assert_eq!(nets.len(), 1);
        let net = &nets[0];
        assert_eq!(net.frequency(), 1);
        assert_eq!(net.number_of_transitions(), 3);
        assert_eq!(net.number_of_places(), 4);
        assert_eq!(successor_labels(net, "a"), vec!["b"]);
        assert_eq!(successor_labels(net, "b"), vec!["c"]);
        assert!(successor_labels(net, "c").is_empty());
    }

    #[test]
    fn start_and_end_can_be_kept() {
        let log = vec![Trace::new(["a", "b"]), Trace::new(["b", "a"])];
        let config = ConcurrencyOracleConfig {
            add_start_stop_event: true,
            ..Default::default()
        };
        let nets = determine_concurrency(&log, &config).unwrap();
        assert_eq!(nets.len(), 1);
        let net = &nets[0];
        assert_eq!(successor_labels(net, START_ACTIVITY), vec!["a", "b"]);
        assert_eq!(successor_labels(net, "a"), vec![END_ACTIVITY]);
        assert_eq!(successor_labels(net, "b"), vec![END_ACTIVITY]);
        assert_eq!(net.input_places().len(), 1);
        assert_eq!(net.output_places().len(), 1);
    }

    #[test]
    fn concurrency_in_the_middle_of_a_trace() {
        let log = vec![
            Trace::new(["x", "a", "b", "y"]),
            Trace::new(["x", "b", "a", "y"]),
            Trace::new(["x", "a", "b", "y"]),
        ];
        let nets = determine_concurrency(&log, &ConcurrencyOracleConfig::default()).unwrap();
        assert_eq!(nets.len(), 1);
        let net = &nets[0];
        assert_eq!(net.frequency(), 3);
        assert_eq!(successor_labels(net, "x"), vec!["a", "b"]);
        assert_eq!(successor_labels(net, "a"), vec!["y"]);
        assert_eq!(successor_labels(net, "b"), vec!["y"]);
        // x -> a, x -> b, a -> y, b -> y plus the boundary places
        assert_eq!(net.number_of_places(), 6);
    }

    #[test]
    fn distinct_orders_stay_separate() {
        let log = vec![Trace::new(["a", "b"]), Trace::new(["a", "c"])];
        let nets = determine_concurrency(&log, &ConcurrencyOracleConfig::default()).unwrap();
        assert_eq!(nets.len(), 2);
        assert!(nets.iter().all(|n| n.frequency() == 1));
    }

    #[test]
    fn long_runs_of_one_label_are_merged() {
        let mut run = vec!["a"; 8];
        run.push("b");
        let mut reversed = run.clone();
        reversed.reverse();
        let log = vec![Trace::new(run), Trace::new(reversed)];
        let nets = determine_concurrency(&log, &ConcurrencyOracleConfig::default()).unwrap();
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].frequency(), 2);
        assert!(successor_labels(&nets[0], "b").is_empty());
    }

    #[test]
    fn given_relation_replaces_the_matrix() {
        // Never observed swapped, but declared concurrent
        let log = vec![Trace::new(["a", "b", "c"]), Trace::new(["a", "b", "c"])];
        let mut relation = ConcurrencyRelation::no_concurrency();
        relation.set_concurrent("b", 1, "c", 1);
        let nets = determine_concurrency_with_relation(
            &log,
            &relation,
            &ConcurrencyOracleConfig::default(),
        )
        .unwrap();
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].frequency(), 2);
        assert_eq!(successor_labels(&nets[0], "a"), vec!["b", "c"]);
        assert!(successor_labels(&nets[0], "b").is_empty());
    }

    #[test]
    fn given_relation_tells_occurrences_apart() {
        let log = vec![Trace::new(["a", "x", "a"])];
        let mut relation = ConcurrencyRelation::no_concurrency();
        relation.set_concurrent("x", 1, "a", 2);
        let nets = determine_concurrency_with_relation(
            &log,
            &relation,
            &ConcurrencyOracleConfig::default(),
        )
        .unwrap();
        let net = &nets[0];
        assert_eq!(net.number_of_transitions(), 3);
        assert!(net.transitions().all(|t| matches!(t.label.as_deref(), Some("a" | "x"))));
        // The first a precedes both, the second a runs alongside x
        let mut successors_of_a: Vec<Vec<String>> = net
            .transitions()
            .filter(|t| t.label.as_deref() == Some("a"))
            .map(|t| {
                net.successor_transitions(t.id())
                    .into_iter()
                    .filter_map(|s| net.label_of(s).map(str::to_string))
                    .sorted()
                    .collect()
            })
            .collect();
        successors_of_a.sort();
        assert_eq!(successors_of_a, vec![vec![], vec!["a".to_string(), "x".to_string()]]);
    }

    #[test]
    fn config_json_uses_defaults() {
        let config = ConcurrencyOracleConfig::from_json(r#"{"look_ahead_distance": 3}"#).unwrap();
        assert_eq!(config.look_ahead_distance, 3);
        assert!(!config.discard_prefixes);
        assert_eq!(
            ConcurrencyOracleConfig::from_json(&config.to_json()).unwrap(),
            config
        );
        assert!(matches!(
            determine_concurrency(
                &[Trace::new(["a"])],
                &ConcurrencyOracleConfig {
                    look_ahead_distance: 0,
                    ..Default::default()
                }
            ),
            Err(ConcurrencyError::InvalidConfiguration(_))
        ));
    }
}
