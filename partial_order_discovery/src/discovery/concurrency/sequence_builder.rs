use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::core::{
    event_data::is_reserved_label,
    process_models::petri_net::{ArcType, PetriNet, PetriNetError, PlaceID},
    Trace,
};
use crate::utils::prefix_tree::{PrefixTree, PrefixTreeError, PrefixTreeNodeIndex};

use super::{occurrence_matrix::OccurrenceMatrix, ConcurrencyError, ConcurrencyOracleConfig};

#[derive(Debug, Clone)]
///
/// Chain-shaped [`PetriNet`] built one activity at a time
///
/// The chain alternates places and transitions and starts with a single place.
/// New transitions are always appended after [`PetriNetSequence::last_place`].
///
pub struct PetriNetSequence {
    net: PetriNet,
    last_place: PlaceID,
}

impl Default for PetriNetSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl PetriNetSequence {
    /// Create a chain consisting of a single place
    pub fn new() -> Self {
        let mut net = PetriNet::new();
        let last_place = net.add_place(None);
        Self { net, last_place }
    }

    /// Append a transition labeled `label` followed by a fresh place
    pub fn append(&mut self, label: &str) -> Result<(), PetriNetError> {
        let transition = self.net.add_transition(Some(label.to_string()), None);
        let place = self.net.add_place(None);
        self.net
            .add_arc(ArcType::place_to_transition(self.last_place, transition), None)?;
        self.net
            .add_arc(ArcType::transition_to_place(transition, place), None)?;
        self.last_place = place;
        Ok(())
    }

    /// Copy of this chain with new node IDs and no counted traces
    pub fn fresh_copy(&self) -> Result<Self, PetriNetError> {
        let (mut net, mapping) = self.net.clone_with_fresh_ids()?;
        net.reset_frequency();
        let last_place = mapping
            .get(&self.last_place.0)
            .copied()
            .map(PlaceID)
            .ok_or(PetriNetError::UnknownPlace(self.last_place.0))?;
        Ok(Self { net, last_place })
    }

    /// The underlying net
    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    /// Mutable access to the underlying net
    pub fn net_mut(&mut self) -> &mut PetriNet {
        &mut self.net
    }

    /// Place at the end of the chain
    pub fn last_place(&self) -> PlaceID {
        self.last_place
    }

    /// Take the underlying net
    pub fn into_net(self) -> PetriNet {
        self.net
    }
}

#[derive(Debug, Clone)]
/// Result of [`convert_log_to_sequences`]
pub struct TraceConversionResult {
    /// One chain per distinct (kept) trace variant, in order of first completion
    pub nets: Vec<PetriNet>,
    /// Orderings observed within the look-ahead window
    pub occurrence_matrix: OccurrenceMatrix,
}

/// Record every ordering between `label` and the labels in the window, then slide the window
fn observe(
    window: &mut VecDeque<String>,
    label: &str,
    look_ahead_distance: usize,
    matrix: &mut OccurrenceMatrix,
) {
    for earlier in window.iter() {
        matrix.set(earlier, label);
    }
    window.push_back(label.to_string());
    if window.len() > look_ahead_distance {
        window.pop_front();
    }
}

///
/// Turn every distinct trace variant of `log` into a chain-shaped [`PetriNet`]
///
/// Traces sharing a prefix share the chain of that prefix, which is copied once
/// the traces diverge. Each resulting net's frequency is the number of traces
/// ending in it. While walking the traces, every label is related to the
/// `look_ahead_distance` labels preceding it in the same trace.
///
/// If `discard_prefixes` is set, a variant that is a strict prefix of another
/// variant is dropped and traces ending in it are not counted.
///
pub fn convert_log_to_sequences(
    log: &[Trace],
    config: &ConcurrencyOracleConfig,
) -> Result<TraceConversionResult, ConcurrencyError> {
    if config.look_ahead_distance == 0 {
        return Err(ConcurrencyError::InvalidConfiguration(
            "look-ahead distance has to be at least 1".to_string(),
        ));
    }
    let discard_prefixes = config.discard_prefixes;

    let mut tree = PrefixTree::new(PetriNetSequence::new());
    let mut matrix = OccurrenceMatrix::new();
    let mut completed: IndexSet<PrefixTreeNodeIndex> = IndexSet::new();
    let mut window: VecDeque<String> = VecDeque::with_capacity(config.look_ahead_distance + 1);

    for (trace_index, trace) in log.iter().enumerate() {
        if let Some(label) = trace.iter().find(|l| is_reserved_label(l)) {
            return Err(ConcurrencyError::ReservedLabel {
                trace: trace_index,
                label: label.to_string(),
            });
        }

        window.clear();
        for label in trace.iter() {
            observe(&mut window, label, config.look_ahead_distance, &mut matrix);
        }

        let end = tree.insert(
            trace.events.as_slice(),
            |step, parent: &PetriNetSequence| -> Result<PetriNetSequence, ConcurrencyError> {
                let mut child = parent.fresh_copy()?;
                child.append(step)?;
                Ok(child)
            },
            |parent_index, parent| {
                if discard_prefixes {
                    parent.net_mut().reset_frequency();
                    completed.shift_remove(&parent_index);
                }
            },
        )?;

        let node = tree
            .node_mut(end)
            .ok_or(PrefixTreeError::MissingContent(end))?;
        if discard_prefixes && node.has_children() {
            continue;
        }
        let sequence = node
            .content_mut()
            .ok_or(PrefixTreeError::MissingContent(end))?;
        sequence.net_mut().increment_frequency();
        completed.insert(end);
    }

    let mut nets = Vec::with_capacity(completed.len());
    for index in completed {
        let sequence = tree
            .node_mut(index)
            .and_then(|node| node.take_content())
            .ok_or(PrefixTreeError::MissingContent(index))?;
        nets.push(sequence.into_net());
    }
    log::debug!(
        "Converted {} traces into {} sequences ({} ordering relations)",
        log.len(),
        nets.len(),
        matrix.len()
    );
    Ok(TraceConversionResult {
        nets,
        occurrence_matrix: matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_data::START_ACTIVITY;

    fn config(look_ahead_distance: usize, discard_prefixes: bool) -> ConcurrencyOracleConfig {
        ConcurrencyOracleConfig {
            look_ahead_distance,
            discard_prefixes,
            ..Default::default()
        }
    }

    fn labels_in_order(net: &PetriNet) -> Vec<String> {
        let mut labels = Vec::new();
        let mut place = net.input_places()[0];
        while let Some(t) = net.postset_of_place(place).first().copied() {
            labels.push(net.label_of(t).unwrap().to_string());
            place = net.postset_of_transition(t)[0];
        }
        labels
    }

    #[test]
    fn shared_prefixes_become_separate_chains() {
        let log = vec![
            Trace::new(["a", "b", "c"]),
            Trace::new(["a", "b", "d"]),
            Trace::new(["a", "b", "c"]),
        ];
        let res = convert_log_to_sequences(&log, &config(1, false)).unwrap();
        assert_eq!(res.nets.len(), 2);
        assert_eq!(labels_in_order(&res.nets[0]), vec!["a", "b", "c"]);
        assert_eq!(res.nets[0].frequency(), 2);
        assert_eq!(labels_in_order(&res.nets[1]), vec!["a", "b", "d"]);
        assert_eq!(res.nets[1].frequency(), 1);
        for net in &res.nets {
            assert_eq!(net.number_of_places(), 4);
            assert_eq!(net.number_of_transitions(), 3);
            assert_eq!(net.input_places().len(), 1);
            assert_eq!(net.output_places().len(), 1);
        }
        // Chains of diverging variants do not share nodes
        let ids_a: Vec<_> = res.nets[0].place_ids();
        assert!(ids_a.iter().all(|p| res.nets[1].place(*p).is_none()));
    }

    #[test]
    fn window_only_relates_nearby_labels() {
        let log = vec![Trace::new(["a", "b", "c"])];
        let res = convert_log_to_sequences(&log, &config(1, false)).unwrap();
        assert!(res.occurrence_matrix.get("a", "b"));
        assert!(res.occurrence_matrix.get("b", "c"));
        assert!(!res.occurrence_matrix.get("a", "c"));
        assert!(!res.occurrence_matrix.get("b", "a"));

        let res = convert_log_to_sequences(&log, &config(2, false)).unwrap();
        assert!(res.occurrence_matrix.get("a", "c"));
    }

    #[test]
    fn repeated_variants_still_fill_the_matrix() {
        let log = vec![Trace::new(["a", "b"]), Trace::new(["a", "b"]), Trace::new(["b", "a"])];
        let res = convert_log_to_sequences(&log, &config(1, false)).unwrap();
        assert!(res.occurrence_matrix.are_concurrent("a", "b"));
        assert_eq!(res.nets.len(), 2);
    }

    #[test]
    fn conversion_is_deterministic() {
        let log = vec![
            Trace::new(["a", "b", "c"]),
            Trace::new(["b", "a"]),
            Trace::new(["a", "b"]),
            Trace::new(["c", "a", "b", "a"]),
            Trace::new(["b", "a"]),
        ];
        let summary = |res: &TraceConversionResult| -> Vec<(Vec<String>, u64)> {
            res.nets
                .iter()
                .map(|net| (labels_in_order(net), net.frequency()))
                .collect()
        };
        for discard_prefixes in [false, true] {
            let first = convert_log_to_sequences(&log, &config(2, discard_prefixes)).unwrap();
            let second = convert_log_to_sequences(&log, &config(2, discard_prefixes)).unwrap();
            assert_eq!(summary(&first), summary(&second));
            assert_eq!(first.occurrence_matrix, second.occurrence_matrix);
        }
        let res = convert_log_to_sequences(&log, &config(2, false)).unwrap();
        assert_eq!(
            summary(&res),
            vec![
                (vec!["a".to_string(), "b".to_string(), "c".to_string()], 1),
                (vec!["b".to_string(), "a".to_string()], 2),
                (vec!["a".to_string(), "b".to_string()], 1),
                (vec!["c".to_string(), "a".to_string(), "b".to_string(), "a".to_string()], 1),
            ]
        );
    }

    #[test]
    fn prefixes_can_be_discarded() {
        let log = vec![
            Trace::new(["a"]),
            Trace::new(["a", "b"]),
            Trace::new(["a"]),
            Trace::new(["c"]),
        ];
        let kept = convert_log_to_sequences(&log, &config(1, false)).unwrap();
        assert_eq!(kept.nets.len(), 3);
        assert_eq!(kept.nets[0].frequency(), 2);

        let discarded = convert_log_to_sequences(&log, &config(1, true)).unwrap();
        assert_eq!(discarded.nets.len(), 2);
        assert_eq!(labels_in_order(&discarded.nets[0]), vec!["a", "b"]);
        assert_eq!(discarded.nets[0].frequency(), 1);
        assert_eq!(labels_in_order(&discarded.nets[1]), vec!["c"]);
    }

    #[test]
    fn empty_trace_is_a_single_place() {
        let log = vec![Trace::new(Vec::<String>::new())];
        let res = convert_log_to_sequences(&log, &config(1, false)).unwrap();
        assert_eq!(res.nets.len(), 1);
        assert_eq!(res.nets[0].number_of_places(), 1);
        assert_eq!(res.nets[0].number_of_transitions(), 0);
        assert_eq!(res.nets[0].frequency(), 1);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let log = vec![Trace::new(["a"])];
        assert!(matches!(
            convert_log_to_sequences(&log, &config(0, false)),
            Err(ConcurrencyError::InvalidConfiguration(_))
        ));
        let log = vec![Trace::new(["a"]), Trace::new(["a", START_ACTIVITY])];
        assert!(matches!(
            convert_log_to_sequences(&log, &config(1, false)),
            Err(ConcurrencyError::ReservedLabel { trace: 1, .. })
        ));
    }
}
