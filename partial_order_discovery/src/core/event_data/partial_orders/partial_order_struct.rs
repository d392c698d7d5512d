use crate::core::process_models::petri_net::{PetriNet, TransitionID};
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::SetLastValueWins;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// An event of a [`PartialOrderTrace`]
pub struct PartialOrderEvent {
    /// ID of the transition the event was derived from
    pub id: Uuid,
    /// Activity label (`None` for silent transitions)
    pub label: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
/// A partial order trace of [`PartialOrderEvent`]s.
/// Contains all events of a partial order and their direct precedence relations.
pub struct PartialOrderTrace {
    /// Events by ID, in the order of the transitions of the source net
    pub event_map: IndexMap<Uuid, PartialOrderEvent>,
    #[serde_as(as = "SetLastValueWins<_>")]
    /// The direct precedence relations between the events
    pub partial_relations: HashSet<(Uuid, Uuid)>,
    /// Number of traces represented by this partial order
    pub frequency: u64,
}

impl PartialOrderTrace {
    /// Create new [`PartialOrderTrace`] with no events and no partial relations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the event view of a partial order net
    ///
    /// Every transition becomes an event, every place with both a predecessor and a
    /// successor becomes a precedence relation between them.
    pub fn from_petri_net(net: &PetriNet) -> Self {
        let mut result = Self::new();
        net.transitions().for_each(|t| {
            result.add_event(PartialOrderEvent {
                id: t.id().get_uuid(),
                label: t.label.clone(),
            })
        });
        net.places().for_each(|p| {
            for from in net.preset_of_place(p.id()) {
                for to in net.postset_of_place(p.id()) {
                    result.partial_relations.insert((from.0, to.0));
                }
            }
        });
        result.frequency = net.frequency();
        result
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }

    /// Returns all the start events of the [`PartialOrderTrace`], i.e., the events having no
    /// preceding event.
    pub fn get_start_events(&self) -> Vec<&PartialOrderEvent> {
        let targets: HashSet<&Uuid> = self.partial_relations.iter().map(|(_, to)| to).collect();
        self.event_map
            .values()
            .filter(|e| !targets.contains(&e.id))
            .collect()
    }

    /// Returns all the end events of the [`PartialOrderTrace`], i.e., the events having no
    /// succeeding event.
    pub fn get_end_events(&self) -> Vec<&PartialOrderEvent> {
        let sources: HashSet<&Uuid> = self.partial_relations.iter().map(|(from, _)| from).collect();
        self.event_map
            .values()
            .filter(|e| !sources.contains(&e.id))
            .collect()
    }

    /// Adds an event to the [`PartialOrderTrace`].
    pub fn add_event(&mut self, event: PartialOrderEvent) {
        self.event_map.insert(event.id, event);
    }

    /// Adds a partial relation between two events.
    pub fn add_partial_relation(&mut self, from: &PartialOrderEvent, to: &PartialOrderEvent) {
        self.partial_relations.insert((from.id, to.id));
    }

    /// Returns all events directly preceding an event.
    pub fn get_ingoing_events(&self, event: &PartialOrderEvent) -> Vec<&PartialOrderEvent> {
        self.partial_relations
            .iter()
            .filter(|(_, to)| *to == event.id)
            .filter_map(|(from, _)| self.event_map.get(from))
            .collect()
    }

    /// Returns all events directly succeeding an event.
    pub fn get_outgoing_events(&self, event: &PartialOrderEvent) -> Vec<&PartialOrderEvent> {
        self.partial_relations
            .iter()
            .filter(|(from, _)| *from == event.id)
            .filter_map(|(_, to)| self.event_map.get(to))
            .collect()
    }

    /// Event belonging to a transition of the source net
    pub fn event_of(&self, transition: TransitionID) -> Option<&PartialOrderEvent> {
        self.event_map.get(&transition.0)
    }

    /// Creates a [`Graph`] from the [`PartialOrderTrace`].
    ///
    /// Nodes are weighted with the event labels (silent events get an empty label).
    pub fn to_graph(&self) -> (Graph<String, ()>, HashMap<Uuid, NodeIndex>) {
        let mut graph: Graph<String, (), Directed> = Graph::new();
        let mut event_to_node: HashMap<Uuid, NodeIndex> = HashMap::new();

        self.event_map.values().for_each(|event| {
            let new_node = graph.add_node(event.label.clone().unwrap_or_default());
            event_to_node.insert(event.id, new_node);
        });
        self.partial_relations.iter().for_each(|(from, to)| {
            if let (Some(from), Some(to)) = (event_to_node.get(from), event_to_node.get(to)) {
                graph.add_edge(*from, *to, ());
            }
        });

        (graph, event_to_node)
    }

    /// `true` if `to` can be reached from `from` by following precedence relations
    /// (every event reaches itself).
    pub fn is_reachable(&self, from: Uuid, to: Uuid) -> bool {
        let (graph, nodes) = self.to_graph();
        match (nodes.get(&from), nodes.get(&to)) {
            (Some(from), Some(to)) => petgraph::algo::has_path_connecting(&graph, *from, *to, None),
            _ => false,
        }
    }

    /// All pairs `(a, b)` of distinct events where `b` is reachable from `a`
    pub fn reachability_relation(&self) -> HashSet<(Uuid, Uuid)> {
        let (graph, nodes) = self.to_graph();
        let mut result = HashSet::new();
        for (a, na) in &nodes {
            for (b, nb) in &nodes {
                if a != b && petgraph::algo::has_path_connecting(&graph, *na, *nb, None) {
                    result.insert((*a, *b));
                }
            }
        }
        result
    }

    /// `true` if the precedence relations contain no cycle
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.to_graph().0)
    }
}
