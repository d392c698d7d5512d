use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialOrd, Ord)]
/// Place ID
pub struct PlaceID(pub Uuid);
impl PlaceID {
    /// Get UUID
    pub fn get_uuid(self) -> Uuid {
        self.0
    }
}
impl From<&Place> for PlaceID {
    fn from(value: &Place) -> Self {
        PlaceID(value.id)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialOrd, Ord)]
/// Transition ID
pub struct TransitionID(pub Uuid);
impl TransitionID {
    /// Get UUID
    pub fn get_uuid(self) -> Uuid {
        self.0
    }
}
impl From<&Transition> for TransitionID {
    fn from(value: &Transition) -> Self {
        TransitionID(value.id)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialOrd, Ord)]
/// Arc ID
pub struct ArcID(pub Uuid);

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Eq)]
/// Place in a Petri net
///
/// Keeps track of the arcs entering and leaving it.
pub struct Place {
    id: Uuid,
    ingoing_arcs: Vec<ArcID>,
    outgoing_arcs: Vec<ArcID>,
}

impl Place {
    /// ID of this place
    pub fn id(&self) -> PlaceID {
        PlaceID(self.id)
    }
    /// Arcs ending in this place
    pub fn ingoing_arcs(&self) -> &[ArcID] {
        &self.ingoing_arcs
    }
    /// Arcs starting in this place
    pub fn outgoing_arcs(&self) -> &[ArcID] {
        &self.outgoing_arcs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Eq)]
/// Transition in a Petri net
pub struct Transition {
    /// Transition label (None if this transition is _invisible_)
    pub label: Option<String>,
    id: Uuid,
    ingoing_arcs: Vec<ArcID>,
    outgoing_arcs: Vec<ArcID>,
}

impl Transition {
    /// ID of this transition
    pub fn id(&self) -> TransitionID {
        TransitionID(self.id)
    }
    /// Arcs ending in this transition
    pub fn ingoing_arcs(&self) -> &[ArcID] {
        &self.ingoing_arcs
    }
    /// Arcs starting in this transition
    pub fn outgoing_arcs(&self) -> &[ArcID] {
        &self.outgoing_arcs
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[serde(tag = "type", content = "nodes")]
/// Arc type in a Petri net
///
/// Arcs always connect nodes of different kinds.
pub enum ArcType {
    /// From Place to Transition
    PlaceTransition(Uuid, Uuid),
    /// From Transition to Place
    TransitionPlace(Uuid, Uuid),
}

impl ArcType {
    /// Create new from place to transition
    pub fn place_to_transition(from: PlaceID, to: TransitionID) -> ArcType {
        ArcType::PlaceTransition(from.0, to.0)
    }
    /// Create new from transition to place
    pub fn transition_to_place(from: TransitionID, to: PlaceID) -> ArcType {
        ArcType::TransitionPlace(from.0, to.0)
    }
    /// Checks if a given node ID is start or end of this arc
    pub fn contains(&self, id: &Uuid) -> bool {
        match self {
            ArcType::PlaceTransition(from, to) => from == id || to == id,
            ArcType::TransitionPlace(from, to) => from == id || to == id,
        }
    }
    /// Source node ID
    pub fn source(&self) -> Uuid {
        match self {
            ArcType::PlaceTransition(from, _) | ArcType::TransitionPlace(from, _) => *from,
        }
    }
    /// Target node ID
    pub fn target(&self) -> Uuid {
        match self {
            ArcType::PlaceTransition(_, to) | ArcType::TransitionPlace(_, to) => *to,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Hash, PartialEq, Eq)]
/// Arc in a Petri net
///
/// Connecting a transition and a place (or the other way around)
pub struct Arc {
    id: Uuid,
    /// Source and target of Arc
    pub from_to: ArcType,
    /// Weight (i.e., how many tokens this arc moves)
    pub weight: u32,
}

impl Arc {
    /// ID of this arc
    pub fn id(&self) -> ArcID {
        ArcID(self.id)
    }
}

/// Errors raised when a [`PetriNet`] is modified inconsistently
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PetriNetError {
    /// Referenced place does not exist
    #[error("place {0} does not exist in the Petri net")]
    UnknownPlace(Uuid),
    /// Referenced transition does not exist
    #[error("transition {0} does not exist in the Petri net")]
    UnknownTransition(Uuid),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
///
/// A Petri net of [`Place`]s and [`Transition`]s
///
/// Bipartite graph of [`Place`]s and [`Transition`]s with [`Arc`]s connecting them.
/// Nodes and arcs are kept in insertion order, so iterating a net is deterministic.
/// The `frequency` counts how many traces of an event log the net represents.
pub struct PetriNet {
    places: IndexMap<Uuid, Place>,
    transitions: IndexMap<Uuid, Transition>,
    arcs: IndexMap<Uuid, Arc>,
    #[serde(default)]
    frequency: u64,
}

impl PetriNet {
    /// Create new [`PetriNet`] with no places or transitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// `true` if the net has neither places nor transitions
    pub fn is_empty(&self) -> bool {
        self.places.is_empty() && self.transitions.is_empty()
    }

    /// Number of traces this net represents
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Count one more trace
    pub fn increment_frequency(&mut self) {
        self.frequency += 1;
    }

    /// Forget all counted traces
    pub fn reset_frequency(&mut self) {
        self.frequency = 0;
    }

    /// Add the frequency of a merged duplicate to this net
    pub fn absorb_frequency(&mut self, duplicate: &PetriNet) {
        self.frequency += duplicate.frequency;
    }

    /// Add a place (with an optional passed UUID)
    ///
    /// If no ID is passed, a new UUID will be generated
    pub fn add_place(&mut self, place_id: Option<Uuid>) -> PlaceID {
        let place_id = place_id.unwrap_or_else(Uuid::new_v4);
        self.places.insert(
            place_id,
            Place {
                id: place_id,
                ingoing_arcs: Vec::new(),
                outgoing_arcs: Vec::new(),
            },
        );
        PlaceID(place_id)
    }

    /// Add a transition with an label (and with an optional passed UUID)
    ///
    /// If no ID is passed, a new UUID will be generated
    pub fn add_transition(
        &mut self,
        label: Option<String>,
        transition_id: Option<Uuid>,
    ) -> TransitionID {
        let transition_id = transition_id.unwrap_or_else(Uuid::new_v4);
        self.transitions.insert(
            transition_id,
            Transition {
                id: transition_id,
                label,
                ingoing_arcs: Vec::new(),
                outgoing_arcs: Vec::new(),
            },
        );
        TransitionID(transition_id)
    }

    /// Add an arc
    ///
    /// Both endpoints have to be part of the net already.
    pub fn add_arc(
        &mut self,
        from_to: ArcType,
        weight: Option<u32>,
    ) -> Result<ArcID, PetriNetError> {
        match from_to {
            ArcType::PlaceTransition(p, t) => {
                self.check_place(p)?;
                self.check_transition(t)?;
            }
            ArcType::TransitionPlace(t, p) => {
                self.check_transition(t)?;
                self.check_place(p)?;
            }
        }
        let arc_id = ArcID(Uuid::new_v4());
        match from_to {
            ArcType::PlaceTransition(p, t) => {
                self.places[&p].outgoing_arcs.push(arc_id);
                self.transitions[&t].ingoing_arcs.push(arc_id);
            }
            ArcType::TransitionPlace(t, p) => {
                self.transitions[&t].outgoing_arcs.push(arc_id);
                self.places[&p].ingoing_arcs.push(arc_id);
            }
        }
        self.arcs.insert(
            arc_id.0,
            Arc {
                id: arc_id.0,
                from_to,
                weight: weight.unwrap_or(1),
            },
        );
        Ok(arc_id)
    }

    fn check_place(&self, id: Uuid) -> Result<(), PetriNetError> {
        if self.places.contains_key(&id) {
            Ok(())
        } else {
            Err(PetriNetError::UnknownPlace(id))
        }
    }

    fn check_transition(&self, id: Uuid) -> Result<(), PetriNetError> {
        if self.transitions.contains_key(&id) {
            Ok(())
        } else {
            Err(PetriNetError::UnknownTransition(id))
        }
    }

    /// Remove an arc, detaching it from both of its endpoints
    pub fn remove_arc(&mut self, arc_id: ArcID) {
        if let Some(arc) = self.arcs.shift_remove(&arc_id.0) {
            let (from, to) = (arc.from_to.source(), arc.from_to.target());
            for id in [from, to] {
                if let Some(p) = self.places.get_mut(&id) {
                    p.ingoing_arcs.retain(|a| *a != arc_id);
                    p.outgoing_arcs.retain(|a| *a != arc_id);
                }
                if let Some(t) = self.transitions.get_mut(&id) {
                    t.ingoing_arcs.retain(|a| *a != arc_id);
                    t.outgoing_arcs.retain(|a| *a != arc_id);
                }
            }
        }
    }

    /// Remove a Place (and all arcs connected to it) from the Petri net
    pub fn remove_place(&mut self, place_id: PlaceID) {
        if let Some(place) = self.places.get(&place_id.0) {
            let arcs: Vec<ArcID> = place
                .ingoing_arcs
                .iter()
                .chain(place.outgoing_arcs.iter())
                .copied()
                .collect();
            arcs.into_iter().for_each(|a| self.remove_arc(a));
            self.places.shift_remove(&place_id.0);
        }
    }

    /// Remove a Transition (and all arcs connected to it) from the Petri net
    pub fn remove_transition(&mut self, transition_id: TransitionID) {
        if let Some(transition) = self.transitions.get(&transition_id.0) {
            let arcs: Vec<ArcID> = transition
                .ingoing_arcs
                .iter()
                .chain(transition.outgoing_arcs.iter())
                .copied()
                .collect();
            arcs.into_iter().for_each(|a| self.remove_arc(a));
            self.transitions.shift_remove(&transition_id.0);
        }
    }

    /// Get a place by its ID
    pub fn place(&self, id: PlaceID) -> Option<&Place> {
        self.places.get(&id.0)
    }

    /// Get a transition by its ID
    pub fn transition(&self, id: TransitionID) -> Option<&Transition> {
        self.transitions.get(&id.0)
    }

    /// Get an arc by its ID
    pub fn arc(&self, id: ArcID) -> Option<&Arc> {
        self.arcs.get(&id.0)
    }

    /// All places in insertion order
    pub fn places(&self) -> impl Iterator<Item = &Place> + '_ {
        self.places.values()
    }

    /// All transitions in insertion order
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.values()
    }

    /// All arcs in insertion order
    pub fn arcs(&self) -> impl Iterator<Item = &Arc> + '_ {
        self.arcs.values()
    }

    /// IDs of all places in insertion order
    pub fn place_ids(&self) -> Vec<PlaceID> {
        self.places.keys().map(|id| PlaceID(*id)).collect()
    }

    /// IDs of all transitions in insertion order
    pub fn transition_ids(&self) -> Vec<TransitionID> {
        self.transitions.keys().map(|id| TransitionID(*id)).collect()
    }

    /// Number of places
    pub fn number_of_places(&self) -> usize {
        self.places.len()
    }

    /// Number of transitions
    pub fn number_of_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Number of arcs
    pub fn number_of_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Places without ingoing arcs
    pub fn input_places(&self) -> Vec<PlaceID> {
        self.places
            .values()
            .filter(|p| p.ingoing_arcs.is_empty())
            .map(Place::id)
            .collect()
    }

    /// Places without outgoing arcs
    pub fn output_places(&self) -> Vec<PlaceID> {
        self.places
            .values()
            .filter(|p| p.outgoing_arcs.is_empty())
            .map(Place::id)
            .collect()
    }

    /// Get the preset of a [`PetriNet`] place
    pub fn preset_of_place(&self, p: PlaceID) -> Vec<TransitionID> {
        self.places
            .get(&p.0)
            .map(|place| {
                place
                    .ingoing_arcs
                    .iter()
                    .filter_map(|a| self.arcs.get(&a.0))
                    .map(|a| TransitionID(a.from_to.source()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get postset of [`PetriNet`] place
    pub fn postset_of_place(&self, p: PlaceID) -> Vec<TransitionID> {
        self.places
            .get(&p.0)
            .map(|place| {
                place
                    .outgoing_arcs
                    .iter()
                    .filter_map(|a| self.arcs.get(&a.0))
                    .map(|a| TransitionID(a.from_to.target()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the preset of a [`PetriNet`] transition
    pub fn preset_of_transition(&self, t: TransitionID) -> Vec<PlaceID> {
        self.transitions
            .get(&t.0)
            .map(|transition| {
                transition
                    .ingoing_arcs
                    .iter()
                    .filter_map(|a| self.arcs.get(&a.0))
                    .map(|a| PlaceID(a.from_to.source()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get postset of [`PetriNet`] transition
    pub fn postset_of_transition(&self, t: TransitionID) -> Vec<PlaceID> {
        self.transitions
            .get(&t.0)
            .map(|transition| {
                transition
                    .outgoing_arcs
                    .iter()
                    .filter_map(|a| self.arcs.get(&a.0))
                    .map(|a| PlaceID(a.from_to.target()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Transitions reachable from `t` through exactly one place
    pub fn successor_transitions(&self, t: TransitionID) -> Vec<TransitionID> {
        self.postset_of_transition(t)
            .into_iter()
            .flat_map(|p| self.postset_of_place(p))
            .collect()
    }

    /// Replace the label of a transition
    pub fn set_label(
        &mut self,
        t: TransitionID,
        label: Option<String>,
    ) -> Result<(), PetriNetError> {
        let transition = self
            .transitions
            .get_mut(&t.0)
            .ok_or(PetriNetError::UnknownTransition(t.0))?;
        transition.label = label;
        Ok(())
    }

    /// Label of a transition (`None` if silent or unknown)
    pub fn label_of(&self, t: TransitionID) -> Option<&str> {
        self.transitions.get(&t.0).and_then(|t| t.label.as_deref())
    }

    /// Deep copy of the net where every node receives a new ID
    ///
    /// Also returns the mapping from old to new node IDs.
    /// Fails if an arc references a node missing from the net (e.g., in hand-written JSON).
    pub fn clone_with_fresh_ids(
        &self,
    ) -> Result<(PetriNet, HashMap<Uuid, Uuid>), PetriNetError> {
        let mut clone = PetriNet::new();
        let mut mapping: HashMap<Uuid, Uuid> = HashMap::new();
        for place in self.places.values() {
            mapping.insert(place.id, clone.add_place(None).0);
        }
        for transition in self.transitions.values() {
            mapping.insert(
                transition.id,
                clone.add_transition(transition.label.clone(), None).0,
            );
        }
        let place = |id: &Uuid| {
            mapping
                .get(id)
                .copied()
                .ok_or(PetriNetError::UnknownPlace(*id))
        };
        let transition = |id: &Uuid| {
            mapping
                .get(id)
                .copied()
                .ok_or(PetriNetError::UnknownTransition(*id))
        };
        let mut arcs = Vec::with_capacity(self.arcs.len());
        for arc in self.arcs.values() {
            let from_to = match &arc.from_to {
                ArcType::PlaceTransition(p, t) => {
                    ArcType::PlaceTransition(place(p)?, transition(t)?)
                }
                ArcType::TransitionPlace(t, p) => {
                    ArcType::TransitionPlace(transition(t)?, place(p)?)
                }
            };
            arcs.push((from_to, arc.weight));
        }
        for (from_to, weight) in arcs {
            clone.add_arc(from_to, Some(weight))?;
        }
        clone.frequency = self.frequency;
        Ok((clone, mapping))
    }

    /// Every transition has at least one ingoing arc
    pub fn is_connected(&self) -> bool {
        self.transitions.values().all(|t| !t.ingoing_arcs.is_empty())
    }
}
