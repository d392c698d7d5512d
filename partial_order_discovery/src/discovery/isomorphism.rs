use std::collections::HashMap;

use itertools::Itertools;

use crate::core::process_models::petri_net::{PetriNet, TransitionID};
use crate::utils::mixed_radix_counter::MixedRadixCounter;

/// Producers and consumers of a place as sorted transition positions
type PlaceSignature = (Vec<usize>, Vec<usize>);

fn same_shape(a: &PetriNet, b: &PetriNet) -> bool {
    a.number_of_transitions() == b.number_of_transitions()
        && a.number_of_places() == b.number_of_places()
        && a.number_of_arcs() == b.number_of_arcs()
        && a.input_places().len() == b.input_places().len()
        && a.output_places().len() == b.output_places().len()
}

/// Signatures of all places with ingoing and outgoing arcs
fn internal_places(net: &PetriNet, position: &HashMap<TransitionID, usize>) -> Vec<PlaceSignature> {
    let positions = |ts: Vec<TransitionID>| -> Vec<usize> {
        ts.iter()
            .filter_map(|t| position.get(t).copied())
            .sorted()
            .collect()
    };
    net.places()
        .filter(|p| !p.ingoing_arcs().is_empty() && !p.outgoing_arcs().is_empty())
        .map(|p| {
            (
                positions(net.preset_of_place(p.id())),
                positions(net.postset_of_place(p.id())),
            )
        })
        .collect()
}

/// Transition mapping from A to B, built digit by digit from the highest digit down
struct MappingSearch {
    /// Label-compatible transitions of B, per digit
    candidates: Vec<Vec<usize>>,
    /// Internal places of A whose transitions are all mapped once a digit is set
    completed_at: Vec<Vec<PlaceSignature>>,
    /// Internal places of B, counted by signature
    b_places: HashMap<PlaceSignature, usize>,
}

impl MappingSearch {
    ///
    /// Highest digit at which `digits` stops describing an injective, place preserving mapping
    ///
    /// A place of A is checked as soon as all of its transitions are mapped: a place of B
    /// with the mapped signature has to be left. `None` means `digits` is an isomorphism.
    ///
    fn first_conflict(&self, digits: &[usize]) -> Option<usize> {
        let mut used = vec![false; self.candidates.len()];
        let mut image = vec![0; digits.len()];
        let mut remaining = self.b_places.clone();
        for position in (0..digits.len()).rev() {
            let target = self.candidates[position][digits[position]];
            if used[target] {
                return Some(position);
            }
            used[target] = true;
            image[position] = target;

            for (pre, post) in &self.completed_at[position] {
                let mapped: PlaceSignature = (
                    pre.iter().map(|p| image[*p]).sorted().collect(),
                    post.iter().map(|p| image[*p]).sorted().collect(),
                );
                match remaining.get_mut(&mapped) {
                    Some(count) if *count > 0 => *count -= 1,
                    _ => return Some(position),
                }
            }
        }
        if remaining.values().all(|count| *count == 0) {
            None
        } else {
            Some(0)
        }
    }
}

///
/// Check whether two nets are equal up to renaming of their nodes
///
/// Transitions may only be mapped onto transitions with the same label.
/// Candidate mappings are enumerated with a [`MixedRadixCounter`] (one digit per transition
/// of `a`), and every combination sharing a conflicting prefix is skipped at once.
/// The worst case stays exponential in the number of equally labeled transitions.
///
pub fn are_isomorphic(a: &PetriNet, b: &PetriNet) -> bool {
    if !same_shape(a, b) {
        return false;
    }

    // The first transition of A takes the highest digit and is mapped first
    let n = a.number_of_transitions();
    let a_position: HashMap<TransitionID, usize> = a
        .transitions()
        .enumerate()
        .map(|(i, t)| (t.id(), n - 1 - i))
        .collect();
    let b_position: HashMap<TransitionID, usize> = b
        .transitions()
        .enumerate()
        .map(|(i, t)| (t.id(), i))
        .collect();

    let mut candidates: Vec<Vec<usize>> = Vec::with_capacity(n);
    for ta in a.transitions() {
        let matching: Vec<usize> = b
            .transitions()
            .enumerate()
            .filter(|(_, tb)| tb.label == ta.label)
            .map(|(i, _)| i)
            .collect();
        if matching.is_empty() {
            return false;
        }
        candidates.push(matching);
    }
    candidates.reverse();

    let a_places = internal_places(a, &a_position);
    let b_places: HashMap<PlaceSignature, usize> =
        internal_places(b, &b_position).into_iter().counts();
    if a_places.len() != b_places.values().sum::<usize>() {
        return false;
    }
    let mut completed_at: Vec<Vec<PlaceSignature>> = vec![Vec::new(); n];
    for place in a_places {
        if let Some(lowest) = place.0.iter().chain(&place.1).min().copied() {
            completed_at[lowest].push(place);
        }
    }

    let mut counter = MixedRadixCounter::new(candidates.iter().map(Vec::len).collect());
    let search = MappingSearch {
        candidates,
        completed_at,
        b_places,
    };
    while let Some(digits) = counter.next() {
        match search.first_conflict(&digits) {
            None => return true,
            Some(position) => counter.skip_past(&digits, position),
        }
    }
    false
}

///
/// Keep one representative of every isomorphism class
///
/// The frequency of every dropped net is added to the representative it matches.
/// The first net of each class (in input order) is kept.
///
pub fn deduplicate_isomorphic(nets: Vec<PetriNet>) -> Vec<PetriNet> {
    let mut unique: Vec<PetriNet> = Vec::new();
    'nets: for net in nets {
        for representative in unique.iter_mut() {
            if are_isomorphic(representative, &net) {
                representative.absorb_frequency(&net);
                continue 'nets;
            }
        }
        unique.push(net);
    }
    unique
}
