use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
};

use crate::core::{
    event_data::END_ACTIVITY,
    process_models::petri_net::{PetriNet, TransitionID},
};
use crate::utils::multimap::MultiMap;

use super::ConcurrencyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

///
/// Transitions of an acyclic net in reverse topological order
///
/// Every transition appears after all transitions reachable from it
/// (i.e., the depth-first postorder). Fails with [`ConcurrencyError::CycleDetected`]
/// if the net contains a cycle.
///
pub fn reverse_topological_order(net: &PetriNet) -> Result<Vec<TransitionID>, ConcurrencyError> {
    let mut visits: HashMap<TransitionID, Visit> = HashMap::new();
    let mut order = Vec::with_capacity(net.number_of_transitions());

    for root in net.transition_ids() {
        if visits.contains_key(&root) {
            continue;
        }
        visits.insert(root, Visit::InProgress);
        let mut stack = vec![(root, net.successor_transitions(root), 0_usize)];
        while let Some((node, successors, next)) = stack.last_mut() {
            if let Some(succ) = successors.get(*next).copied() {
                *next += 1;
                match visits.get(&succ) {
                    None => {
                        visits.insert(succ, Visit::InProgress);
                        let succ_successors = net.successor_transitions(succ);
                        stack.push((succ, succ_successors, 0));
                    }
                    Some(Visit::InProgress) => return Err(ConcurrencyError::CycleDetected(succ)),
                    Some(Visit::Done) => {}
                }
            } else {
                let node = *node;
                visits.insert(node, Visit::Done);
                order.push(node);
                stack.pop();
            }
        }
    }
    Ok(order)
}

///
/// Remove every place that only encodes an ordering already implied by other places
///
/// For each transition, its direct successors are visited nearest-first; a successor
/// that is already reachable through an earlier visited successor is redundant.
/// Places between a transition and a non-redundant successor are kept (once per pair),
/// all other places with exactly one producer and one consumer are removed.
/// Places produced by [`END_ACTIVITY`] transitions are never removed.
///
pub fn transitive_reduction(net: &mut PetriNet) -> Result<(), ConcurrencyError> {
    let order = reverse_topological_order(net)?;
    let position: HashMap<TransitionID, usize> =
        order.iter().enumerate().map(|(i, t)| (*t, i)).collect();

    let mut descendants: MultiMap<TransitionID, TransitionID> = MultiMap::new();
    let mut necessary: MultiMap<TransitionID, TransitionID> = MultiMap::new();
    for t in &order {
        let mut successors = net.successor_transitions(*t);
        successors.sort_by_key(|s| Reverse(position[s]));
        successors.dedup();

        descendants.add(*t, *t);
        necessary.touch(*t);
        let mut covered: HashSet<TransitionID> = HashSet::new();
        for succ in successors {
            let reachable: Vec<TransitionID> = descendants
                .get(&succ)
                .map(|d| d.iter().copied().collect())
                .unwrap_or_default();
            descendants.add_all(*t, reachable.iter().copied());
            if covered.contains(&succ) {
                continue;
            }
            necessary.add(*t, succ);
            covered.extend(reachable);
        }
    }

    let mut kept: HashSet<(TransitionID, TransitionID)> = HashSet::new();
    let mut removed = 0_usize;
    for place in net.place_ids() {
        let (pre, post) = (net.preset_of_place(place), net.postset_of_place(place));
        let (&[from], &[to]) = (pre.as_slice(), post.as_slice()) else {
            continue;
        };
        if net.label_of(from) == Some(END_ACTIVITY) {
            continue;
        }
        if necessary.contains(&from, &to) && kept.insert((from, to)) {
            continue;
        }
        net.remove_place(place);
        removed += 1;
    }
    log::trace!("Transitive reduction removed {removed} places");
    Ok(())
}
