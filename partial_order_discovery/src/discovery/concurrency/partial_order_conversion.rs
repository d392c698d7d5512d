use std::collections::VecDeque;

use crate::core::process_models::petri_net::{ArcType, PetriNet, PlaceID, TransitionID};

use super::{concurrency_relation::LabelConcurrency, ConcurrencyError};

/// `true` if one of `places` has `predecessor` as its producer (or no producer, if `None`)
fn fed_by(net: &PetriNet, places: &[PlaceID], predecessor: Option<TransitionID>) -> bool {
    places
        .iter()
        .any(|p| net.preset_of_place(*p).first().copied() == predecessor)
}

/// `true` if one of `places` has `successor` as its consumer (or no consumer, if `None`)
fn feeds(net: &PetriNet, places: &[PlaceID], successor: Option<TransitionID>) -> bool {
    places
        .iter()
        .any(|p| net.postset_of_place(*p).first().copied() == successor)
}

///
/// Split a chain-shaped [`PetriNet`] into a partial order using a concurrency relation
///
/// Every place between two transitions whose labels are concurrent (e.g., observed in
/// both orders, see [`OccurrenceMatrix`](super::OccurrenceMatrix)) is removed. The ordering constraints running through the removed place are kept:
/// the later transition inherits the inputs of the earlier one and the earlier
/// transition inherits the outputs of the later one, unless an equivalent place
/// already exists. New places are examined as well, until no place can be split anymore.
///
/// Transitions with the same label are never considered concurrent.
///
pub fn convert_sequence_to_partial_order<C: LabelConcurrency + ?Sized>(
    net: &mut PetriNet,
    concurrency: &C,
) -> Result<(), ConcurrencyError> {
    let mut queue: VecDeque<PlaceID> = net.place_ids().into();
    let mut removed = 0_usize;

    while let Some(place) = queue.pop_front() {
        let Some(p) = net.place(place) else {
            continue;
        };
        let (ins, outs) = (p.ingoing_arcs().len(), p.outgoing_arcs().len());
        if ins == 0 || outs == 0 {
            continue;
        }
        if ins > 1 || outs > 1 {
            return Err(ConcurrencyError::NotAPartialOrder(place));
        }
        let pre = net.preset_of_place(place)[0];
        let post = net.postset_of_place(place)[0];
        match (net.label_of(pre), net.label_of(post)) {
            (Some(a), Some(b)) if a != b && concurrency.are_concurrent(a, b) => {}
            _ => continue,
        }

        net.remove_place(place);
        removed += 1;

        // Whatever enabled `pre` now also has to enable `post`
        for in_place in net.preset_of_transition(pre) {
            let producer = net.preset_of_place(in_place).first().copied();
            if fed_by(net, &net.preset_of_transition(post), producer) {
                continue;
            }
            let copy = net.add_place(None);
            if let Some(producer) = producer {
                net.add_arc(ArcType::transition_to_place(producer, copy), None)?;
            }
            net.add_arc(ArcType::place_to_transition(copy, post), None)?;
            queue.push_back(copy);
        }

        // Whatever `post` enabled now also has to wait for `pre`
        for out_place in net.postset_of_transition(post) {
            let consumer = net.postset_of_place(out_place).first().copied();
            if feeds(net, &net.postset_of_transition(pre), consumer) {
                continue;
            }
            let copy = net.add_place(None);
            net.add_arc(ArcType::transition_to_place(pre, copy), None)?;
            if let Some(consumer) = consumer {
                net.add_arc(ArcType::place_to_transition(copy, consumer), None)?;
            }
            queue.push_back(copy);
        }
    }
    log::trace!("Split {removed} places");
    Ok(())
}
