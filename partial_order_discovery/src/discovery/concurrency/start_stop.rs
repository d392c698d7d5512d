use crate::core::{
    event_data::{END_ACTIVITY, START_ACTIVITY},
    process_models::petri_net::{ArcType, PetriNet, PlaceID, TransitionID},
};

use super::ConcurrencyError;

/// The single input and the single output place of `net`
fn boundary_places(net: &PetriNet) -> Result<(PlaceID, PlaceID), ConcurrencyError> {
    let inputs = net.input_places();
    let outputs = net.output_places();
    match (inputs.as_slice(), outputs.as_slice()) {
        ([input], [output]) => Ok((*input, *output)),
        _ => Err(ConcurrencyError::NotAChain {
            input_places: inputs.len(),
            output_places: outputs.len(),
        }),
    }
}

///
/// Frame a chain between an artificial start and an artificial end activity
///
/// A [`START_ACTIVITY`] transition (with a new input place) is put in front of the
/// net's input place and an [`END_ACTIVITY`] transition (with a new output place)
/// behind its output place.
///
/// Fails with [`ConcurrencyError::NotAChain`] unless the net has exactly one input
/// and one output place.
///
pub fn add_start_stop_events(net: &mut PetriNet) -> Result<(), ConcurrencyError> {
    let (input, output) = boundary_places(net)?;

    let start = net.add_transition(Some(START_ACTIVITY.to_string()), None);
    let start_place = net.add_place(None);
    net.add_arc(ArcType::place_to_transition(start_place, start), None)?;
    net.add_arc(ArcType::transition_to_place(start, input), None)?;

    let end = net.add_transition(Some(END_ACTIVITY.to_string()), None);
    let end_place = net.add_place(None);
    net.add_arc(ArcType::place_to_transition(output, end), None)?;
    net.add_arc(ArcType::transition_to_place(end, end_place), None)?;
    Ok(())
}

/// The single transition in `candidates`, if it carries `label`
fn single_labeled(
    net: &PetriNet,
    candidates: &[TransitionID],
    label: &str,
) -> Option<TransitionID> {
    match candidates {
        [t] if net.label_of(*t) == Some(label) => Some(*t),
        _ => None,
    }
}

///
/// Undo [`add_start_stop_events`]
///
/// Removes the input place together with the [`START_ACTIVITY`] transition it feeds
/// and the output place together with the [`END_ACTIVITY`] transition feeding it.
///
pub fn remove_start_stop_events(net: &mut PetriNet) -> Result<(), ConcurrencyError> {
    let (input, output) =
        boundary_places(net).map_err(|_| ConcurrencyError::MissingStartStop)?;
    let start = single_labeled(net, &net.postset_of_place(input), START_ACTIVITY)
        .ok_or(ConcurrencyError::MissingStartStop)?;
    let end = single_labeled(net, &net.preset_of_place(output), END_ACTIVITY)
        .ok_or(ConcurrencyError::MissingStartStop)?;

    net.remove_place(input);
    net.remove_transition(start);
    net.remove_place(output);
    net.remove_transition(end);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::concurrency::sequence_builder::PetriNetSequence;

    fn chain(labels: &[&str]) -> PetriNet {
        let mut seq = PetriNetSequence::new();
        for l in labels {
            seq.append(l).unwrap();
        }
        seq.into_net()
    }

    #[test]
    fn frame_and_unframe() {
        let mut net = chain(&["a", "b"]);
        add_start_stop_events(&mut net).unwrap();
        assert_eq!(net.number_of_transitions(), 4);
        assert_eq!(net.number_of_places(), 5);
        let input = net.input_places()[0];
        let start = net.postset_of_place(input)[0];
        assert_eq!(net.label_of(start), Some(START_ACTIVITY));
        let output = net.output_places()[0];
        assert_eq!(net.label_of(net.preset_of_place(output)[0]), Some(END_ACTIVITY));

        remove_start_stop_events(&mut net).unwrap();
        assert_eq!(net.number_of_transitions(), 2);
        assert_eq!(net.number_of_places(), 3);
        assert_eq!(net.number_of_arcs(), 4);
        assert!(net
            .transitions()
            .all(|t| t.label.as_deref() != Some(START_ACTIVITY)
                && t.label.as_deref() != Some(END_ACTIVITY)));
    }

    #[test]
    fn empty_chain_keeps_its_place() {
        let mut net = chain(&[]);
        add_start_stop_events(&mut net).unwrap();
        assert_eq!(net.number_of_transitions(), 2);
        remove_start_stop_events(&mut net).unwrap();
        assert_eq!(net.number_of_places(), 1);
        assert_eq!(net.number_of_transitions(), 0);
    }

    #[test]
    fn non_chains_are_rejected() {
        let mut net = chain(&["a"]);
        net.add_place(None);
        assert!(matches!(
            add_start_stop_events(&mut net),
            Err(ConcurrencyError::NotAChain {
                input_places: 2,
                output_places: 2
            })
        ));

        let mut unframed = chain(&["a"]);
        assert!(matches!(
            remove_start_stop_events(&mut unframed),
            Err(ConcurrencyError::MissingStartStop)
        ));
    }
}
