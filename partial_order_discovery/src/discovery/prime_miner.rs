use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::core::process_models::petri_net::PetriNet;
use crate::discovery::isomorphism::are_isomorphic;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Options passed on to [`RegionSynthesis`]
pub struct RegionsConfiguration {
    /// Synthesise nets where every arc has weight 1
    pub no_arc_weights: bool,
    /// Forget which transitions carry the same label
    pub oblivious: bool,
}

///
/// Synthesis of a [`PetriNet`] from a set of example behaviours
///
/// Implemented by region-theory based synthesis engines.
///
pub trait RegionSynthesis {
    /// Error raised by the synthesis
    type Error: std::error::Error + Send + Sync + 'static;

    /// Synthesise a single net covering the behaviour of all `nets`
    fn synthesise(
        &mut self,
        nets: &[&PetriNet],
        config: &RegionsConfiguration,
    ) -> Result<PetriNet, Self::Error>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A net emitted by the [`PrimeMiner`]
pub struct PrimeMinerResult {
    /// The synthesised net
    pub net: PetriNet,
    /// Positions (in the frequency-sorted input) of the partial orders the net supports
    pub supported_indices: Vec<usize>,
}

impl PrimeMinerResult {
    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Errors of the [`PrimeMiner`]
#[derive(Debug, thiserror::Error)]
pub enum PrimeMinerError<E: std::error::Error + 'static> {
    /// Mining requires at least one partial order
    #[error("prime miner input must not be empty")]
    EmptyInput,
    /// The synthesis collaborator failed
    #[error("region synthesis failed")]
    Synthesis(#[source] E),
}

#[derive(Debug)]
///
/// Iterative synthesis over partial orders, most frequent first
///
/// Every step synthesises the current best net together with the next partial order.
/// A connected result that differs from the current best replaces it, and the previous
/// best is emitted. A result isomorphic to the current best only adds the partial order
/// to the supported indices. Disconnected results are ignored.
/// The last best net is emitted once all partial orders are processed, even if it is empty,
/// as long as it supports some partial order.
///
/// Synthesis only happens while the iterator is polled, one call at a time.
///
pub struct PrimeMiner<S: RegionSynthesis> {
    synthesis: S,
    partial_orders: Vec<PetriNet>,
    config: RegionsConfiguration,
    next_index: usize,
    best: PrimeMinerResult,
    done: bool,
}

impl<S: RegionSynthesis> PrimeMiner<S> {
    /// Prepare mining `partial_orders` (sorted by descending frequency, stable)
    pub fn new(
        mut partial_orders: Vec<PetriNet>,
        synthesis: S,
        config: RegionsConfiguration,
    ) -> Result<Self, PrimeMinerError<S::Error>> {
        if partial_orders.is_empty() {
            return Err(PrimeMinerError::EmptyInput);
        }
        partial_orders.sort_by_key(|po| Reverse(po.frequency()));
        Ok(Self {
            synthesis,
            partial_orders,
            config,
            next_index: 0,
            best: PrimeMinerResult {
                net: PetriNet::new(),
                supported_indices: Vec::new(),
            },
            done: false,
        })
    }

    /// The partial orders in processing order
    pub fn partial_orders(&self) -> &[PetriNet] {
        &self.partial_orders
    }

    /// Give back the synthesis engine
    pub fn into_synthesis(self) -> S {
        self.synthesis
    }
}

impl<S: RegionSynthesis> Iterator for PrimeMiner<S> {
    type Item = Result<PrimeMinerResult, PrimeMinerError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let index = self.next_index;
            let Some(partial_order) = self.partial_orders.get(index) else {
                self.done = true;
                if self.best.net.is_empty() && self.best.supported_indices.is_empty() {
                    return None;
                }
                if self.best.net.is_empty() {
                    log::debug!(
                        "Synthesis only produced empty nets, emitting one for {:?}",
                        self.best.supported_indices
                    );
                }
                let best = std::mem::replace(
                    &mut self.best,
                    PrimeMinerResult {
                        net: PetriNet::new(),
                        supported_indices: Vec::new(),
                    },
                );
                return Some(Ok(best));
            };
            self.next_index += 1;

            let result = match self
                .synthesis
                .synthesise(&[&self.best.net, partial_order], &self.config)
            {
                Ok(net) => net,
                Err(e) => {
                    self.done = true;
                    return Some(Err(PrimeMinerError::Synthesis(e)));
                }
            };
            log::trace!(
                "Iteration {} of {} completed ({} transitions)",
                index + 1,
                self.partial_orders.len(),
                result.number_of_transitions()
            );

            if !result.is_connected() {
                continue;
            }
            if are_isomorphic(&self.best.net, &result) {
                self.best.supported_indices.push(index);
                continue;
            }
            let mut supported_indices = self.best.supported_indices.clone();
            supported_indices.push(index);
            let previous = std::mem::replace(
                &mut self.best,
                PrimeMinerResult {
                    net: result,
                    supported_indices,
                },
            );
            log::trace!("Best running result supports {:?}", self.best.supported_indices);
            if !previous.net.is_empty() {
                return Some(Ok(previous));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_models::petri_net::ArcType;

    #[derive(Debug, thiserror::Error)]
    #[error("synthesis gave up")]
    struct GaveUp;

    /// Returns the newest partial order, fails, disconnects or gives nothing on request
    #[derive(Default)]
    struct Latest {
        calls: Vec<usize>,
        fail_at: Option<usize>,
        disconnect_at: Option<usize>,
        empty: bool,
    }

    impl RegionSynthesis for Latest {
        type Error = GaveUp;

        fn synthesise(
            &mut self,
            nets: &[&PetriNet],
            _config: &RegionsConfiguration,
        ) -> Result<PetriNet, Self::Error> {
            let call = self.calls.len();
            self.calls.push(nets[0].number_of_transitions());
            if self.fail_at == Some(call) {
                return Err(GaveUp);
            }
            if self.empty {
                return Ok(PetriNet::new());
            }
            let mut net = nets[1].clone();
            if self.disconnect_at == Some(call) {
                net.add_transition(Some("floating".into()), None);
            }
            Ok(net)
        }
    }

    fn chain(labels: &[&str], frequency: u64) -> PetriNet {
        let mut net = PetriNet::new();
        let mut place = net.add_place(None);
        for l in labels {
            let t = net.add_transition(Some(l.to_string()), None);
            net.add_arc(ArcType::place_to_transition(place, t), None).unwrap();
            place = net.add_place(None);
            net.add_arc(ArcType::transition_to_place(t, place), None).unwrap();
        }
        for _ in 0..frequency {
            net.increment_frequency();
        }
        net
    }

    fn mine(
        inputs: Vec<PetriNet>,
        synthesis: Latest,
    ) -> Vec<Result<PrimeMinerResult, PrimeMinerError<GaveUp>>> {
        PrimeMiner::new(inputs, synthesis, RegionsConfiguration::default()).unwrap()
            .collect()
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            PrimeMiner::new(Vec::new(), Latest::default(), RegionsConfiguration::default()),
            Err(PrimeMinerError::EmptyInput)
        ));
    }

    #[test]
    fn results_follow_frequency_order() {
        let inputs = vec![chain(&["b"], 1), chain(&["a"], 3), chain(&["a"], 2)];
        let miner = PrimeMiner::new(inputs, Latest::default(), RegionsConfiguration::default())
            .unwrap();
        let order: Vec<u64> = miner.partial_orders().iter().map(|p| p.frequency()).collect();
        assert_eq!(order, vec![3, 2, 1]);

        let results: Vec<PrimeMinerResult> = miner.map(Result::unwrap).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].supported_indices, vec![0, 1]);
        assert_eq!(results[0].net.transitions().next().unwrap().label.as_deref(), Some("a"));
        assert_eq!(results[1].supported_indices, vec![0, 1, 2]);
        assert_eq!(results[1].net.transitions().next().unwrap().label.as_deref(), Some("b"));
    }

    #[test]
    fn best_net_is_passed_to_synthesis() {
        let inputs = vec![chain(&["a", "b"], 2), chain(&["c"], 1)];
        let mut miner =
            PrimeMiner::new(inputs, Latest::default(), RegionsConfiguration::default()).unwrap();
        while miner.next().is_some() {}
        assert_eq!(miner.into_synthesis().calls, vec![0, 2]);
    }

    #[test]
    fn disconnected_results_are_skipped() {
        let inputs = vec![chain(&["a"], 2), chain(&["b"], 1)];
        let synthesis = Latest {
            disconnect_at: Some(1),
            ..Default::default()
        };
        let results: Vec<PrimeMinerResult> =
            mine(inputs, synthesis).into_iter().map(Result::unwrap).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].supported_indices, vec![0]);
    }

    #[test]
    fn isomorphic_result_after_a_disconnected_one_extends_the_indices() {
        let inputs = vec![chain(&["a"], 3), chain(&["b"], 2), chain(&["a"], 1)];
        let synthesis = Latest {
            disconnect_at: Some(1),
            ..Default::default()
        };
        let results: Vec<PrimeMinerResult> =
            mine(inputs, synthesis).into_iter().map(Result::unwrap).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].supported_indices, vec![0, 2]);
        assert_eq!(results[0].net.number_of_transitions(), 1);
    }

    #[test]
    fn empty_synthesis_results_are_still_reported() {
        let inputs = vec![chain(&["a"], 2), chain(&["b"], 1)];
        let synthesis = Latest {
            empty: true,
            ..Default::default()
        };
        let results: Vec<PrimeMinerResult> =
            mine(inputs, synthesis).into_iter().map(Result::unwrap).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].net.is_empty());
        assert_eq!(results[0].supported_indices, vec![0, 1]);
    }

    #[test]
    fn synthesis_errors_end_mining() {
        let inputs = vec![chain(&["a"], 3), chain(&["b"], 2), chain(&["c"], 1)];
        let synthesis = Latest {
            fail_at: Some(1),
            ..Default::default()
        };
        let results = mine(inputs, synthesis);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(PrimeMinerError::Synthesis(GaveUp))));
    }

    #[test]
    fn single_input_is_emitted() {
        let results = mine(vec![chain(&["a"], 1)], Latest::default());
        assert_eq!(results.len(), 1);
        let result = results.into_iter().next().unwrap().unwrap();
        assert_eq!(result.supported_indices, vec![0]);
        assert!(PrimeMinerResult::to_json(&result).contains("supported_indices"));
    }
}
