use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Pairwise "observed before" relation over activity labels
///
/// `(a, b)` is set if `a` was observed before `b` within the look-ahead window of some trace.
/// Two labels observed in both orders are considered concurrent.
pub struct OccurrenceMatrix {
    /// For each label, the labels it was observed before
    relations: HashMap<String, HashSet<String>>,
}

impl OccurrenceMatrix {
    /// Create an empty [`OccurrenceMatrix`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `before` was observed before `after`
    pub fn set(&mut self, before: &str, after: &str) {
        match self.relations.get_mut(before) {
            Some(afters) => {
                if !afters.contains(after) {
                    afters.insert(after.to_string());
                }
            }
            None => {
                self.relations
                    .insert(before.to_string(), HashSet::from([after.to_string()]));
            }
        }
    }

    /// `true` if `before` was observed before `after`
    pub fn get(&self, before: &str, after: &str) -> bool {
        self.relations
            .get(before)
            .is_some_and(|afters| afters.contains(after))
    }

    /// `true` if both orders of `a` and `b` were observed
    pub fn are_concurrent(&self, a: &str, b: &str) -> bool {
        self.get(a, b) && self.get(b, a)
    }

    /// Number of recorded pairs
    pub fn len(&self) -> usize {
        self.relations.values().map(HashSet::len).sum()
    }

    /// `true` if no pair was recorded
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// All recorded pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.relations
            .iter()
            .flat_map(|(b, afters)| afters.iter().map(move |a| (b.as_str(), a.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directed_relation() {
        let mut matrix = OccurrenceMatrix::new();
        matrix.set("a", "b");
        matrix.set("a", "b");
        assert!(matrix.get("a", "b"));
        assert!(!matrix.get("b", "a"));
        assert!(!matrix.are_concurrent("a", "b"));
        assert_eq!(matrix.len(), 1);

        matrix.set("b", "a");
        assert!(matrix.are_concurrent("a", "b"));
        assert!(matrix.are_concurrent("b", "a"));
        assert_eq!(matrix.len(), 2);
    }

    #[test]
    fn json_round_trip_keeps_pairs() {
        let mut matrix = OccurrenceMatrix::new();
        matrix.set("x", "y");
        let json = serde_json::to_string(&matrix).unwrap();
        let back: OccurrenceMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, matrix);
    }
}
