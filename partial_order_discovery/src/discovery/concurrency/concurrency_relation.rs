//! User supplied concurrency
//!
//! Instead of deriving concurrency from the log, the pairs of concurrent events can be
//! given explicitly. Repeated activities are told apart by their occurrence within a
//! trace: `a[2]` is the second `a` of a trace.
//!
//! The text format has one pair per line, `a[1]||b[2]` or `a[1]∥b[2]`. The occurrence
//! defaults to `1`. Blank lines and lines starting with `#` are ignored, other lines that
//! do not describe a pair are skipped with a warning.

use std::{
    collections::{HashMap, HashSet},
    io::{BufRead, BufReader, Read},
    sync::OnceLock,
};

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{io::Importable, Trace};

use super::occurrence_matrix::OccurrenceMatrix;

/// Symmetric "may happen concurrently" test on activity labels
pub trait LabelConcurrency {
    /// `true` if events labeled `a` and `b` are not ordered
    fn are_concurrent(&self, a: &str, b: &str) -> bool;
}

impl LabelConcurrency for OccurrenceMatrix {
    fn are_concurrent(&self, a: &str, b: &str) -> bool {
        OccurrenceMatrix::are_concurrent(self, a, b)
    }
}

/// Label of the `one_based_order`-th occurrence of `label` in a trace
///
/// The first occurrence keeps the plain label.
pub fn occurrence_label(label: &str, one_based_order: usize) -> String {
    if one_based_order <= 1 {
        label.to_string()
    } else {
        format!("{label}[{one_based_order}]")
    }
}

///
/// Rename every event of `trace` after its occurrence
///
/// The renamed labels are recorded in `originals` (renamed label to original label).
///
pub fn relabel_occurrences(trace: &Trace, originals: &mut HashMap<String, String>) -> Trace {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    trace
        .iter()
        .map(|label| {
            let order = seen.entry(label).or_insert(0);
            *order += 1;
            let unique = occurrence_label(label, *order);
            if *order > 1 {
                originals.insert(unique.clone(), label.to_string());
            }
            unique
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Explicitly given pairs of concurrent events
///
/// Events are named by [`occurrence_label`]. The relation is symmetric.
pub struct ConcurrencyRelation {
    concurrent: HashSet<(String, String)>,
}

impl ConcurrencyRelation {
    /// Relation without any concurrent pair
    pub fn no_concurrency() -> Self {
        Self::default()
    }

    /// Declare the `order_a`-th `a` and the `order_b`-th `b` of a trace concurrent
    pub fn set_concurrent(&mut self, a: &str, order_a: usize, b: &str, order_b: usize) {
        let a = occurrence_label(a, order_a);
        let b = occurrence_label(b, order_b);
        self.concurrent.insert((b.clone(), a.clone()));
        self.concurrent.insert((a, b));
    }

    /// Number of unordered concurrent pairs
    pub fn len(&self) -> usize {
        let reflexive = self.concurrent.iter().filter(|(a, b)| a == b).count();
        (self.concurrent.len() + reflexive) / 2
    }

    /// `true` if nothing is concurrent
    pub fn is_empty(&self) -> bool {
        self.concurrent.is_empty()
    }
}

impl LabelConcurrency for ConcurrencyRelation {
    fn are_concurrent(&self, a: &str, b: &str) -> bool {
        self.concurrent.contains(&(a.to_string(), b.to_string()))
    }
}

/// Error type for [`ConcurrencyRelation`] IO operations
#[derive(Debug, thiserror::Error)]
pub enum ConcurrencyRelationIOError {
    /// IO Error
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// Unsupported Format
    #[error("Unsupported Format: {0}")]
    UnsupportedFormat(String),
}

impl Importable for ConcurrencyRelation {
    type Error = ConcurrencyRelationIOError;

    fn import_from_reader<R: Read>(reader: R, format: &str) -> Result<Self, Self::Error> {
        let format = format.trim_start_matches('.');
        match format {
            "txt" | "concurrency" => import_concurrency_relation(BufReader::new(reader)),
            _ => Err(ConcurrencyRelationIOError::UnsupportedFormat(
                format.to_string(),
            )),
        }
    }
}

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^(.+?)(?:\[([1-9]\d*)\])?\s*(?:\|\||∥)\s*(.+?)(?:\[([1-9]\d*)\])?$").unwrap()
    })
}

/// Parse a line based concurrency relation
pub fn import_concurrency_relation<R: BufRead>(
    reader: R,
) -> Result<ConcurrencyRelation, ConcurrencyRelationIOError> {
    let mut relation = ConcurrencyRelation::no_concurrency();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(captures) = line_regex().captures(trimmed) else {
            warn!("Skipping line {}: {trimmed:?} is not a concurrent pair", line_no + 1);
            continue;
        };
        let order = |group: usize| {
            captures
                .get(group)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(1)
        };
        let (a, b) = (captures[1].trim(), captures[3].trim());
        relation.set_concurrent(a, order(2), b, order(4));
    }
    Ok(relation)
}
