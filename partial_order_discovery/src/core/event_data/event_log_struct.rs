use serde::{Deserialize, Serialize};

/// Label given to the artificial event inserted at the start of every trace
pub const START_ACTIVITY: &str = "__START";
/// Label given to the artificial event inserted at the end of every trace
pub const END_ACTIVITY: &str = "__END";

/// `true` if `label` is one of the reserved start/end labels
pub fn is_reserved_label(label: &str) -> bool {
    label == START_ACTIVITY || label == END_ACTIVITY
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// A trace: the ordered activity labels of one recorded case
///
/// Labels may repeat.
pub struct Trace {
    /// Activity labels in order of occurrence
    pub events: Vec<String>,
}

impl Trace {
    /// Create a trace from anything yielding labels
    pub fn new<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` if the trace has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over the labels
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.events.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Trace {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Trace::new(iter)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Event log: the ordered list of recorded [`Trace`]s
pub struct EventLog {
    /// Traces of the log
    pub traces: Vec<Trace>,
}

impl EventLog {
    /// Create new empty [`EventLog`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trace
    pub fn add_trace(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

impl<T: Into<Trace>> FromIterator<T> for EventLog {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            traces: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> From<Vec<S>> for Trace {
    fn from(value: Vec<S>) -> Self {
        Trace::new(value)
    }
}

impl AsRef<[Trace]> for EventLog {
    fn as_ref(&self) -> &[Trace] {
        &self.traces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_from_nested_vectors() {
        let log: EventLog = vec![vec!["a", "b"], vec!["b", "a", "a"]]
            .into_iter()
            .collect();
        assert_eq!(log.traces.len(), 2);
        assert_eq!(log.traces[1].iter().collect::<Vec<_>>(), vec!["b", "a", "a"]);
    }

    #[test]
    fn log_json_is_a_list_of_label_lists() {
        let log: EventLog = vec![vec!["a", "b"]].into_iter().collect();
        assert_eq!(log.to_json(), r#"[["a","b"]]"#);
        let back: EventLog = serde_json::from_str(r#"[["x"],[]]"#).unwrap();
        assert_eq!(back.traces[0], Trace::new(["x"]));
        assert!(back.traces[1].is_empty());
    }

    #[test]
    fn reserved_labels() {
        assert!(is_reserved_label(START_ACTIVITY));
        assert!(is_reserved_label(END_ACTIVITY));
        assert!(!is_reserved_label("START"));
    }
}
