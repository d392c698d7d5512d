//! IO implementations for [`EventLog`]
//!
//! Two formats are understood:
//! * `json`: an array of traces, each an array of activity labels
//! * `txt`/`log`: one trace per line, labels separated by whitespace or commas.
//!   Blank lines and lines starting with `#` are ignored.

use std::io::{BufRead, BufReader, Read};

use log::warn;

use crate::core::event_data::event_log_struct::{is_reserved_label, EventLog, Trace};
use crate::core::io::Importable;

/// Error type for [`EventLog`] IO operations
#[derive(Debug, thiserror::Error)]
pub enum EventLogIOError {
    /// IO Error
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON Parsing Error
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    /// A trace uses one of the reserved start/end labels
    #[error("trace {0} uses a reserved start/end label")]
    ReservedLabel(usize),
    /// Unsupported Format
    #[error("Unsupported Format: {0}")]
    UnsupportedFormat(String),
}

impl Importable for EventLog {
    type Error = EventLogIOError;

    fn import_from_reader<R: Read>(reader: R, format: &str) -> Result<Self, Self::Error> {
        let format = format.trim_start_matches('.');
        match format {
            "json" => {
                let log: EventLog = serde_json::from_reader(BufReader::new(reader))?;
                if let Some(pos) = log
                    .traces
                    .iter()
                    .position(|t| t.iter().any(is_reserved_label))
                {
                    return Err(EventLogIOError::ReservedLabel(pos));
                }
                Ok(log)
            }
            "txt" | "log" => import_line_log(BufReader::new(reader)),
            _ => Err(EventLogIOError::UnsupportedFormat(format.to_string())),
        }
    }
}

/// Parse a line based log
///
/// Malformed lines (using a reserved label) are skipped with a warning.
pub fn import_line_log<R: BufRead>(reader: R) -> Result<EventLog, EventLogIOError> {
    let mut log = EventLog::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trace: Trace = trimmed
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();
        if trace.iter().any(is_reserved_label) {
            warn!(
                "Skipping line {}: it uses a reserved start/end label",
                line_no + 1
            );
            continue;
        }
        log.add_trace(trace);
    }
    Ok(log)
}
