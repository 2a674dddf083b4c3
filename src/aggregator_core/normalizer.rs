//! Event normalization from JSON / JSONL input to the unified Event struct

use super::event_store::EventStore;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A single duration-bearing event (e.g. a translation delivery).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: NaiveDateTime,
    pub duration: u64,
}

impl Event {
    pub fn new(timestamp: NaiveDateTime, duration: u64) -> Self {
        Self { timestamp, duration }
    }
}

/// Wire shape of an input record. Unknown fields (translation_id,
/// source_language, client_name, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    timestamp: Option<String>,
    duration: u64,
}

#[derive(Debug)]
pub enum InputError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { line: Option<usize>, source: serde_json::Error },
    MissingTimestamp { index: usize },
    InvalidTimestamp { index: usize, value: String },
    Empty,
    Unsorted { index: usize },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Io { path, source } => {
                write!(f, "unable to read input file {}: {}", path.display(), source)
            }
            InputError::Parse { line: Some(line), source } => {
                write!(f, "unable to parse input line {}: {}", line, source)
            }
            InputError::Parse { line: None, source } => {
                write!(f, "unable to parse input file: {}", source)
            }
            InputError::MissingTimestamp { index } => {
                write!(f, "event #{} has no timestamp", index)
            }
            InputError::InvalidTimestamp { index, value } => {
                write!(f, "event #{} has an invalid timestamp '{}'", index, value)
            }
            InputError::Empty => write!(f, "input contains no events"),
            InputError::Unsorted { index } => write!(
                f,
                "event #{} is older than its predecessor (input must be sorted by timestamp)",
                index
            ),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io { source, .. } => Some(source),
            InputError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse a timestamp such as `2018-12-26 18:11:08.509654`.
///
/// RFC 3339 values carrying an offset (`...Z`, `...+01:00`) are converted
/// to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Parse the input document. Both a JSON array of events and JSON Lines
/// (one event object per line) are accepted.
pub fn parse_events(content: &str) -> Result<Vec<Event>, InputError> {
    let raw = if content.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<RawEvent>>(content)
            .map_err(|source| InputError::Parse { line: None, source })?
    } else {
        let mut raw = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str::<RawEvent>(line).map_err(|source| {
                InputError::Parse {
                    line: Some(idx + 1),
                    source,
                }
            })?;
            raw.push(event);
        }
        raw
    };

    raw.into_iter()
        .enumerate()
        .map(|(index, record)| normalize(index, record))
        .collect()
}

fn normalize(index: usize, record: RawEvent) -> Result<Event, InputError> {
    let value = match record.timestamp {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(InputError::MissingTimestamp { index }),
    };
    let timestamp =
        parse_timestamp(&value).ok_or(InputError::InvalidTimestamp { index, value })?;
    Ok(Event::new(timestamp, record.duration))
}

/// Read and validate an input file into an [`EventStore`].
pub fn load_event_store(path: impl AsRef<Path>) -> Result<EventStore, InputError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let events = parse_events(&content)?;
    log::debug!("Parsed {} events from {}", events.len(), path.display());
    EventStore::new(events)
}
