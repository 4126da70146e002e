//! Event-log reading and trace extraction
//!
//! Two input shapes are supported:
//!
//! - Delimited text, one event per line:
//!   `case_id;activity;resource;timestamp`. Events are grouped per case and
//!   stably sorted by timestamp string, so ISO-8601 timestamps replay in
//!   chronological order and ties keep file order.
//! - JSON, either `{"entity": ["A", "B"]}` for a single entity type, or
//!   `{"order": {"o1": ["A", "B"]}, "item": {...}}` keyed by entity type.
//!
//! Malformed input is rejected here; the discovery pipeline only ever sees
//! well-formed traces.

use crate::trace::{Trace, TraceSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Entity type assigned to delimited logs and flat JSON logs
pub const DEFAULT_ENTITY_TYPE: &str = "default";

/// Field separator of delimited logs unless configured otherwise
pub const DEFAULT_DELIMITER: char = ';';

const FIELDS_PER_EVENT: usize = 4;

/// Errors that can occur while reading an event log
#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("Event log not found: {0}")]
    FileNotFound(String),

    #[error("Line {line}: expected {expected} fields, found {found}")]
    MalformedLine {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: empty {field}")]
    EmptyField { line: usize, field: &'static str },

    #[error("Invalid JSON event log: {0}")]
    InvalidJson(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One row of a delimited log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub case_id: String,
    pub activity: String,
    pub resource: String,
    pub timestamp: String,
}

/// Traces grouped by entity type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    entity_types: BTreeMap<String, TraceSet>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLog {
    Flat(BTreeMap<String, Trace>),
    Nested(BTreeMap<String, TraceSet>),
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log holding a single entity type
    pub fn from_trace_set(entity_type: impl Into<String>, traces: TraceSet) -> Self {
        let mut log = Self::new();
        log.insert(entity_type, traces);
        log
    }

    /// Add (or replace) the traces of one entity type
    pub fn insert(&mut self, entity_type: impl Into<String>, traces: TraceSet) {
        self.entity_types.insert(entity_type.into(), traces);
    }

    /// Read a log from disk; `.json` files are parsed as JSON, anything else
    /// as delimited text
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Self, EventLogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EventLogError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let log = if is_json {
            Self::parse_json(&content)?
        } else {
            Self::parse_delimited(&content, delimiter)?
        };

        tracing::debug!(
            path = %path.display(),
            entity_types = log.entity_types.len(),
            traces = log.entity_types.values().map(TraceSet::len).sum::<usize>(),
            "event log loaded"
        );

        Ok(log)
    }

    /// Parse delimited text into a single-entity-type log
    ///
    /// # Example
    /// ```
    /// use causanet::event_log::EventLog;
    ///
    /// let content = "case;activity;resource;timestamp\n\
    ///                c1;pay;ann;2024-01-02\n\
    ///                c1;order;bob;2024-01-01\n";
    /// let log = EventLog::parse_delimited(content, ';')?;
    ///
    /// assert_eq!(log.traces("default").unwrap()["c1"], vec!["order", "pay"]);
    /// # Ok::<(), causanet::event_log::EventLogError>(())
    /// ```
    pub fn parse_delimited(content: &str, delimiter: char) -> Result<Self, EventLogError> {
        let events = parse_events(content, delimiter)?;
        let mut log = Self::new();
        if !events.is_empty() {
            log.insert(DEFAULT_ENTITY_TYPE, traces_from_events(events));
        }
        Ok(log)
    }

    /// Parse a flat or entity-type-keyed JSON log
    pub fn parse_json(content: &str) -> Result<Self, EventLogError> {
        let parsed: JsonLog =
            serde_json::from_str(content).map_err(|e| EventLogError::InvalidJson(e.to_string()))?;

        let mut log = Self::new();
        match parsed {
            JsonLog::Flat(traces) => {
                if !traces.is_empty() {
                    log.insert(DEFAULT_ENTITY_TYPE, traces);
                }
            }
            JsonLog::Nested(entity_types) => {
                for (entity_type, traces) in entity_types {
                    log.insert(entity_type, traces);
                }
            }
        }
        Ok(log)
    }

    /// Entity type names in sorted order
    pub fn entity_types(&self) -> impl Iterator<Item = &String> {
        self.entity_types.keys()
    }

    /// Traces of one entity type
    pub fn traces(&self, entity_type: &str) -> Option<&TraceSet> {
        self.entity_types.get(entity_type)
    }

    /// Keep only `entity_type`; other entity types are dropped
    pub fn retain_entity_type(&mut self, entity_type: &str) {
        self.entity_types.retain(|name, _| name == entity_type);
    }

    pub fn into_trace_sets(self) -> BTreeMap<String, TraceSet> {
        self.entity_types
    }

    pub fn len(&self) -> usize {
        self.entity_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_types.is_empty()
    }
}

/// Parse the events of a delimited log, in file order
pub fn parse_events(content: &str, delimiter: char) -> Result<Vec<Event>, EventLogError> {
    let mut events = Vec::new();
    let mut seen_content = false;

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(delimiter).map(str::trim).collect();

        if !seen_content {
            seen_content = true;
            if is_header(&fields) {
                continue;
            }
        }

        if fields.len() < FIELDS_PER_EVENT {
            return Err(EventLogError::MalformedLine {
                line,
                expected: FIELDS_PER_EVENT,
                found: fields.len(),
            });
        }
        if fields[0].is_empty() {
            return Err(EventLogError::EmptyField {
                line,
                field: "case id",
            });
        }
        if fields[1].is_empty() {
            return Err(EventLogError::EmptyField {
                line,
                field: "activity",
            });
        }

        events.push(Event {
            case_id: fields[0].to_string(),
            activity: fields[1].to_string(),
            resource: fields[2].to_string(),
            timestamp: fields[3].to_string(),
        });
    }

    Ok(events)
}

fn is_header(fields: &[&str]) -> bool {
    fields.get(1).is_some_and(|column| {
        column.eq_ignore_ascii_case("activity") || column.eq_ignore_ascii_case("concept:name")
    })
}

/// Group events per case and project each case onto its activity sequence
pub fn traces_from_events(events: Vec<Event>) -> TraceSet {
    let mut cases: BTreeMap<String, Vec<Event>> = BTreeMap::new();
    for event in events {
        cases.entry(event.case_id.clone()).or_default().push(event);
    }

    cases
        .into_iter()
        .map(|(case_id, mut events)| {
            events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            let trace = events.into_iter().map(|event| event.activity).collect();
            (case_id, trace)
        })
        .collect()
}
