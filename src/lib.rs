//! Causanet - causal-net (C-net) discovery from event logs
//!
//! This library turns traces (ordered activity sequences, one per tracked
//! entity) into a causal net: a dependency graph with a single source and
//! sink, plus the AND/OR bindings observed on every activity's inputs and
//! outputs. Discovery runs in five stages, each consuming the finished
//! output of the previous one:
//!
//! 1. [`frequency`]: activity totals and directly-follows counts
//! 2. [`dependency`]: dependency measures, start/end detection
//! 3. [`long_distance`]: indirect follows relations
//! 4. [`dependency_graph`]: edges with connectivity guarantees
//! 5. [`bindings`]: split and join bindings by trace replay
//!
//! [`discovery::discover`] runs the whole pipeline for one entity type and
//! [`discovery::discover_all`] runs it for every entity type of a log.

pub mod bindings;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod dependency;
pub mod dependency_graph;
pub mod discovery;
pub mod event_log;
pub mod frequency;
pub mod json_output;
pub mod long_distance;
pub mod text_output;
pub mod trace;
