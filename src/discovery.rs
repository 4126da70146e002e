//! Full discovery pipeline
//!
//! ```text
//! traces -> totals + frequencies -> dependencies -> long-distance
//!        -> dependency graph -> arc sets -> output / input bindings
//! ```
//!
//! Every stage consumes finished, immutable structures from the previous one.
//! Runs share no state, so entity types are discovered concurrently.

use crate::bindings::{discover_input_bindings, discover_output_bindings, BindingTables};
use crate::config::DiscoveryConfig;
use crate::dependency::{Boundary, DependencyTable};
use crate::dependency_graph::{admitted_activities, ArcSets, DependencyGraph};
use crate::frequency::{activity_totals, ActivityTotals, FrequencyTable};
use crate::long_distance::LongDistanceTable;
use crate::trace::TraceSet;
use anyhow::{anyhow, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Everything discovered for one entity type
#[derive(Debug, Clone)]
pub struct CausalNet {
    pub activity_totals: ActivityTotals,
    pub frequencies: FrequencyTable,
    pub dependencies: DependencyTable,
    pub long_distance: LongDistanceTable,
    pub graph: DependencyGraph,
    pub arcs: ArcSets,
    pub output_bindings: BindingTables,
    pub input_bindings: BindingTables,
}

/// Canonical JSON form of a discovered model: sorted edges plus bindings
#[derive(Debug, Serialize)]
pub struct CanonicalModel<'a> {
    /// `(source, target, label)` triples in sorted order
    pub edges: Vec<(String, String, Option<String>)>,
    pub output_bindings: &'a BindingTables,
    pub input_bindings: &'a BindingTables,
}

impl CausalNet {
    /// The edge set and both binding tables in a deterministic order
    pub fn canonical(&self) -> CanonicalModel<'_> {
        let mut edges: Vec<(String, String, Option<String>)> = self
            .graph
            .edges()
            .iter()
            .map(|edge| (edge.source.to_string(), edge.target.to_string(), edge.label()))
            .collect();
        edges.sort();

        CanonicalModel {
            edges,
            output_bindings: &self.output_bindings,
            input_bindings: &self.input_bindings,
        }
    }

    /// SHA-256 over the canonical JSON form, hex encoded
    ///
    /// Identical traces and thresholds always give the same fingerprint.
    pub fn fingerprint(&self) -> String {
        // Only strings, counts and string-keyed maps: serialization cannot fail
        let json = serde_json::to_vec(&self.canonical()).unwrap_or_default();
        hex::encode(Sha256::digest(&json))
    }
}

/// Discover the C-net of one entity type
///
/// # Example
/// ```
/// use causanet::config::DiscoveryConfig;
/// use causanet::discovery::discover;
/// use causanet::trace::trace_set;
///
/// let traces = trace_set([("t1", &["A", "B", "D"][..]), ("t2", &["A", "C", "D"][..])]);
/// let net = discover(&traces, &DiscoveryConfig::default());
///
/// assert_eq!(net.activity_totals["D"], 2);
/// assert_eq!(net.output_bindings["A"].total(), 2);
/// ```
pub fn discover(traces: &TraceSet, config: &DiscoveryConfig) -> CausalNet {
    let activity_totals = activity_totals(traces);
    let frequencies = FrequencyTable::from_traces(traces);
    let dependencies = DependencyTable::from_frequencies(&frequencies);

    let admitted = admitted_activities(&activity_totals, config.act_threshold);
    let boundary = Boundary::detect(&dependencies, &admitted);
    let long_distance = LongDistanceTable::detect(
        &activity_totals,
        traces,
        &boundary,
        config.abs_use_threshold,
        config.abs_threshold,
    );

    let graph = DependencyGraph::build(
        &activity_totals,
        &frequencies,
        &dependencies,
        &long_distance,
        config,
    );
    let arcs = graph.arc_sets();

    let output_bindings = discover_output_bindings(traces, &arcs);
    let input_bindings = discover_input_bindings(traces, &arcs);

    tracing::debug!(
        traces = traces.len(),
        activities = activity_totals.len(),
        edges = graph.edge_count(),
        "discovery complete"
    );

    CausalNet {
        activity_totals,
        frequencies,
        dependencies,
        long_distance,
        graph,
        arcs,
        output_bindings,
        input_bindings,
    }
}

/// Discover every entity type concurrently, one scoped thread per type
///
/// The result equals calling [`discover`] on each entity type in turn.
pub fn discover_all(
    trace_sets: &BTreeMap<String, TraceSet>,
    config: &DiscoveryConfig,
) -> Result<BTreeMap<String, CausalNet>> {
    let joined = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = trace_sets
            .iter()
            .map(|(entity_type, traces)| {
                let handle = scope.spawn(move |_| discover(traces, config));
                (entity_type, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(entity_type, handle)| {
                handle
                    .join()
                    .map(|net| (entity_type.clone(), net))
                    .map_err(|_| anyhow!("Discovery of entity type '{}' panicked", entity_type))
            })
            .collect::<Result<BTreeMap<_, _>>>()
    })
    .map_err(|_| anyhow!("Discovery worker panicked"))?;

    let nets = joined?;
    tracing::debug!(entity_types = nets.len(), "all entity types discovered");
    Ok(nets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency_graph::Node;
    use crate::trace::trace_set;

    fn sequence_log() -> TraceSet {
        trace_set([("t1", &["A", "B", "D"][..]), ("t2", &["A", "C", "D"][..])])
    }

    #[test]
    fn test_end_to_end_sequence() {
        let config = DiscoveryConfig {
            dependency_threshold: 0.3,
            ..DiscoveryConfig::default()
        };

        let net = discover(&sequence_log(), &config);

        assert_eq!(net.activity_totals["A"], 2);
        assert_eq!(net.activity_totals["B"], 1);
        assert_eq!(net.dependencies.get("A", "B"), 0.5);
        assert_eq!(net.dependencies.get("C", "D"), 0.5);
        assert_eq!(net.graph.edge_count(), 4);
        assert_eq!(net.graph.start_nodes().into_iter().collect::<Vec<_>>(), vec![Node::activity("A")]);
        assert_eq!(net.graph.end_nodes().into_iter().collect::<Vec<_>>(), vec![Node::activity("D")]);
        assert!(net.long_distance.is_empty());
    }

    #[test]
    fn test_empty_trace_set() {
        let net = discover(&TraceSet::new(), &DiscoveryConfig::default());

        assert!(net.activity_totals.is_empty());
        assert_eq!(net.graph.node_count(), 0);
        assert!(net.output_bindings.is_empty());
        assert!(net.input_bindings.is_empty());
    }

    #[test]
    fn test_single_activity_universe() {
        let traces = trace_set([("t1", &["solo"][..]), ("t2", &["solo"][..])]);

        let net = discover(&traces, &DiscoveryConfig::default());

        assert_eq!(net.graph.node_count(), 1);
        assert_eq!(net.graph.edge_count(), 0);
        assert!(net.graph.has_single_source_and_sink());
        assert!(net.output_bindings["solo"].is_empty());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let first = discover(&sequence_log(), &DiscoveryConfig::default());
        let second = discover(&sequence_log(), &DiscoveryConfig::default());

        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    #[test]
    fn test_fingerprint_hashes_canonical_json() {
        let net = discover(&sequence_log(), &DiscoveryConfig::default());

        let json = serde_json::to_value(net.canonical()).unwrap();
        let edges = json["edges"].as_array().unwrap();
        assert_eq!(edges.len(), net.graph.edge_count());
        assert_eq!(edges[0], serde_json::json!(["A", "B", null]));
        assert_eq!(json["output_bindings"]["A"][0]["count"], 1);

        let bytes = serde_json::to_vec(&net.canonical()).unwrap();
        assert_eq!(net.fingerprint(), hex::encode(Sha256::digest(&bytes)));
    }

    #[test]
    fn test_fingerprint_changes_with_model() {
        let other = trace_set([("t1", &["A", "B", "D"][..])]);

        let first = discover(&sequence_log(), &DiscoveryConfig::default());
        let second = discover(&other, &DiscoveryConfig::default());

        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_discover_all_matches_sequential() {
        let mut trace_sets = BTreeMap::new();
        trace_sets.insert("order".to_string(), sequence_log());
        trace_sets.insert(
            "item".to_string(),
            trace_set([("i1", &["pick", "pack", "ship"][..]), ("i2", &["pick", "ship"][..])]),
        );
        let config = DiscoveryConfig::default();

        let nets = discover_all(&trace_sets, &config).unwrap();

        assert_eq!(nets.len(), 2);
        for (entity_type, traces) in &trace_sets {
            let sequential = discover(traces, &config);
            assert_eq!(nets[entity_type].fingerprint(), sequential.fingerprint());
        }
    }

    #[test]
    fn test_discover_all_empty() {
        let nets = discover_all(&BTreeMap::new(), &DiscoveryConfig::default()).unwrap();
        assert!(nets.is_empty());
    }
}
