//! JSON output format for discovered causal nets
//!
//! One document per run, one entry per entity type. Binding tables are
//! rendered as `[{"binding": [...], "count": n}]` lists since bindings are
//! not valid JSON object keys.

use crate::bindings::BindingTables;
use crate::dependency::DependencyTable;
use crate::dependency_graph::{EdgeKind, Node};
use crate::discovery::CausalNet;
use crate::frequency::{ActivityTotals, FrequencyTable};
use crate::long_distance::LongDistanceTable;
use crate::trace::{top_variants, TraceSet};
use serde::Serialize;

/// A graph node; synthetic boundary nodes are flagged
#[derive(Debug, Clone, Serialize)]
pub struct JsonNode {
    pub name: String,
    pub synthetic: bool,
}

impl From<&Node> for JsonNode {
    fn from(node: &Node) -> Self {
        Self {
            name: node.to_string(),
            synthetic: node.is_synthetic(),
        }
    }
}

/// A graph edge
#[derive(Debug, Clone, Serialize)]
pub struct JsonEdge {
    pub source: String,
    pub target: String,
    /// "plain" or "long_distance"
    pub kind: &'static str,
    /// Long-distance score rounded to two decimals, e.g. "(0.95)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Unrounded long-distance score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A trace variant with its frequency
#[derive(Debug, Clone, Serialize)]
pub struct JsonVariant {
    pub trace: Vec<String>,
    pub count: usize,
}

/// Everything discovered for one entity type
#[derive(Debug, Clone, Serialize)]
pub struct JsonCausalNet<'a> {
    pub entity_type: String,
    pub traces: usize,
    /// SHA-256 of edges and bindings
    pub fingerprint: String,
    pub activity_totals: &'a ActivityTotals,
    pub frequencies: &'a FrequencyTable,
    pub dependencies: &'a DependencyTable,
    pub long_distance: &'a LongDistanceTable,
    pub nodes: Vec<JsonNode>,
    pub edges: Vec<JsonEdge>,
    pub start: Vec<String>,
    pub end: Vec<String>,
    pub output_bindings: &'a BindingTables,
    pub input_bindings: &'a BindingTables,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<JsonVariant>,
}

/// Totals over all entity types
#[derive(Debug, Clone, Default, Serialize)]
pub struct JsonSummary {
    pub entity_types: usize,
    pub total_traces: usize,
    pub total_edges: usize,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub entity_types: Vec<JsonCausalNet<'a>>,
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "causanet-json-v1".to_string(),
            entity_types: Vec::new(),
            summary: JsonSummary::default(),
        }
    }

    /// Add the net of one entity type, with its `variants` most frequent traces
    pub fn add_entity_type(
        &mut self,
        entity_type: &str,
        traces: &TraceSet,
        net: &'a CausalNet,
        variants: usize,
    ) {
        let edges: Vec<JsonEdge> = net
            .graph
            .edges()
            .iter()
            .map(|edge| JsonEdge {
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                kind: match edge.kind {
                    EdgeKind::Plain => "plain",
                    EdgeKind::LongDistance(_) => "long_distance",
                },
                label: edge.label(),
                score: match edge.kind {
                    EdgeKind::Plain => None,
                    EdgeKind::LongDistance(score) => Some(score),
                },
            })
            .collect();

        self.summary.entity_types += 1;
        self.summary.total_traces += traces.len();
        self.summary.total_edges += edges.len();

        self.entity_types.push(JsonCausalNet {
            entity_type: entity_type.to_string(),
            traces: traces.len(),
            fingerprint: net.fingerprint(),
            activity_totals: &net.activity_totals,
            frequencies: &net.frequencies,
            dependencies: &net.dependencies,
            long_distance: &net.long_distance,
            nodes: net.graph.nodes().map(JsonNode::from).collect(),
            edges,
            start: net.graph.start_nodes().iter().map(Node::to_string).collect(),
            end: net.graph.end_nodes().iter().map(Node::to_string).collect(),
            output_bindings: &net.output_bindings,
            input_bindings: &net.input_bindings,
            variants: top_variants(traces, variants)
                .into_iter()
                .map(|(trace, count)| JsonVariant { trace, count })
                .collect(),
        });
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for JsonOutput<'_> {
    fn default() -> Self {
        Self::new()
    }
}
