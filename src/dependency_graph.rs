//! Dependency graph construction with connectivity guarantees
//!
//! The builder turns dependency and long-distance scores into a directed graph
//! with exactly one source and one sink. Construction is strictly additive:
//!
//! ```text
//! 1. admit activities with total >= act_threshold
//! 2. detect original starts / ends
//! 3. primary edges        (|a => b| > dependency_threshold, else best successors)
//! 4. missing-incoming     (best predecessor by column)
//! 5. boundary             (synthetic `start` / `end` when there are several)
//! 6. singleton predecessor (the only activity that ever precedes a node)
//! 7. long-distance edges  (LDD(a, b) > long_distance_threshold)
//! ```
//!
//! Later steps only add missing connectivity. No edge is ever removed, and a
//! second edge between the same ordered pair is suppressed.

use crate::config::DiscoveryConfig;
use crate::dependency::{strongest, Boundary, DependencyTable};
use crate::frequency::{ActivityTotals, FrequencyTable};
use crate::long_distance::LongDistanceTable;
use crate::trace::Activity;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// Graph node: an activity, or one of the synthetic boundary nodes
///
/// Synthetic nodes are distinct variants, so an activity literally labelled
/// "start" never collides with the synthetic start.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    Start,
    Activity(Activity),
    End,
}

impl Node {
    /// Activity node for `label`
    pub fn activity(label: impl Into<Activity>) -> Self {
        Node::Activity(label.into())
    }

    /// The activity label, or `None` for synthetic nodes
    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            Node::Activity(activity) => Some(activity),
            Node::Start | Node::End => None,
        }
    }

    /// True for the inserted `start`/`end` nodes
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, Node::Activity(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Start => write!(f, "start"),
            Node::Activity(activity) => write!(f, "{}", activity),
            Node::End => write!(f, "end"),
        }
    }
}

/// Ordinary dependency edge, or a long-distance edge carrying its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeKind {
    Plain,
    LongDistance(f64),
}

/// Directed edge of the dependency graph
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: Node,
    pub target: Node,
    pub kind: EdgeKind,
}

impl Edge {
    /// Ordinary dependency edge
    pub fn plain(source: Node, target: Node) -> Self {
        Self {
            source,
            target,
            kind: EdgeKind::Plain,
        }
    }

    /// Long-distance edge labelled with its score
    pub fn long_distance(source: Node, target: Node, score: f64) -> Self {
        Self {
            source,
            target,
            kind: EdgeKind::LongDistance(score),
        }
    }

    /// Display label: the long-distance score rounded to two decimals
    ///
    /// # Example
    /// ```
    /// use causanet::dependency_graph::{Edge, Node};
    ///
    /// let edge = Edge::long_distance(Node::activity("A"), Node::activity("D"), 0.9523);
    /// assert_eq!(edge.label().as_deref(), Some("(0.95)"));
    /// ```
    pub fn label(&self) -> Option<String> {
        match self.kind {
            EdgeKind::Plain => None,
            EdgeKind::LongDistance(score) => Some(format!("({:.2})", score)),
        }
    }

    /// True when the edge came from long-distance detection
    pub fn is_long_distance(&self) -> bool {
        matches!(self.kind, EdgeKind::LongDistance(_))
    }

    /// True when source and target are the same node
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Per-activity predecessor and successor sets projected from plain edges
///
/// Synthetic nodes and long-distance edges are excluded. Every activity node
/// has an entry, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcSets {
    pub in_arcs: BTreeMap<Activity, BTreeSet<Activity>>,
    pub out_arcs: BTreeMap<Activity, BTreeSet<Activity>>,
}

impl ArcSets {
    /// Predecessor arcs of `activity` (empty for unknown activities)
    pub fn inputs(&self, activity: &str) -> impl Iterator<Item = &Activity> {
        self.in_arcs.get(activity).into_iter().flatten()
    }

    /// Successor arcs of `activity` (empty for unknown activities)
    pub fn outputs(&self, activity: &str) -> impl Iterator<Item = &Activity> {
        self.out_arcs.get(activity).into_iter().flatten()
    }
}

/// Activities whose total count reaches `act_threshold`
pub fn admitted_activities(totals: &ActivityTotals, act_threshold: u64) -> BTreeSet<Activity> {
    totals
        .iter()
        .filter(|(_, &count)| count >= act_threshold)
        .map(|(activity, _)| activity.clone())
        .collect()
}

/// Connected dependency graph with a single source and a single sink
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: BTreeSet<Node>,
    edges: Vec<Edge>,
    /// Ordered pairs already connected, regardless of edge kind
    connected: BTreeSet<(Node, Node)>,
    original_starts: BTreeSet<Activity>,
    original_ends: BTreeSet<Activity>,
}

impl DependencyGraph {
    /// Build the graph from the tables of one discovery run
    ///
    /// # Example
    /// ```
    /// use causanet::config::DiscoveryConfig;
    /// use causanet::dependency::DependencyTable;
    /// use causanet::dependency_graph::{DependencyGraph, Node};
    /// use causanet::frequency::{activity_totals, FrequencyTable};
    /// use causanet::long_distance::LongDistanceTable;
    /// use causanet::trace::trace_set;
    ///
    /// let traces = trace_set([("t1", &["A", "B", "D"][..]), ("t2", &["A", "C", "D"][..])]);
    /// let totals = activity_totals(&traces);
    /// let freq = FrequencyTable::from_traces(&traces);
    /// let dep = DependencyTable::from_frequencies(&freq);
    /// let config = DiscoveryConfig { dependency_threshold: 0.3, ..Default::default() };
    ///
    /// let graph = DependencyGraph::build(&totals, &freq, &dep, &LongDistanceTable::default(), &config);
    ///
    /// assert_eq!(graph.edge_count(), 4);
    /// assert!(graph.contains_edge(&Node::activity("A"), &Node::activity("B")));
    /// assert!(graph.has_single_source_and_sink());
    /// ```
    pub fn build(
        totals: &ActivityTotals,
        frequencies: &FrequencyTable,
        dependencies: &DependencyTable,
        long_distance: &LongDistanceTable,
        config: &DiscoveryConfig,
    ) -> Self {
        let admitted = admitted_activities(totals, config.act_threshold);
        let boundary = Boundary::detect(dependencies, &admitted);

        let mut graph = Self {
            nodes: admitted.iter().cloned().map(Node::Activity).collect(),
            edges: Vec::new(),
            connected: BTreeSet::new(),
            original_starts: boundary.starts,
            original_ends: boundary.ends,
        };

        if admitted.is_empty() {
            tracing::debug!("empty activity universe, graph has no nodes");
            return graph;
        }

        graph.add_primary_edges(dependencies, &admitted, config.dependency_threshold);
        tracing::debug!(edges = graph.edges.len(), "primary edges added");

        graph.repair_missing_incoming(dependencies, &admitted);
        graph.normalize_boundary();
        graph.repair_singleton_predecessors(frequencies, &admitted);
        tracing::debug!(edges = graph.edges.len(), "connectivity repaired");

        graph.add_long_distance_edges(long_distance, config.long_distance_threshold);
        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            starts = graph.original_starts.len(),
            ends = graph.original_ends.len(),
            "dependency graph built"
        );

        graph
    }

    fn add_edge(&mut self, edge: Edge) -> bool {
        let key = (edge.source.clone(), edge.target.clone());
        if !self.connected.insert(key) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    fn add_primary_edges(
        &mut self,
        dependencies: &DependencyTable,
        admitted: &BTreeSet<Activity>,
        threshold: f64,
    ) {
        for a in admitted {
            if self.original_ends.contains(a) {
                continue;
            }
            let Some(row) = dependencies.row(a) else {
                continue;
            };

            let mut selected: BTreeSet<Activity> = row
                .iter()
                .filter(|(b, &score)| score > threshold && admitted.contains(*b))
                .map(|(b, _)| b.clone())
                .collect();

            if selected.is_empty() {
                selected = dependencies
                    .best_successors(a)
                    .into_iter()
                    .filter(|b| admitted.contains(b))
                    .collect();
            }

            // A lone self-loop leads nowhere: also take the strongest other successor
            if selected.iter().all(|b| b == a) {
                selected.extend(strongest(
                    row.iter()
                        .filter(|(b, _)| *b != a && admitted.contains(*b))
                        .map(|(b, &score)| (b, score)),
                ));
            }

            for b in selected {
                self.add_edge(Edge::plain(Node::activity(a.clone()), Node::Activity(b)));
            }
        }
    }

    fn repair_missing_incoming(&mut self, dependencies: &DependencyTable, admitted: &BTreeSet<Activity>) {
        for n in admitted {
            if self.original_starts.contains(n) {
                continue;
            }
            let node = Node::activity(n.clone());
            if self.in_degree(&node) > 0 {
                continue;
            }

            let predecessors = strongest(
                dependencies
                    .column(n)
                    .filter(|(p, _)| *p != n && admitted.contains(*p)),
            );
            for p in predecessors {
                tracing::trace!(%p, %n, "repairing missing incoming edge");
                self.add_edge(Edge::plain(Node::Activity(p), node.clone()));
            }
        }
    }

    fn normalize_boundary(&mut self) {
        if self.original_starts.len() > 1 {
            self.nodes.insert(Node::Start);
            for start in self.original_starts.clone() {
                self.add_edge(Edge::plain(Node::Start, Node::Activity(start)));
            }
        }

        if self.original_ends.len() > 1 {
            self.nodes.insert(Node::End);
            for end in self.original_ends.clone() {
                self.add_edge(Edge::plain(Node::Activity(end), Node::End));
            }
        }
    }

    fn repair_singleton_predecessors(&mut self, frequencies: &FrequencyTable, admitted: &BTreeSet<Activity>) {
        // Without a synthetic boundary node, an edge into the sole start or out
        // of the sole end would leave the graph without a source or sink
        let protect_start = !self.nodes.contains(&Node::Start);
        let protect_end = !self.nodes.contains(&Node::End);

        for n in admitted {
            if protect_start && self.original_starts.contains(n) {
                continue;
            }

            let predecessors = frequencies.predecessors(n);
            if predecessors.len() != 1 {
                continue;
            }
            let Some(p) = predecessors.into_iter().next() else {
                continue;
            };

            if p == n || !admitted.contains(p) {
                continue;
            }
            if protect_end && self.original_ends.contains(p) {
                continue;
            }

            if self.add_edge(Edge::plain(Node::activity(p.clone()), Node::activity(n.clone()))) {
                tracing::trace!(%p, %n, "connected singleton predecessor");
            }
        }
    }

    fn add_long_distance_edges(&mut self, long_distance: &LongDistanceTable, threshold: f64) {
        let sources: Vec<Activity> = self
            .nodes
            .iter()
            .filter_map(Node::as_activity)
            .filter(|a| !self.original_ends.contains(*a))
            .cloned()
            .collect();

        for a in sources {
            for (k, score) in long_distance.targets(&a) {
                let target = Node::activity(k.clone());
                if score > threshold && !self.original_ends.contains(k) && self.nodes.contains(&target) {
                    self.add_edge(Edge::long_distance(Node::activity(a.clone()), target, score));
                }
            }
        }
    }

    /// All nodes, synthetic start first and synthetic end last
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes, synthetic ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges of both kinds
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Always true: dependency graphs are directed
    pub fn is_directed(&self) -> bool {
        true
    }

    /// True when `node` is in the graph
    pub fn contains_node(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    /// True when any edge (plain or long-distance) connects `source` to `target`
    pub fn contains_edge(&self, source: &Node, target: &Node) -> bool {
        self.connected.contains(&(source.clone(), target.clone()))
    }

    /// Long-distance edges only
    pub fn long_distance_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|edge| edge.is_long_distance())
    }

    /// Activities without a positive dependency from any other activity
    pub fn original_starts(&self) -> &BTreeSet<Activity> {
        &self.original_starts
    }

    /// Activities without a positive dependency towards any other activity
    pub fn original_ends(&self) -> &BTreeSet<Activity> {
        &self.original_ends
    }

    /// True when a synthetic `start` joins several original starts
    pub fn has_synthetic_start(&self) -> bool {
        self.nodes.contains(&Node::Start)
    }

    /// True when a synthetic `end` joins several original ends
    pub fn has_synthetic_end(&self) -> bool {
        self.nodes.contains(&Node::End)
    }

    /// The start node set: the synthetic start if inserted, else the original starts
    pub fn start_nodes(&self) -> BTreeSet<Node> {
        if self.has_synthetic_start() {
            BTreeSet::from([Node::Start])
        } else {
            self.original_starts.iter().cloned().map(Node::Activity).collect()
        }
    }

    /// The end node set: the synthetic end if inserted, else the original ends
    pub fn end_nodes(&self) -> BTreeSet<Node> {
        if self.has_synthetic_end() {
            BTreeSet::from([Node::End])
        } else {
            self.original_ends.iter().cloned().map(Node::Activity).collect()
        }
    }

    /// Incoming edges from other nodes (self-loops are not counted)
    pub fn in_degree(&self, node: &Node) -> usize {
        self.edges
            .iter()
            .filter(|edge| &edge.target == node && !edge.is_self_loop())
            .count()
    }

    /// Outgoing edges to other nodes (self-loops are not counted)
    pub fn out_degree(&self, node: &Node) -> usize {
        self.edges
            .iter()
            .filter(|edge| &edge.source == node && !edge.is_self_loop())
            .count()
    }

    /// Nodes without incoming edges
    pub fn sources(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| self.in_degree(node) == 0)
            .collect()
    }

    /// Nodes without outgoing edges
    pub fn sinks(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| self.out_degree(node) == 0)
            .collect()
    }

    /// Exactly one source and exactly one sink
    pub fn has_single_source_and_sink(&self) -> bool {
        self.sources().len() == 1 && self.sinks().len() == 1
    }

    /// Single source and sink, with every node reachable from the source
    pub fn is_connected(&self) -> bool {
        let sources = self.sources();
        match sources.as_slice() {
            [root] => self.sinks().len() == 1 && self.reachable_from(root).len() == self.nodes.len(),
            _ => false,
        }
    }

    /// Activities with a plain edge into `activity`
    pub fn in_arcs(&self, activity: &str) -> BTreeSet<Activity> {
        self.plain_activity_edges()
            .filter(|(_, target)| target.as_str() == activity)
            .map(|(source, _)| source.clone())
            .collect()
    }

    /// Activities with a plain edge out of `activity`
    pub fn out_arcs(&self, activity: &str) -> BTreeSet<Activity> {
        self.plain_activity_edges()
            .filter(|(source, _)| source.as_str() == activity)
            .map(|(_, target)| target.clone())
            .collect()
    }

    fn plain_activity_edges(&self) -> impl Iterator<Item = (&Activity, &Activity)> {
        self.edges
            .iter()
            .filter(|edge| !edge.is_long_distance())
            .filter_map(|edge| Some((edge.source.as_activity()?, edge.target.as_activity()?)))
    }

    /// Every node reachable from `root` (including `root`)
    pub fn reachable_from(&self, root: &Node) -> BTreeSet<Node> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.clone()) {
                continue;
            }
            for edge in self.edges.iter().filter(|edge| edge.source == node) {
                if !visited.contains(&edge.target) {
                    queue.push_back(edge.target.clone());
                }
            }
        }

        visited
    }

    /// Project plain edges between activity nodes into per-activity arc sets
    pub fn arc_sets(&self) -> ArcSets {
        let mut arcs = ArcSets::default();
        for activity in self.nodes.iter().filter_map(Node::as_activity) {
            arcs.in_arcs.insert(activity.clone(), BTreeSet::new());
            arcs.out_arcs.insert(activity.clone(), BTreeSet::new());
        }

        for (source, target) in self.plain_activity_edges() {
            arcs.out_arcs.entry(source.clone()).or_default().insert(target.clone());
            arcs.in_arcs.entry(target.clone()).or_default().insert(source.clone());
        }

        arcs
    }
}
