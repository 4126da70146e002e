//! Human-readable summary of a discovered causal net

use crate::bindings::BindingTables;
use crate::dependency_graph::Node;
use crate::discovery::CausalNet;
use crate::trace::{top_variants, TraceSet};
use std::collections::BTreeSet;
use std::io::{self, Write};

fn join_nodes(nodes: &BTreeSet<Node>) -> String {
    nodes
        .iter()
        .map(Node::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_bindings<W: Write>(out: &mut W, title: &str, tables: &BindingTables) -> io::Result<()> {
    writeln!(out, "{}:", title)?;
    for (activity, table) in tables.iter().filter(|(_, table)| !table.is_empty()) {
        let entries: Vec<String> = table
            .iter()
            .map(|(binding, count)| format!("{} x{}", binding, count))
            .collect();
        writeln!(out, "  {}: {}", activity, entries.join(", "))?;
    }
    Ok(())
}

/// Write the summary of one entity type
pub fn write_summary<W: Write>(
    out: &mut W,
    entity_type: &str,
    traces: &TraceSet,
    net: &CausalNet,
    variants: usize,
) -> io::Result<()> {
    writeln!(
        out,
        "=== {} ({} traces, {} activities) ===",
        entity_type,
        traces.len(),
        net.activity_totals.len()
    )?;
    writeln!(out, "start: {}", join_nodes(&net.graph.start_nodes()))?;
    writeln!(out, "end: {}", join_nodes(&net.graph.end_nodes()))?;

    writeln!(out, "edges ({}):", net.graph.edge_count())?;
    for edge in net.graph.edges() {
        match edge.label() {
            Some(label) => writeln!(out, "  {} -> {} {}", edge.source, edge.target, label)?,
            None => writeln!(out, "  {} -> {}", edge.source, edge.target)?,
        }
    }

    write_bindings(out, "output bindings", &net.output_bindings)?;
    write_bindings(out, "input bindings", &net.input_bindings)?;

    if variants > 0 {
        writeln!(out, "top variants:")?;
        for (trace, count) in top_variants(traces, variants) {
            writeln!(out, "  {:>5}  {}", count, trace.join(", "))?;
        }
    }

    writeln!(out, "fingerprint: {}", net.fingerprint())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::discovery::discover;
    use crate::trace::trace_set;

    fn render(traces: &TraceSet, variants: usize) -> String {
        let net = discover(traces, &DiscoveryConfig::default());
        let mut buffer = Vec::new();
        write_summary(&mut buffer, "default", traces, &net, variants).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_summary_sections() {
        let traces = trace_set([("t1", &["A", "B", "D"][..]), ("t2", &["A", "C", "D"][..])]);

        let text = render(&traces, 2);

        assert!(text.starts_with("=== default (2 traces, 4 activities) ==="));
        assert!(text.contains("start: A\n"));
        assert!(text.contains("end: D\n"));
        assert!(text.contains("  A -> B\n"));
        assert!(text.contains("  A: (B) x1, (C) x1\n"));
        assert!(text.contains("top variants:"));
        assert!(text.contains("fingerprint: "));
    }

    #[test]
    fn test_summary_without_variants() {
        let traces = trace_set([("t1", &["A", "B"][..])]);

        let text = render(&traces, 0);

        assert!(!text.contains("top variants:"));
    }
}
