//! CSV output format for discovered dependency graphs
//!
//! One row per edge, for spreadsheet analysis and graph import tools.

use crate::dependency_graph::EdgeKind;
use crate::discovery::CausalNet;

/// CSV record for a single edge
#[derive(Debug, Clone)]
pub struct CsvEdge {
    pub entity_type: String,
    pub source: String,
    pub target: String,
    pub kind: &'static str,
    pub label: Option<String>,
}

/// CSV output formatter
#[derive(Debug, Default)]
pub struct CsvOutput {
    edges: Vec<CsvEdge>,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every edge of one entity type's graph
    pub fn add_net(&mut self, entity_type: &str, net: &CausalNet) {
        for edge in net.graph.edges() {
            self.edges.push(CsvEdge {
                entity_type: entity_type.to_string(),
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                kind: match edge.kind {
                    EdgeKind::Plain => "plain",
                    EdgeKind::LongDistance(_) => "long_distance",
                },
                label: edge.label(),
            });
        }
    }

    fn header() -> &'static str {
        "entity_type,source,target,kind,label"
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_edge(edge: &CsvEdge) -> String {
        [
            Self::escape_field(&edge.entity_type),
            Self::escape_field(&edge.source),
            Self::escape_field(&edge.target),
            edge.kind.to_string(),
            Self::escape_field(edge.label.as_deref().unwrap_or("")),
        ]
        .join(",")
    }

    /// Header plus one line per edge, newline terminated
    pub fn to_csv(&self) -> String {
        let mut output = String::from(Self::header());
        output.push('\n');
        for edge in &self.edges {
            output.push_str(&Self::format_edge(edge));
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::discovery::discover;
    use crate::trace::trace_set;

    #[test]
    fn test_csv_header_only_when_empty() {
        assert_eq!(CsvOutput::new().to_csv(), "entity_type,source,target,kind,label\n");
    }

    #[test]
    fn test_csv_escape_field_simple() {
        assert_eq!(CsvOutput::escape_field("pay"), "pay");
    }

    #[test]
    fn test_csv_escape_field_with_comma() {
        assert_eq!(CsvOutput::escape_field("check, then pay"), "\"check, then pay\"");
    }

    #[test]
    fn test_csv_escape_field_with_quote() {
        assert_eq!(CsvOutput::escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_rows_per_edge() {
        let traces = trace_set([("t1", &["A", "B", "D"][..]), ("t2", &["A", "C", "D"][..])]);
        let net = discover(&traces, &DiscoveryConfig::default());
        let mut output = CsvOutput::new();
        output.add_net("order", &net);

        let csv = output.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines.contains(&"order,A,B,plain,"));
        assert!(lines.contains(&"order,C,D,plain,"));
    }

    #[test]
    fn test_csv_long_distance_label_column() {
        let edge = CsvEdge {
            entity_type: "default".to_string(),
            source: "A".to_string(),
            target: "D".to_string(),
            kind: "long_distance",
            label: Some("(0.95)".to_string()),
        };

        assert_eq!(CsvOutput::format_edge(&edge), "default,A,D,long_distance,(0.95)");
    }
}
