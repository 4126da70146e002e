use super::table::{Binding, BindingTable, BindingTables};
use crate::dependency_graph::ArcSets;
use crate::trace::{Activity, TraceSet};

/// Replay every trace and tally the output bindings of each activity
///
/// An activation window runs from one occurrence of the activity up to (not
/// including) its next occurrence, or to the end of the trace. Every activity
/// of `arcs` gets a table, empty when nothing was observed.
///
/// # Example
/// ```
/// use causanet::bindings::{discover_output_bindings, Binding};
/// use causanet::dependency_graph::ArcSets;
/// use causanet::trace::trace_set;
/// use std::collections::BTreeSet;
///
/// let mut arcs = ArcSets::default();
/// arcs.out_arcs.insert("A".into(), BTreeSet::from(["B".into(), "C".into()]));
/// arcs.in_arcs.insert("B".into(), BTreeSet::from(["A".into()]));
/// arcs.in_arcs.insert("C".into(), BTreeSet::from(["A".into()]));
///
/// let traces = trace_set([("t1", &["A", "B", "C"][..])]);
/// let tables = discover_output_bindings(&traces, &arcs);
///
/// let and_split = Binding::new(["B".to_string(), "C".to_string()]);
/// assert_eq!(tables["A"].get(&and_split), 1);
/// ```
pub fn discover_output_bindings(traces: &TraceSet, arcs: &ArcSets) -> BindingTables {
    let mut tables = BindingTables::new();

    for (activity, successors) in &arcs.out_arcs {
        let mut table = BindingTable::new();

        for trace in traces.values() {
            let positions: Vec<usize> = occurrences(trace, activity);
            for (k, &start) in positions.iter().enumerate() {
                let end = positions.get(k + 1).copied().unwrap_or(trace.len());
                let window = &trace[start..end];
                table.record(window_binding(window, activity, successors.iter(), arcs));
            }
        }

        tables.insert(activity.clone(), table);
    }

    tracing::debug!(
        activities = tables.len(),
        observations = tables.values().map(BindingTable::total).sum::<usize>(),
        "output bindings discovered"
    );

    tables
}

fn window_binding<'a>(
    window: &[Activity],
    activity: &str,
    successors: impl Iterator<Item = &'a Activity>,
    arcs: &ArcSets,
) -> Binding {
    successors
        .filter(|successor| {
            if successor.as_str() == activity {
                return window.len() == 1;
            }
            // window[0] is the activation itself
            let Some(offset) = window[1..].iter().position(|label| label == *successor) else {
                return false;
            };
            let between = &window[1..1 + offset];
            !arcs
                .inputs(successor)
                .any(|rival| rival.as_str() != activity && between.contains(rival))
        })
        .cloned()
        .collect()
}

pub(super) fn occurrences(trace: &[Activity], activity: &str) -> Vec<usize> {
    trace
        .iter()
        .enumerate()
        .filter(|(_, label)| label.as_str() == activity)
        .map(|(position, _)| position)
        .collect()
}
