use super::output::occurrences;
use super::table::{Binding, BindingTable, BindingTables};
use crate::dependency_graph::ArcSets;
use crate::trace::{Activity, TraceSet};

/// Replay every trace and tally the input bindings of each activity
///
/// The window of the first occurrence runs from the start of the trace up to
/// and including that occurrence. Every later window runs from the previous
/// occurrence up to and including the current one. A predecessor counts from
/// its last position before the closing occurrence, and is dropped when one
/// of its other successors appears in between.
pub fn discover_input_bindings(traces: &TraceSet, arcs: &ArcSets) -> BindingTables {
    let mut tables = BindingTables::new();

    for (activity, predecessors) in &arcs.in_arcs {
        let mut table = BindingTable::new();

        for trace in traces.values() {
            let positions = occurrences(trace, activity);
            for (k, &close) in positions.iter().enumerate() {
                let open = if k == 0 { 0 } else { positions[k - 1] };
                // Exclusive of the closing occurrence
                let window = &trace[open..close];
                table.record(window_binding(window, activity, predecessors.iter(), arcs));
            }
        }

        tables.insert(activity.clone(), table);
    }

    tracing::debug!(
        activities = tables.len(),
        observations = tables.values().map(BindingTable::total).sum::<usize>(),
        "input bindings discovered"
    );

    tables
}

fn window_binding<'a>(
    window: &[Activity],
    activity: &str,
    predecessors: impl Iterator<Item = &'a Activity>,
    arcs: &ArcSets,
) -> Binding {
    predecessors
        .filter(|predecessor| {
            let Some(position) = window.iter().rposition(|label| label == *predecessor) else {
                return false;
            };
            let between = &window[position + 1..];
            !arcs
                .outputs(predecessor)
                .any(|rival| rival.as_str() != activity && between.contains(rival))
        })
        .cloned()
        .collect()
}
