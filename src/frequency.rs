//! Activity totals and the directly-follows frequency table
//!
//! This is the first stage of discovery. Every later stage reads from the
//! structures built here and never writes back.

use crate::trace::{Activity, TraceSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Occurrence count of every activity across all traces
pub type ActivityTotals = BTreeMap<Activity, u64>;

/// Count every label occurrence across every trace
///
/// # Example
/// ```
/// use causanet::frequency::activity_totals;
/// use causanet::trace::trace_set;
///
/// let traces = trace_set([("t1", &["A", "B", "D"][..]), ("t2", &["A", "C", "D"][..])]);
/// let totals = activity_totals(&traces);
///
/// assert_eq!(totals["A"], 2);
/// assert_eq!(totals["B"], 1);
/// ```
pub fn activity_totals(traces: &TraceSet) -> ActivityTotals {
    let mut totals = ActivityTotals::new();
    for trace in traces.values() {
        for activity in trace {
            *totals.entry(activity.clone()).or_insert(0) += 1;
        }
    }
    totals
}

/// Directly-follows counts: `a -> b -> number of times b immediately followed a`
///
/// The table is square over the activity universe: every activity owns a row
/// and a (possibly zero) self entry. Missing cells read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    rows: BTreeMap<Activity, BTreeMap<Activity, u64>>,
}

impl FrequencyTable {
    /// Aggregate adjacent pairs `(trace[i], trace[i + 1])` over all traces
    ///
    /// # Example
    /// ```
    /// use causanet::frequency::FrequencyTable;
    /// use causanet::trace::trace_set;
    ///
    /// let traces = trace_set([("t1", &["A", "B", "A", "B"][..])]);
    /// let freq = FrequencyTable::from_traces(&traces);
    ///
    /// assert_eq!(freq.get("A", "B"), 2);
    /// assert_eq!(freq.get("B", "A"), 1);
    /// assert_eq!(freq.get("A", "A"), 0);
    /// ```
    pub fn from_traces(traces: &TraceSet) -> Self {
        let mut rows: BTreeMap<Activity, BTreeMap<Activity, u64>> = BTreeMap::new();

        for trace in traces.values() {
            // Single-event traces still contribute their activity to the universe
            for activity in trace {
                rows.entry(activity.clone()).or_default();
            }

            for pair in trace.windows(2) {
                *rows
                    .entry(pair[0].clone())
                    .or_default()
                    .entry(pair[1].clone())
                    .or_insert(0) += 1;
            }
        }

        for (activity, row) in rows.iter_mut() {
            row.entry(activity.clone()).or_insert(0);
        }

        tracing::trace!(activities = rows.len(), "built frequency table");

        Self { rows }
    }

    /// Count of `b` immediately following `a` (0 when never observed)
    pub fn get(&self, a: &str, b: &str) -> u64 {
        self.rows
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0)
    }

    /// Row of observed successors for `a`, including its self entry
    pub fn successors(&self, a: &str) -> Option<&BTreeMap<Activity, u64>> {
        self.rows.get(a)
    }

    /// Activities that immediately precede `b` at least once (column inspection)
    pub fn predecessors(&self, b: &str) -> BTreeSet<&Activity> {
        self.rows
            .iter()
            .filter(|(_, row)| row.get(b).is_some_and(|&count| count > 0))
            .map(|(activity, _)| activity)
            .collect()
    }

    /// The activity universe, in sorted order
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.rows.keys()
    }

    /// Iterate over `(activity, successor row)` pairs
    pub fn rows(&self) -> impl Iterator<Item = (&Activity, &BTreeMap<Activity, u64>)> {
        self.rows.iter()
    }

    /// Number of activities in the universe
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no trace contributed any activity
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::trace_set;

    #[test]
    fn test_totals_count_every_occurrence() {
        let traces = trace_set([
            ("t1", &["A", "B", "D"][..]),
            ("t2", &["A", "C", "D"][..]),
        ]);

        let totals = activity_totals(&traces);

        assert_eq!(totals.len(), 4);
        assert_eq!(totals["A"], 2);
        assert_eq!(totals["B"], 1);
        assert_eq!(totals["C"], 1);
        assert_eq!(totals["D"], 2);
    }

    #[test]
    fn test_empty_traces_give_empty_tables() {
        let traces = trace_set([("t1", &[][..])]);

        assert!(activity_totals(&traces).is_empty());
        assert!(FrequencyTable::from_traces(&traces).is_empty());
    }

    #[test]
    fn test_every_activity_has_self_entry() {
        let traces = trace_set([("t1", &["A", "B"][..])]);
        let freq = FrequencyTable::from_traces(&traces);

        assert_eq!(freq.successors("A").unwrap().get("A"), Some(&0));
        assert_eq!(freq.successors("B").unwrap().get("B"), Some(&0));
    }

    #[test]
    fn test_successor_gets_top_level_row() {
        let traces = trace_set([("t1", &["A", "B"][..])]);
        let freq = FrequencyTable::from_traces(&traces);

        let activities: Vec<_> = freq.activities().cloned().collect();
        assert_eq!(activities, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_single_event_trace_joins_universe() {
        let traces = trace_set([("t1", &["solo"][..])]);
        let freq = FrequencyTable::from_traces(&traces);

        assert_eq!(freq.len(), 1);
        assert_eq!(freq.get("solo", "solo"), 0);
    }

    #[test]
    fn test_self_loop_counted() {
        let traces = trace_set([("t1", &["A", "A", "A", "B"][..])]);
        let freq = FrequencyTable::from_traces(&traces);

        assert_eq!(freq.get("A", "A"), 2);
        assert_eq!(freq.get("A", "B"), 1);
    }

    #[test]
    fn test_counts_accumulate_across_traces() {
        let traces = trace_set([
            ("t1", &["A", "B"][..]),
            ("t2", &["A", "B"][..]),
            ("t3", &["B", "A"][..]),
        ]);
        let freq = FrequencyTable::from_traces(&traces);

        assert_eq!(freq.get("A", "B"), 2);
        assert_eq!(freq.get("B", "A"), 1);
        assert_eq!(freq.get("A", "missing"), 0);
    }

    #[test]
    fn test_predecessors_by_column() {
        let traces = trace_set([
            ("t1", &["A", "C"][..]),
            ("t2", &["B", "C"][..]),
            ("t3", &["C", "D"][..]),
        ]);
        let freq = FrequencyTable::from_traces(&traces);

        let preds: Vec<_> = freq.predecessors("C").into_iter().cloned().collect();
        assert_eq!(preds, vec!["A".to_string(), "B".to_string()]);

        let preds: Vec<_> = freq.predecessors("D").into_iter().cloned().collect();
        assert_eq!(preds, vec!["C".to_string()]);

        assert!(freq.predecessors("A").is_empty());
    }
}
