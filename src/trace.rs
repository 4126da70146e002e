//! Trace types and trace-variant statistics
//!
//! A trace is the ordered activity projection of one tracked entity's events.
//! The discovery pipeline only ever sees these label sequences; reading and
//! flattening logs happens in [`crate::event_log`].

use std::collections::{BTreeMap, HashMap};

/// Activity label (a step type, e.g. "create order")
pub type Activity = String;

/// Ordered sequence of activity labels for one tracked entity
pub type Trace = Vec<Activity>;

/// Traces keyed by entity identifier (case id or object id)
///
/// `BTreeMap` keeps replay order stable across runs.
pub type TraceSet = BTreeMap<String, Trace>;

/// A distinct trace (variant) and how many entities followed it
pub type Variant = (Trace, usize);

/// Build a [`TraceSet`] from `(entity, labels)` pairs
///
/// # Example
/// ```
/// use causanet::trace::trace_set;
///
/// let traces = trace_set([("t1", &["A", "B"][..]), ("t2", &["A", "C"][..])]);
/// assert_eq!(traces.len(), 2);
/// assert_eq!(traces["t1"], vec!["A".to_string(), "B".to_string()]);
/// ```
pub fn trace_set<'a, I>(entries: I) -> TraceSet
where
    I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
{
    entries
        .into_iter()
        .map(|(entity, labels)| {
            (
                entity.to_string(),
                labels.iter().map(|label| label.to_string()).collect(),
            )
        })
        .collect()
}

/// Count distinct traces
///
/// Variants are ordered by count (descending), ties broken by the label
/// sequence so the ordering never depends on hash iteration.
///
/// # Example
/// ```
/// use causanet::trace::{trace_set, trace_variants};
///
/// let traces = trace_set([
///     ("t1", &["A", "B"][..]),
///     ("t2", &["A", "B"][..]),
///     ("t3", &["A", "C"][..]),
/// ]);
/// let variants = trace_variants(&traces);
///
/// assert_eq!(variants[0].1, 2);
/// assert_eq!(variants[1].0, vec!["A".to_string(), "C".to_string()]);
/// ```
pub fn trace_variants(traces: &TraceSet) -> Vec<Variant> {
    let mut counts: HashMap<&Trace, usize> = HashMap::new();
    for trace in traces.values() {
        *counts.entry(trace).or_insert(0) += 1;
    }

    let mut variants: Vec<Variant> = counts
        .into_iter()
        .map(|(trace, count)| (trace.clone(), count))
        .collect();

    variants.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    variants
}

/// Most frequent `k` variants (hot paths through the process)
pub fn top_variants(traces: &TraceSet, k: usize) -> Vec<Variant> {
    trace_variants(traces).into_iter().take(k).collect()
}
