//! Long-distance (non-adjacent) dependency detection
//!
//! Directly-follows counts cannot see that `b` reliably happens *eventually*
//! after `a` when some other activity always sits between them. This module
//! replays the traces to count such indirect follows and scores them:
//!
//! ```text
//! LDD(a, b) = 2 * count_ab / (n + 1) - 2 * |#a - #b| / (n + 1),   n = #a + #b
//! ```
//!
//! A score is only kept when `count_ab >= abs_use_threshold`,
//! `LDD >= abs_threshold`, and the escape-path guard reports that the relation
//! is not already explained by direct connectivity towards an end activity.

use crate::dependency::Boundary;
use crate::frequency::ActivityTotals;
use crate::trace::{Activity, TraceSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Default minimum number of indirect observations
pub const DEFAULT_ABS_USE_THRESHOLD: usize = 1;

/// Default minimum long-distance score
pub const DEFAULT_ABS_THRESHOLD: f64 = 0.95;

/// Long-distance scores; every pair not stored reads as 0.0
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LongDistanceTable {
    scores: BTreeMap<Activity, BTreeMap<Activity, f64>>,
}

impl LongDistanceTable {
    /// Detect long-distance dependencies over all traces
    ///
    /// `boundary` holds the provisional start/end activities from the
    /// dependency table. Pairs touching a start activity are never scored.
    pub fn detect(
        totals: &ActivityTotals,
        traces: &TraceSet,
        boundary: &Boundary,
        abs_use_threshold: usize,
        abs_threshold: f64,
    ) -> Self {
        let mut scores: BTreeMap<Activity, BTreeMap<Activity, f64>> = BTreeMap::new();

        for (a, &freq_a) in totals {
            if boundary.starts.contains(a) {
                continue;
            }
            for (b, &freq_b) in totals {
                if a == b || boundary.starts.contains(b) {
                    continue;
                }
                if !escape_guard_holds(traces, a, b, boundary) {
                    continue;
                }

                let count_ab = count_occurrences_between(traces, a, b);
                let score = long_distance_score(count_ab, freq_a, freq_b);

                tracing::trace!(%a, %b, count_ab, score, "long-distance candidate");

                if count_ab >= abs_use_threshold && score >= abs_threshold {
                    scores.entry(a.clone()).or_default().insert(b.clone(), score);
                }
            }
        }

        let table = Self { scores };
        tracing::debug!(dependencies = table.len(), "long-distance detection complete");
        table
    }

    /// Score of `b` eventually following `a` (0.0 when not detected)
    pub fn get(&self, a: &str, b: &str) -> f64 {
        self.scores
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Detected targets of `a` with their scores
    pub fn targets<'a>(&'a self, a: &str) -> impl Iterator<Item = (&'a Activity, f64)> + 'a {
        self.scores
            .get(a)
            .into_iter()
            .flat_map(|row| row.iter().map(|(b, &score)| (b, score)))
    }

    /// All detected `(a, b, score)` triples in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&Activity, &Activity, f64)> {
        self.scores
            .iter()
            .flat_map(|(a, row)| row.iter().map(move |(b, &score)| (a, b, score)))
    }

    /// Number of detected dependencies
    pub fn len(&self) -> usize {
        self.scores.values().map(BTreeMap::len).sum()
    }

    /// True when nothing was detected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The long-distance score for a pair with `count_ab` indirect observations
///
/// # Example
/// ```
/// use causanet::long_distance::long_distance_score;
///
/// // 10 indirect follows between activities seen 10 times each: 20 / 21
/// let score = long_distance_score(10, 10, 10);
/// assert!((score - 20.0 / 21.0).abs() < 1e-12);
/// ```
pub fn long_distance_score(count_ab: usize, freq_a: u64, freq_b: u64) -> f64 {
    let n = (freq_a + freq_b) as f64;
    let imbalance = freq_a.abs_diff(freq_b) as f64;
    2.0 * count_ab as f64 / (n + 1.0) - 2.0 * imbalance / (n + 1.0)
}

/// Count `b` following `a` with at least one other activity strictly between
///
/// Each trace is scanned once. An open `a` stays open across repeated `a`s,
/// and the first `b` after it closes the match (counted only if some activity
/// other than `a` or `b` was seen since the earliest open `a`). Scanning then
/// resumes after that `b`.
pub fn count_occurrences_between(traces: &TraceSet, a: &str, b: &str) -> usize {
    traces
        .values()
        .map(|trace| count_in_trace(trace, a, b))
        .sum()
}

fn count_in_trace(trace: &[Activity], a: &str, b: &str) -> usize {
    let mut count = 0;
    let mut pending = false;
    let mut gap = false;

    for activity in trace {
        if activity == a {
            pending = true;
        } else if activity == b {
            if pending && gap {
                count += 1;
            }
            pending = false;
            gap = false;
        } else if pending {
            gap = true;
        }
    }

    count
}

/// True when some trace reaches `to` from `from` without `excluded` in between
///
/// Uses the first occurrence of `from` and the first occurrence of `to`
/// after it.
pub fn path_exists_without(traces: &TraceSet, from: &str, to: &str, excluded: &str) -> bool {
    traces
        .values()
        .any(|trace| path_in_trace(trace, from, to, excluded))
}

fn path_in_trace(trace: &[Activity], from: &str, to: &str, excluded: &str) -> bool {
    let Some(from_idx) = trace.iter().position(|x| x == from) else {
        return false;
    };
    let Some(offset) = trace[from_idx + 1..].iter().position(|x| x == to) else {
        return false;
    };
    let to_idx = from_idx + 1 + offset;

    !trace[from_idx + 1..to_idx].iter().any(|x| x == excluded)
}

fn path_from_any_start(
    traces: &TraceSet,
    starts: &BTreeSet<Activity>,
    to: &str,
    excluded: &str,
) -> bool {
    starts
        .iter()
        .any(|start| path_exists_without(traces, start, to, excluded))
}

/// Escape-path guard: report `(a, b)` only when, for at least one end `e`,
/// one of the escape routes is missing from the traces
///
/// Routes checked: `a -> e` avoiding `b`, start `-> e` avoiding `a`, and
/// start `-> e` avoiding `b`.
fn escape_guard_holds(traces: &TraceSet, a: &str, b: &str, boundary: &Boundary) -> bool {
    boundary.ends.iter().any(|end| {
        !path_exists_without(traces, a, end, b)
            || !path_from_any_start(traces, &boundary.starts, end, a)
            || !path_from_any_start(traces, &boundary.starts, end, b)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::activity_totals;
    use crate::trace::trace_set;

    fn set(items: &[&str]) -> BTreeSet<Activity> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Ten cases each of `S A C D E` and `S B C F E`: the choice at C is
    /// decided long before, by A or B.
    fn choice_log() -> TraceSet {
        let mut traces = TraceSet::new();
        for i in 0..10 {
            traces.insert(
                format!("a{:02}", i),
                ["S", "A", "C", "D", "E"].iter().map(|s| s.to_string()).collect(),
            );
            traces.insert(
                format!("b{:02}", i),
                ["S", "B", "C", "F", "E"].iter().map(|s| s.to_string()).collect(),
            );
        }
        traces
    }

    fn choice_boundary() -> Boundary {
        Boundary {
            starts: set(&["S"]),
            ends: set(&["E"]),
        }
    }

    #[test]
    fn test_count_requires_gap() {
        let traces = trace_set([("t1", &["A", "B"][..])]);
        assert_eq!(count_occurrences_between(&traces, "A", "B"), 0);

        let traces = trace_set([("t1", &["A", "X", "B"][..])]);
        assert_eq!(count_occurrences_between(&traces, "A", "B"), 1);
    }

    #[test]
    fn test_count_resumes_after_match() {
        let traces = trace_set([("t1", &["A", "X", "B", "A", "Y", "B"][..])]);
        assert_eq!(count_occurrences_between(&traces, "A", "B"), 2);
    }

    #[test]
    fn test_count_one_match_per_target() {
        // Both A's are open when B arrives; one B closes one match
        let traces = trace_set([("t1", &["A", "X", "A", "X", "B"][..])]);
        assert_eq!(count_occurrences_between(&traces, "A", "B"), 1);
    }

    #[test]
    fn test_count_keeps_gap_of_earlier_source() {
        // X lies between the first A and B, so the repeated A still matches
        let traces = trace_set([("t1", &["A", "X", "A", "B"][..])]);
        assert_eq!(count_occurrences_between(&traces, "A", "B"), 1);
    }

    #[test]
    fn test_count_ignores_only_a_between() {
        let traces = trace_set([("t1", &["A", "A", "B"][..])]);
        assert_eq!(count_occurrences_between(&traces, "A", "B"), 0);
    }

    #[test]
    fn test_count_sums_traces() {
        let traces = trace_set([
            ("t1", &["A", "X", "B"][..]),
            ("t2", &["A", "Y", "Z", "B"][..]),
            ("t3", &["B", "X", "A"][..]),
        ]);
        assert_eq!(count_occurrences_between(&traces, "A", "B"), 2);
    }

    #[test]
    fn test_path_exists_without() {
        let traces = trace_set([("t1", &["S", "A", "C", "E"][..])]);

        assert!(path_exists_without(&traces, "S", "E", "X"));
        assert!(!path_exists_without(&traces, "S", "E", "C"));
        assert!(!path_exists_without(&traces, "E", "S", "X"));
        assert!(!path_exists_without(&traces, "missing", "E", "X"));
    }

    #[test]
    fn test_path_exists_in_any_trace() {
        let traces = trace_set([
            ("t1", &["S", "A", "E"][..]),
            ("t2", &["S", "B", "E"][..]),
        ]);

        assert!(path_exists_without(&traces, "S", "E", "A"));
        assert!(path_exists_without(&traces, "S", "E", "B"));
    }

    #[test]
    fn test_score_formula() {
        assert_eq!(long_distance_score(0, 5, 5), 0.0);
        // Imbalance is penalised: 2*4/13 - 2*4/13
        assert_eq!(long_distance_score(4, 8, 4), 0.0);
    }

    #[test]
    fn test_detects_choice_dependency() {
        let traces = choice_log();
        let totals = activity_totals(&traces);

        let table = LongDistanceTable::detect(
            &totals,
            &traces,
            &choice_boundary(),
            DEFAULT_ABS_USE_THRESHOLD,
            DEFAULT_ABS_THRESHOLD,
        );

        assert!((table.get("A", "D") - 20.0 / 21.0).abs() < 1e-12);
        assert!((table.get("B", "F") - 20.0 / 21.0).abs() < 1e-12);
        assert_eq!(table.get("A", "F"), 0.0);
        assert_eq!(table.get("A", "C"), 0.0);
    }

    #[test]
    fn test_start_activities_never_scored() {
        let traces = choice_log();
        let totals = activity_totals(&traces);

        let table = LongDistanceTable::detect(
            &totals,
            &traces,
            &choice_boundary(),
            DEFAULT_ABS_USE_THRESHOLD,
            DEFAULT_ABS_THRESHOLD,
        );

        assert!(table.iter().all(|(a, b, _)| a != "S" && b != "S"));
    }

    #[test]
    fn test_guard_suppresses_explained_dependency() {
        // Every route to E is open, so nothing needs a long-distance edge
        let traces = trace_set([
            ("t1", &["A", "B", "D"][..]),
            ("t2", &["A", "C", "D"][..]),
        ]);
        let totals = activity_totals(&traces);
        let boundary = Boundary {
            starts: set(&["A"]),
            ends: set(&["D"]),
        };

        let table = LongDistanceTable::detect(&totals, &traces, &boundary, 1, 0.0);

        assert!(table.is_empty());
    }

    #[test]
    fn test_guard_holds_when_every_route_passes_source() {
        // A -> E avoiding B and S -> E avoiding B both exist, but every
        // route from S to E runs through A
        let traces = trace_set([
            ("t1", &["S", "A", "X", "B", "E"][..]),
            ("t2", &["S", "A", "Y", "E"][..]),
            ("t3", &["S", "A", "Z", "B", "E"][..]),
        ]);
        let totals = activity_totals(&traces);
        let boundary = Boundary {
            starts: set(&["S"]),
            ends: set(&["E"]),
        };

        let table = LongDistanceTable::detect(&totals, &traces, &boundary, 1, 0.3);

        // count 2, #A 3, #B 2: 4/6 - 2/6
        assert!((table.get("A", "B") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_guard_holds_when_every_route_passes_target() {
        // A -> E avoiding B and S -> E avoiding A both exist, but every
        // route from S to E runs through B
        let traces = trace_set([
            ("t1", &["S", "B", "A", "E"][..]),
            ("t2", &["S", "B", "X", "E", "A"][..]),
            ("t3", &["S", "A", "Y", "B", "E"][..]),
        ]);
        let totals = activity_totals(&traces);
        let boundary = Boundary {
            starts: set(&["S"]),
            ends: set(&["E"]),
        };

        let table = LongDistanceTable::detect(&totals, &traces, &boundary, 1, 0.2);

        // count 1, #A 3, #B 3: 2/7
        assert!((table.get("A", "B") - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_ends_means_no_dependencies() {
        let traces = choice_log();
        let totals = activity_totals(&traces);
        let boundary = Boundary {
            starts: set(&["S"]),
            ends: BTreeSet::new(),
        };

        let table = LongDistanceTable::detect(&totals, &traces, &boundary, 1, 0.0);

        assert!(table.is_empty());
    }

    #[test]
    fn test_use_threshold_filters() {
        let traces = choice_log();
        let totals = activity_totals(&traces);

        let table = LongDistanceTable::detect(&totals, &traces, &choice_boundary(), 11, 0.0);

        assert_eq!(table.get("A", "D"), 0.0);
    }
}
