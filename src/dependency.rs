//! Dependency measures derived from directly-follows frequencies
//!
//! For an ordered pair `(a, b)`:
//!
//! ```text
//! a == b:  |a => a| = f(a,a) / (f(a,a) + 1)                  in [0, 1)
//! a != b:  |a => b| = (f(a,b) - f(b,a)) / (f(a,b) + f(b,a) + 1)  in (-1, 1)
//! ```
//!
//! The measure is antisymmetric for distinct pairs and never reaches 1, so a
//! single noisy observation cannot look like a certain dependency.

use crate::frequency::FrequencyTable;
use crate::trace::Activity;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Dependency measure of a single ordered pair
///
/// # Example
/// ```
/// use causanet::dependency::dependency_measure;
///
/// assert_eq!(dependency_measure(1, 0, false), 0.5);
/// assert_eq!(dependency_measure(3, 3, false), 0.0);
/// assert_eq!(dependency_measure(1, 1, true), 0.5);
/// ```
pub fn dependency_measure(forward: u64, backward: u64, self_pair: bool) -> f64 {
    if self_pair {
        forward as f64 / (forward as f64 + 1.0)
    } else {
        (forward as f64 - backward as f64) / (forward as f64 + backward as f64 + 1.0)
    }
}

/// Square table of dependency measures over the activity universe
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DependencyTable {
    rows: BTreeMap<Activity, BTreeMap<Activity, f64>>,
}

impl DependencyTable {
    /// Score every ordered pair of the frequency table's universe
    pub fn from_frequencies(frequencies: &FrequencyTable) -> Self {
        let universe: Vec<&Activity> = frequencies.activities().collect();
        let mut rows = BTreeMap::new();

        for &a in &universe {
            let row: BTreeMap<Activity, f64> = universe
                .iter()
                .map(|&b| {
                    let score =
                        dependency_measure(frequencies.get(a, b), frequencies.get(b, a), a == b);
                    (b.clone(), score)
                })
                .collect();
            rows.insert(a.clone(), row);
        }

        Self { rows }
    }

    /// Dependency of `b` on `a` (0.0 for pairs outside the universe)
    pub fn get(&self, a: &str, b: &str) -> f64 {
        self.rows
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Row of `a`: how strongly each activity depends on `a`
    pub fn row(&self, a: &str) -> Option<&BTreeMap<Activity, f64>> {
        self.rows.get(a)
    }

    /// Column of `b`: how strongly `b` depends on each activity
    pub fn column<'a>(&'a self, b: &'a str) -> impl Iterator<Item = (&'a Activity, f64)> + 'a {
        self.rows
            .iter()
            .map(move |(a, row)| (a, row.get(b).copied().unwrap_or(0.0)))
    }

    /// The activity universe, in sorted order
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.rows.keys()
    }

    /// Number of activities in the universe
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True for an empty universe
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Successors of `a` attaining the row maximum, positive values only
    ///
    /// This is the structural fallback used when no successor clears the
    /// dependency threshold. Self-pairs take part in the maximization.
    pub fn best_successors(&self, a: &str) -> BTreeSet<Activity> {
        match self.rows.get(a) {
            Some(row) => strongest(row.iter().map(|(b, &score)| (b, score))),
            None => BTreeSet::new(),
        }
    }

    /// Predecessors of `b` attaining the column maximum, positive values only
    pub fn best_predecessors(&self, b: &str) -> BTreeSet<Activity> {
        strongest(self.column(b))
    }

    /// Activities with a positive dependency on `a`, self-pair excluded
    pub fn positive_successors<'a>(&'a self, a: &'a str) -> impl Iterator<Item = &'a Activity> + 'a {
        self.rows
            .get(a)
            .into_iter()
            .flat_map(|row| row.iter())
            .filter(move |(b, &score)| b.as_str() != a && score > 0.0)
            .map(|(b, _)| b)
    }
}

/// Keys attaining the maximum score, provided that maximum is positive
pub(crate) fn strongest<'a, I>(scores: I) -> BTreeSet<Activity>
where
    I: IntoIterator<Item = (&'a Activity, f64)>,
{
    let scores: Vec<(&Activity, f64)> = scores.into_iter().collect();
    let max = scores
        .iter()
        .map(|(_, score)| *score)
        .fold(f64::NEG_INFINITY, f64::max);

    if max <= 0.0 {
        return BTreeSet::new();
    }

    scores
        .into_iter()
        .filter(|(_, score)| *score == max)
        .map(|(activity, _)| activity.clone())
        .collect()
}

/// Original start and end activities of a dependency table
///
/// An original start has no positive dependency from any other activity; an
/// original end has no positive dependency towards any other activity.
/// Self-loops are ignored on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Boundary {
    pub starts: BTreeSet<Activity>,
    pub ends: BTreeSet<Activity>,
}

impl Boundary {
    /// Detect start and end activities among `admitted`
    ///
    /// Only dependencies between admitted activities are considered, so an
    /// activity whose sole successor fell below the occurrence threshold
    /// becomes an end.
    pub fn detect(dependencies: &DependencyTable, admitted: &BTreeSet<Activity>) -> Self {
        let mut has_incoming: BTreeSet<&Activity> = BTreeSet::new();
        let mut ends = BTreeSet::new();

        for a in admitted {
            let mut has_outgoing = false;
            for b in dependencies.positive_successors(a) {
                if admitted.contains(b) {
                    has_incoming.insert(b);
                    has_outgoing = true;
                }
            }
            if !has_outgoing {
                ends.insert(a.clone());
            }
        }

        let starts = admitted
            .iter()
            .filter(|a| !has_incoming.contains(a))
            .cloned()
            .collect();

        Self { starts, ends }
    }
}
