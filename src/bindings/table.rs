use crate::trace::Activity;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Canonical binding: sorted, duplicate-free activity labels
///
/// # Example
/// ```
/// use causanet::bindings::Binding;
///
/// let binding: Binding = ["C", "B", "C"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(binding.elements(), &["B".to_string(), "C".to_string()]);
/// assert!(binding.is_and());
/// assert_eq!(binding.to_string(), "(B, C)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Binding(Vec<Activity>);

impl Binding {
    pub fn new<I: IntoIterator<Item = Activity>>(elements: I) -> Self {
        elements.into_iter().collect()
    }

    pub fn elements(&self) -> &[Activity] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Size > 1: the elements were observed together
    pub fn is_and(&self) -> bool {
        self.0.len() > 1
    }

    /// Size 1: one alternative observed on its own
    pub fn is_or(&self) -> bool {
        self.0.len() == 1
    }

    pub fn contains(&self, activity: &str) -> bool {
        self.0.binary_search_by(|element| element.as_str().cmp(activity)).is_ok()
    }
}

impl FromIterator<Activity> for Binding {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        let unique: BTreeSet<Activity> = iter.into_iter().collect();
        Binding(unique.into_iter().collect())
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Observation counts per distinct binding of one activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    counts: BTreeMap<Binding, usize>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one observation; empty bindings are not observations
    pub fn record(&mut self, binding: Binding) {
        if binding.is_empty() {
            return;
        }
        *self.counts.entry(binding).or_insert(0) += 1;
    }

    /// Observation count of `binding` (0 if never observed)
    pub fn get(&self, binding: &Binding) -> usize {
        self.counts.get(binding).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Binding, usize)> {
        self.counts.iter().map(|(binding, &count)| (binding, count))
    }

    /// Number of distinct bindings
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of observations
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Union of all binding elements
    pub fn elements(&self) -> BTreeSet<Activity> {
        self.counts
            .keys()
            .flat_map(|binding| binding.elements().iter().cloned())
            .collect()
    }

    pub fn and_bindings(&self) -> impl Iterator<Item = (&Binding, usize)> {
        self.iter().filter(|(binding, _)| binding.is_and())
    }

    pub fn or_bindings(&self) -> impl Iterator<Item = (&Binding, usize)> {
        self.iter().filter(|(binding, _)| binding.is_or())
    }
}

#[derive(Serialize)]
struct BindingCount<'a> {
    binding: &'a Binding,
    count: usize,
}

// Bindings are not strings, so the table serializes as a list of entries
impl Serialize for BindingTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.counts
                .iter()
                .map(|(binding, &count)| BindingCount { binding, count }),
        )
    }
}

/// Binding table per activity
pub type BindingTables = BTreeMap<Activity, BindingTable>;
