// Discovery thresholds and named profiles
//
// Thresholds are configuration, not validated input: any real number is
// accepted and only changes which fallback rule fires during graph
// construction. Values outside their usual range are reported, never rejected.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::long_distance::{DEFAULT_ABS_THRESHOLD, DEFAULT_ABS_USE_THRESHOLD};

/// Thresholds for one discovery run
///
/// # Example
/// ```
/// use causanet::config::DiscoveryConfig;
///
/// let config = DiscoveryConfig::default();
/// assert_eq!(config.act_threshold, 1);
/// assert_eq!(config.dependency_threshold, 0.9);
/// assert_eq!(config.abs_threshold, 0.95);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Minimum total occurrences for an activity to become a node
    pub act_threshold: u64,

    /// Dependency measure an edge must exceed before the best-successor
    /// fallback is used instead
    ///
    /// Default: 0.9
    pub dependency_threshold: f64,

    /// Long-distance score a pair must exceed to become a labelled edge
    ///
    /// Default: 0.9
    pub long_distance_threshold: f64,

    /// Minimum indirect observations before a long-distance pair is scored
    pub abs_use_threshold: usize,

    /// Minimum long-distance score for a pair to be recorded at all
    pub abs_threshold: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl DiscoveryConfig {
    /// Case-centric log (one entity type per case)
    pub fn classic() -> Self {
        Self {
            act_threshold: 1,
            dependency_threshold: 0.9,
            long_distance_threshold: 0.9,
            abs_use_threshold: DEFAULT_ABS_USE_THRESHOLD,
            abs_threshold: DEFAULT_ABS_THRESHOLD,
        }
    }

    /// Object-centric log flattened onto a single entity type
    ///
    /// Flattening duplicates events, so indirect follows are noisier and the
    /// long-distance threshold is relaxed.
    pub fn flattened() -> Self {
        Self {
            long_distance_threshold: 0.8,
            ..Self::classic()
        }
    }

    /// Object-centric log discovered per entity type
    pub fn object_centric() -> Self {
        Self {
            dependency_threshold: 0.95,
            ..Self::classic()
        }
    }

    /// Load thresholds from a TOML file; missing keys keep their defaults
    ///
    /// # Example TOML
    /// ```toml
    /// act_threshold = 2
    /// dependency_threshold = 0.95
    /// long_distance_threshold = 0.85
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read discovery config: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse thresholds from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML discovery config")
    }

    /// Thresholds outside their sensible range, as human-readable notes
    pub fn out_of_range(&self) -> Vec<String> {
        let mut notes = Vec::new();

        for (name, value) in [
            ("dependency_threshold", self.dependency_threshold),
            ("long_distance_threshold", self.long_distance_threshold),
            ("abs_threshold", self.abs_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                notes.push(format!("{} = {} is outside [0, 1]", name, value));
            }
        }

        if self.abs_use_threshold == 0 {
            notes.push("abs_use_threshold = 0 scores pairs never observed".to_string());
        }

        notes
    }

    /// Log every out-of-range threshold; the configuration is still used
    pub fn warn_out_of_range(&self) {
        for note in self.out_of_range() {
            tracing::warn!("{}", note);
        }
    }
}

/// Named threshold profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Classic,
    Flattened,
    ObjectCentric,
}

impl Profile {
    pub fn config(self) -> DiscoveryConfig {
        match self {
            Profile::Classic => DiscoveryConfig::classic(),
            Profile::Flattened => DiscoveryConfig::flattened(),
            Profile::ObjectCentric => DiscoveryConfig::object_centric(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_classic() {
        assert_eq!(DiscoveryConfig::default(), DiscoveryConfig::classic());
        assert!(DiscoveryConfig::default().out_of_range().is_empty());
    }

    #[test]
    fn test_profiles() {
        let flattened = Profile::Flattened.config();
        assert_eq!(flattened.dependency_threshold, 0.9);
        assert_eq!(flattened.long_distance_threshold, 0.8);

        let object_centric = Profile::ObjectCentric.config();
        assert_eq!(object_centric.dependency_threshold, 0.95);
        assert_eq!(object_centric.long_distance_threshold, 0.9);

        assert_eq!(Profile::default().config(), DiscoveryConfig::classic());
    }

    #[test]
    fn test_toml_partial_keeps_defaults() {
        let config = DiscoveryConfig::from_toml_str("dependency_threshold = 0.5\n").unwrap();

        assert_eq!(config.dependency_threshold, 0.5);
        assert_eq!(config.act_threshold, 1);
        assert_eq!(config.abs_threshold, 0.95);
    }

    #[test]
    fn test_toml_rejects_wrong_type() {
        assert!(DiscoveryConfig::from_toml_str("act_threshold = \"many\"\n").is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "act_threshold = 3").unwrap();
        writeln!(file, "long_distance_threshold = 0.7").unwrap();

        let config = DiscoveryConfig::from_toml(file.path()).unwrap();

        assert_eq!(config.act_threshold, 3);
        assert_eq!(config.long_distance_threshold, 0.7);
    }

    #[test]
    fn test_from_toml_missing_file() {
        let err = DiscoveryConfig::from_toml("/nonexistent/causanet.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read discovery config"));
    }

    #[test]
    fn test_out_of_range_reported_not_rejected() {
        let config = DiscoveryConfig {
            dependency_threshold: 1.5,
            long_distance_threshold: -0.2,
            abs_use_threshold: 0,
            ..DiscoveryConfig::default()
        };

        let notes = config.out_of_range();

        assert_eq!(notes.len(), 3);
        assert!(notes[0].contains("dependency_threshold"));
        assert!(notes[1].contains("long_distance_threshold"));
    }
}
