//! CLI argument parsing for causanet

use crate::config::{DiscoveryConfig, Profile};
use crate::event_log::DEFAULT_DELIMITER;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for discovered nets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// JSON document with every table, graph and binding
    Json,
    /// One CSV row per edge
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "causanet")]
#[command(version)]
#[command(about = "Discover causal nets (dependency graphs with AND/OR bindings) from event logs", long_about = None)]
pub struct Cli {
    /// Event log: `case;activity;resource;timestamp` lines, or a .json trace file
    #[arg(value_name = "LOG")]
    pub input: PathBuf,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Threshold profile used as the base configuration
    #[arg(long = "profile", value_enum, default_value = "classic")]
    pub profile: Profile,

    /// TOML file with thresholds (replaces the profile as the base)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Minimum occurrences for an activity to become a node
    #[arg(long = "act-threshold", value_name = "COUNT")]
    pub act_threshold: Option<u64>,

    /// Dependency measure an edge must exceed
    #[arg(long = "dependency-threshold", value_name = "SCORE", allow_negative_numbers = true)]
    pub dependency_threshold: Option<f64>,

    /// Long-distance score an edge must exceed
    #[arg(long = "long-distance-threshold", value_name = "SCORE", allow_negative_numbers = true)]
    pub long_distance_threshold: Option<f64>,

    /// Minimum indirect observations for long-distance scoring
    #[arg(long = "abs-use-threshold", value_name = "COUNT")]
    pub abs_use_threshold: Option<usize>,

    /// Minimum long-distance score to record a pair
    #[arg(long = "abs-threshold", value_name = "SCORE", allow_negative_numbers = true)]
    pub abs_threshold: Option<f64>,

    /// Only discover this entity type
    #[arg(short = 't', long = "entity-type", value_name = "NAME")]
    pub entity_type: Option<String>,

    /// Field delimiter of text logs
    #[arg(short = 'd', long = "delimiter", default_value_t = DEFAULT_DELIMITER)]
    pub delimiter: char,

    /// Show the N most frequent trace variants
    #[arg(long = "variants", value_name = "N", default_value_t = 0)]
    pub variants: usize,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Base configuration (TOML file or profile) with command-line overrides applied
    pub fn discovery_config(&self) -> Result<DiscoveryConfig> {
        let mut config = match &self.config {
            Some(path) => DiscoveryConfig::from_toml(path)?,
            None => self.profile.config(),
        };

        if let Some(value) = self.act_threshold {
            config.act_threshold = value;
        }
        if let Some(value) = self.dependency_threshold {
            config.dependency_threshold = value;
        }
        if let Some(value) = self.long_distance_threshold {
            config.long_distance_threshold = value;
        }
        if let Some(value) = self.abs_use_threshold {
            config.abs_use_threshold = value;
        }
        if let Some(value) = self.abs_threshold {
            config.abs_threshold = value;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["causanet", "log.csv"]);
        assert_eq!(cli.input, PathBuf::from("log.csv"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.profile, Profile::Classic);
        assert_eq!(cli.delimiter, ';');
        assert_eq!(cli.variants, 0);
        assert!(!cli.debug);
        assert_eq!(cli.discovery_config().unwrap(), DiscoveryConfig::classic());
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["causanet"]).is_err());
    }

    #[test]
    fn test_cli_format_json() {
        let cli = Cli::parse_from(["causanet", "--format", "json", "log.csv"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_profile_object_centric() {
        let cli = Cli::parse_from(["causanet", "--profile", "object-centric", "log.json"]);
        assert_eq!(cli.discovery_config().unwrap(), DiscoveryConfig::object_centric());
    }

    #[test]
    fn test_cli_overrides_apply_on_profile() {
        let cli = Cli::parse_from([
            "causanet",
            "--profile",
            "flattened",
            "--dependency-threshold",
            "0.3",
            "--act-threshold",
            "2",
            "log.csv",
        ]);

        let config = cli.discovery_config().unwrap();

        assert_eq!(config.dependency_threshold, 0.3);
        assert_eq!(config.act_threshold, 2);
        assert_eq!(config.long_distance_threshold, 0.8);
    }

    #[test]
    fn test_cli_accepts_negative_threshold() {
        let cli = Cli::parse_from(["causanet", "--dependency-threshold", "-0.5", "log.csv"]);
        assert_eq!(cli.discovery_config().unwrap().dependency_threshold, -0.5);
    }

    #[test]
    fn test_cli_entity_type_and_delimiter() {
        let cli = Cli::parse_from(["causanet", "-t", "order", "-d", ",", "log.csv"]);
        assert_eq!(cli.entity_type.as_deref(), Some("order"));
        assert_eq!(cli.delimiter, ',');
    }

    #[test]
    fn test_cli_missing_config_file() {
        let cli = Cli::parse_from(["causanet", "--config", "/nonexistent/c.toml", "log.csv"]);
        assert!(cli.discovery_config().is_err());
    }
}
