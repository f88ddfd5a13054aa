//! Application configuration.
//!
//! The configuration names the ranges the sheet author must define, the
//! container vocabulary, and the layout constants (blank rows after a run,
//! group/run-slot counts). It is loaded from JSON once and cached under the
//! `config` key in its own cache bucket so that later invocations in the same
//! document can run without re-reading the file.

use crate::error::ConfigError;
use runsheet_store::{Criteria, DocumentCache};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cache key (own bucket) the configuration persists under.
pub const CONFIG_CACHE_KEY: &str = "config";

/// A collection-type code and its human-readable expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Abbreviation {
    pub short: String,
    pub long: String,
}

/// One named range the sheet must define, with an optional validation
/// criterion applied to (and checked against) its current values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRangeItem {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub validation: Option<Criteria>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub abbreviations: Vec<Abbreviation>,
    /// Fill fractions in dropdown order, e.g. "1/4".."4/4" plus the single
    /// overfull sentinel "5/4". Evaluated in configured order, not numeric.
    pub container_volume_fractions: Vec<String>,
    /// chrono format string for date headers as shown to users, e.g. "%b %-d".
    pub date_format: String,
    pub named_range_items: Vec<NamedRangeItem>,
    /// Names of ranges the engine computes rather than reads, e.g. "RunGroups".
    pub computed_named_range_names: Vec<String>,
    /// Blank rows between one run's last data row and the next run's header.
    pub run_blank_rows_after: u32,
    pub run_group_count: u32,
    /// Run-header slots per group; blank slots are skipped.
    pub run_group_run_count: u32,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.run_group_count == 0 {
            return Err(ConfigError::Invalid("run_group_count must be at least 1".into()));
        }
        if self.run_group_run_count == 0 {
            return Err(ConfigError::Invalid(
                "run_group_run_count must be at least 1".into(),
            ));
        }
        if self.container_volume_fractions.is_empty() {
            return Err(ConfigError::Invalid(
                "container_volume_fractions must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Cached configuration, if an earlier invocation stored one.
    pub fn load_cached(cache: &DocumentCache) -> Option<AppConfig> {
        cache.get_item(CONFIG_CACHE_KEY, true)
    }

    pub fn store_cached(&self, cache: &DocumentCache) -> Result<(), ConfigError> {
        cache
            .set_item(CONFIG_CACHE_KEY, self, true)
            .map_err(|e| ConfigError::Invalid(format!("configuration could not be cached: {e}")))
    }

    /// Expand a collection-type code ("B" → "Business"), case-insensitively.
    pub fn expand_abbreviation(&self, code: &str) -> Option<&str> {
        let needle = code.trim().to_lowercase();
        self.abbreviations
            .iter()
            .find(|a| a.short.to_lowercase() == needle)
            .map(|a| a.long.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "app_name": "Runsheet",
            "abbreviations": [
                { "short": "b", "long": "Business" },
                { "short": "x", "long": "Checklist Task" }
            ],
            "container_volume_fractions": ["1/4", "1/2", "3/4", "4/4", "5/4"],
            "date_format": "%b %-d",
            "named_range_items": [
                {
                    "name": "ContainerCapacities",
                    "description": "Container Capacities",
                    "validation": { "kind": "number_greater_than", "value": 0.0 }
                },
                { "name": "ContainerTypes", "description": "Container Types" }
            ],
            "computed_named_range_names": ["RunGroups"],
            "run_blank_rows_after": 2,
            "run_group_count": 2,
            "run_group_run_count": 4
        }"#
    }

    #[test]
    fn parses_json_with_optional_validation() {
        let config = AppConfig::from_json_str(sample_json()).unwrap();
        assert_eq!(config.run_blank_rows_after, 2);
        assert!(config.named_range_items[0].validation.is_some());
        assert!(config.named_range_items[1].validation.is_none());
    }

    #[test]
    fn abbreviation_lookup_is_case_insensitive() {
        let config = AppConfig::from_json_str(sample_json()).unwrap();
        assert_eq!(config.expand_abbreviation("B"), Some("Business"));
        assert_eq!(config.expand_abbreviation("X"), Some("Checklist Task"));
        assert_eq!(config.expand_abbreviation("zz"), None);
    }

    #[test]
    fn zero_group_count_is_rejected() {
        let raw = sample_json().replace("\"run_group_count\": 2", "\"run_group_count\": 0");
        assert!(matches!(
            AppConfig::from_json_str(&raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reads_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();
        let config = AppConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.app_name, "Runsheet");
    }
}
