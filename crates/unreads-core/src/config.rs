use crate::error::UnreadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for [`crate::UnreadAggregator`].
///
/// The two behavior flags default to the long-standing counting behavior of the
/// unreads screen; see DESIGN.md for why each exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregatorConfig {
    /// Sum counts when a 1:1 or group conversation key appears more than once.
    /// When off, the first non-zero count for a key wins.
    pub accumulate_repeated_threads: bool,

    /// Add the mention count on top of the stream and private totals.
    pub count_mentions_in_total: bool,

    /// Maximum number of narrows whose counts are kept cached.
    pub narrow_cache_capacity: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            accumulate_repeated_threads: false,
            count_mentions_in_total: true,
            narrow_cache_capacity: 256,
        }
    }
}

impl AggregatorConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, UnreadError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| UnreadError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, UnreadError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config_minimal() {
        let config = AggregatorConfig::from_json("{}").unwrap();
        assert_eq!(config, AggregatorConfig::default());
        assert!(config.count_mentions_in_total);
        assert!(!config.accumulate_repeated_threads);
    }

    #[test]
    fn test_parse_config_overrides() {
        let json = r#"{"accumulateRepeatedThreads": true, "countMentionsInTotal": false}"#;
        let config = AggregatorConfig::from_json(json).unwrap();
        assert!(config.accumulate_repeated_threads);
        assert!(!config.count_mentions_in_total);
        assert_eq!(config.narrow_cache_capacity, 256);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"narrowCacheCapacity": 8}}"#).unwrap();

        let config = AggregatorConfig::load(file.path()).unwrap();
        assert_eq!(config.narrow_cache_capacity, 8);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = AggregatorConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, UnreadError::Io { .. }));
    }
}
