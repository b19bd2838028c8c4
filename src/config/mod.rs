mod file_config;

pub use file_config::{FileConfig, MatchingConfig, SuggestionsConfig};

use crate::matching::MatcherConfig;
use crate::suggestions::{BucketThresholds, SuggestionConfig, DEFAULT_TTL_HOURS};
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that participate in config resolution; the TOML file can
/// override each of them.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub matcher: MatcherConfig,
    pub suggestions: SuggestionConfig,
    pub cache_ttl_hours: i64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db or in config file")
            })?;

        let matching = file.matching.unwrap_or_default();
        let matcher_defaults = MatcherConfig::default();
        let matcher = MatcherConfig {
            exact_path_similarity: matcher_defaults.exact_path_similarity,
            same_directory_similarity: matching
                .same_directory_similarity
                .unwrap_or(matcher_defaults.same_directory_similarity),
            different_directory_similarity: matching
                .different_directory_similarity
                .unwrap_or(matcher_defaults.different_directory_similarity),
            auto_accept_threshold: matching
                .auto_accept_threshold
                .unwrap_or(matcher_defaults.auto_accept_threshold),
            result_cap: matching.result_cap.unwrap_or(matcher_defaults.result_cap),
        };

        let suggestions_file = file.suggestions.unwrap_or_default();
        let threshold_defaults = BucketThresholds::default();
        let thresholds = BucketThresholds {
            exact: suggestions_file.bucket_exact.unwrap_or(threshold_defaults.exact),
            high: suggestions_file.bucket_high.unwrap_or(threshold_defaults.high),
            medium: suggestions_file
                .bucket_medium
                .unwrap_or(threshold_defaults.medium),
        };
        let suggestion_defaults = SuggestionConfig::default();
        let suggestions = SuggestionConfig {
            thresholds,
            min_composite_score: suggestions_file
                .min_composite_score
                .unwrap_or(suggestion_defaults.min_composite_score),
        };

        let config = Self {
            db_path,
            matcher,
            suggestions,
            cache_ttl_hours: suggestions_file.cache_ttl_hours.unwrap_or(DEFAULT_TTL_HOURS),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let thresholds = [
            ("auto_accept_threshold", self.matcher.auto_accept_threshold),
            ("bucket_exact", self.suggestions.thresholds.exact),
            ("bucket_high", self.suggestions.thresholds.high),
            ("bucket_medium", self.suggestions.thresholds.medium),
            ("min_composite_score", self.suggestions.min_composite_score),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", name, value);
            }
        }
        if self.suggestions.thresholds.exact < self.suggestions.thresholds.high
            || self.suggestions.thresholds.high < self.suggestions.thresholds.medium
        {
            bail!("bucket thresholds must be ordered exact >= high >= medium");
        }
        if self.cache_ttl_hours <= 0 {
            bail!("cache_ttl_hours must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            db_path: Some(PathBuf::from("/tmp/library.db")),
        }
    }

    #[test]
    fn resolve_cli_only_uses_defaults() {
        let config = AppConfig::resolve(&cli(), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/library.db"));
        assert_eq!(config.matcher.auto_accept_threshold, 0.85);
        assert_eq!(config.suggestions.thresholds.exact, 0.9);
        assert_eq!(config.suggestions.min_composite_score, 0.375);
        assert_eq!(config.cache_ttl_hours, 24);
    }

    #[test]
    fn toml_overrides_cli() {
        let file: FileConfig = toml::from_str(
            r#"
            db_path = "/data/other.db"

            [matching]
            auto_accept_threshold = 0.8
            result_cap = 25

            [suggestions]
            bucket_high = 0.75
            cache_ttl_hours = 6
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(&cli(), Some(file)).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/other.db"));
        assert_eq!(config.matcher.auto_accept_threshold, 0.8);
        assert_eq!(config.matcher.result_cap, 25);
        assert_eq!(config.suggestions.thresholds.high, 0.75);
        // untouched values keep their defaults
        assert_eq!(config.suggestions.thresholds.exact, 0.9);
        assert_eq!(config.cache_ttl_hours, 6);
    }

    #[test]
    fn missing_db_path_is_an_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_path must be specified"));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let file: FileConfig = toml::from_str(
            r#"
            [matching]
            auto_accept_threshold = 1.5
            "#,
        )
        .unwrap();
        assert!(AppConfig::resolve(&cli(), Some(file)).is_err());
    }

    #[test]
    fn misordered_buckets_are_rejected() {
        let file: FileConfig = toml::from_str(
            r#"
            [suggestions]
            bucket_high = 0.95
            "#,
        )
        .unwrap();
        assert!(AppConfig::resolve(&cli(), Some(file)).is_err());
    }
}
