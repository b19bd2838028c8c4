use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,

    // Feature configs
    pub matching: Option<MatchingConfig>,
    pub suggestions: Option<SuggestionsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    /// Similarity-fallback results at or above this are auto-acceptable.
    pub auto_accept_threshold: Option<f64>,
    pub same_directory_similarity: Option<f64>,
    pub different_directory_similarity: Option<f64>,
    /// Candidate cap for the progressive search.
    pub result_cap: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SuggestionsConfig {
    pub bucket_exact: Option<f64>,
    pub bucket_high: Option<f64>,
    pub bucket_medium: Option<f64>,
    /// Candidates scoring below this are rejected before surfacing.
    pub min_composite_score: Option<f64>,
    pub cache_ttl_hours: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
