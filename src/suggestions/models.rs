use crate::library_store::{PlaylistKind, PlaylistSummary};
use serde::{Deserialize, Serialize};

// =============================================================================
// Buckets
// =============================================================================

/// Coarse confidence label derived from a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBucket {
    Exact,
    High,
    Medium,
    Low,
}

impl MatchBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchBucket::Exact => "exact",
            MatchBucket::High => "high",
            MatchBucket::Medium => "medium",
            MatchBucket::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(MatchBucket::Exact),
            "high" => Some(MatchBucket::High),
            "medium" => Some(MatchBucket::Medium),
            "low" => Some(MatchBucket::Low),
            _ => None,
        }
    }

    /// Sort rank, best first.
    pub fn rank(&self) -> u8 {
        match self {
            MatchBucket::Exact => 0,
            MatchBucket::High => 1,
            MatchBucket::Medium => 2,
            MatchBucket::Low => 3,
        }
    }
}

/// Bucket boundaries on the [0, 1] similarity scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BucketThresholds {
    pub exact: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        BucketThresholds {
            exact: 0.9,
            high: 0.7,
            medium: 0.5,
        }
    }
}

impl BucketThresholds {
    /// Deterministic bucket assignment from a similarity score.
    pub fn bucket_for(&self, similarity: f64) -> MatchBucket {
        if similarity >= self.exact {
            MatchBucket::Exact
        } else if similarity >= self.high {
            MatchBucket::High
        } else if similarity >= self.medium {
            MatchBucket::Medium
        } else {
            MatchBucket::Low
        }
    }
}

// =============================================================================
// Suggestions
// =============================================================================

/// A proposed fix pairing one track reference with its best candidate
/// music file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixSuggestion {
    pub track_id: i64,
    pub track_path: String,
    pub source: PlaylistKind,
    pub source_file: String,
    pub candidate_path: String,
    pub candidate_name: String,
    pub similarity: f64,
    pub bucket: MatchBucket,
    pub matched_words: usize,
    /// Resolution method string from the matcher, for display and audit.
    pub method: String,
}

/// Per-bucket counts over a full suggestion set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub exact: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl BucketCounts {
    pub fn tally(suggestions: &[FixSuggestion]) -> Self {
        let mut counts = BucketCounts::default();
        for suggestion in suggestions {
            match suggestion.bucket {
                MatchBucket::Exact => counts.exact += 1,
                MatchBucket::High => counts.high += 1,
                MatchBucket::Medium => counts.medium += 1,
                MatchBucket::Low => counts.low += 1,
            }
        }
        counts
    }
}

/// What a `generate` call returns after filtering and pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionPage {
    pub suggestions: Vec<FixSuggestion>,
    /// Unmatched track references at generation time.
    pub total_unmatched: i64,
    /// Suggestions returned in this page.
    pub count: usize,
    /// Per-bucket counts over the full (unfiltered) set.
    pub stats: BucketCounts,
    pub cached: bool,
    pub cached_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Caller-supplied filtering and pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionFilters {
    pub bucket: Option<MatchBucket>,
    pub min_similarity: Option<f64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SuggestionFilters {
    /// Filters for applying fixes without a human in the loop: unless the
    /// caller sets an explicit similarity floor, only suggestions at or
    /// above the auto-accept threshold go through.
    pub fn for_unattended_apply(
        bucket: Option<MatchBucket>,
        min_similarity: Option<f64>,
        auto_accept_threshold: f64,
    ) -> Self {
        SuggestionFilters {
            bucket,
            min_similarity: min_similarity.or(Some(auto_accept_threshold)),
            limit: None,
            offset: None,
        }
    }
}

/// The persisted cache payload: the full sorted suggestion set plus the
/// unmatched total it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub total_unmatched: i64,
    pub suggestions: Vec<FixSuggestion>,
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistKindCount {
    pub kind: PlaylistKind,
    pub playlists: i64,
}

/// Read-only aggregate counts; computing these never touches the cache or
/// the word index.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryStatistics {
    pub music_files: i64,
    pub tracks: i64,
    pub matched_tracks: i64,
    pub unmatched_tracks: i64,
    pub playlists: i64,
    pub playlists_by_kind: Vec<PlaylistKindCount>,
    pub top_playlists: Vec<PlaylistSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_are_a_deterministic_function_of_similarity() {
        let thresholds = BucketThresholds::default();
        assert_eq!(thresholds.bucket_for(1.0), MatchBucket::Exact);
        assert_eq!(thresholds.bucket_for(0.9), MatchBucket::Exact);
        assert_eq!(thresholds.bucket_for(0.89), MatchBucket::High);
        assert_eq!(thresholds.bucket_for(0.7), MatchBucket::High);
        assert_eq!(thresholds.bucket_for(0.69), MatchBucket::Medium);
        assert_eq!(thresholds.bucket_for(0.5), MatchBucket::Medium);
        assert_eq!(thresholds.bucket_for(0.49), MatchBucket::Low);
        assert_eq!(thresholds.bucket_for(0.0), MatchBucket::Low);
    }

    #[test]
    fn bucket_rank_orders_best_first() {
        assert!(MatchBucket::Exact.rank() < MatchBucket::High.rank());
        assert!(MatchBucket::High.rank() < MatchBucket::Medium.rank());
        assert!(MatchBucket::Medium.rank() < MatchBucket::Low.rank());
    }

    #[test]
    fn unattended_apply_floors_similarity_at_the_auto_accept_threshold() {
        let defaulted = SuggestionFilters::for_unattended_apply(None, None, 0.85);
        assert_eq!(defaulted.min_similarity, Some(0.85));
        assert_eq!(defaulted.bucket, None);
        assert_eq!(defaulted.limit, None);

        // An explicit floor wins, even a lower one
        let explicit =
            SuggestionFilters::for_unattended_apply(Some(MatchBucket::Medium), Some(0.5), 0.85);
        assert_eq!(explicit.min_similarity, Some(0.5));
        assert_eq!(explicit.bucket, Some(MatchBucket::Medium));
    }

    #[test]
    fn bucket_strings_roundtrip() {
        for bucket in [
            MatchBucket::Exact,
            MatchBucket::High,
            MatchBucket::Medium,
            MatchBucket::Low,
        ] {
            assert_eq!(MatchBucket::parse(bucket.as_str()), Some(bucket));
        }
        assert_eq!(MatchBucket::parse("great"), None);
    }
}
