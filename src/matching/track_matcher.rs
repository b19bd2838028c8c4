//! Tiered resolution of a track reference against the music file index.
//!
//! Strategies run in decreasing order of trust; the first one that
//! produces anything wins. `resolve` is read-only and idempotent given an
//! unchanged index; `resolve_and_record` additionally writes the outcome
//! back onto the stored reference.

use super::alignment::score_alignment;
use super::progressive::ProgressiveMatcher;
use crate::library_store::{LibraryStore, TrackReference, TrackStatus};
use crate::normalize::normalized_directory;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Result types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Resolved with enough confidence to apply without confirmation.
    Matched,
    /// Candidates exist but none cleared the auto-accept threshold.
    Pending,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactPath,
    SameDirectorySameName,
    DifferentDirectorySameName,
    SimilaritySearch,
    None,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::ExactPath => "exact_path",
            MatchMethod::SameDirectorySameName => "same_directory_same_name",
            MatchMethod::DifferentDirectorySameName => "different_directory_same_name",
            MatchMethod::SimilaritySearch => "similarity_search",
            MatchMethod::None => "none",
        }
    }
}

/// One scored candidate from the similarity fallback, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub music_file_id: i64,
    pub normalized_name: String,
    pub score: f64,
    pub matched_words: usize,
}

/// Outcome of one resolution call. Ephemeral; callers decide what to
/// persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub status: MatchStatus,
    pub method: MatchMethod,
    pub similarity: f64,
    pub matched_path: Option<String>,
    pub candidates: Vec<RankedCandidate>,
}

impl MatchResult {
    fn missing() -> Self {
        MatchResult {
            status: MatchStatus::Missing,
            method: MatchMethod::None,
            similarity: 0.0,
            matched_path: None,
            candidates: Vec::new(),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Similarity constants for the tiered resolver, all on the same [0, 1]
/// scale as the alignment scorer.
#[derive(Debug, Clone, Copy)]
pub struct MatcherConfig {
    pub exact_path_similarity: f64,
    pub same_directory_similarity: f64,
    pub different_directory_similarity: f64,
    /// Similarity-fallback results at or above this are auto-acceptable.
    pub auto_accept_threshold: f64,
    /// Candidate cap for the progressive search.
    pub result_cap: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            exact_path_similarity: 1.0,
            same_directory_similarity: 0.95,
            different_directory_similarity: 0.9,
            auto_accept_threshold: 0.85,
            result_cap: 50,
        }
    }
}

// =============================================================================
// Matcher
// =============================================================================

pub struct TrackMatcher {
    store: Arc<dyn LibraryStore>,
    config: MatcherConfig,
}

impl TrackMatcher {
    pub fn new(store: Arc<dyn LibraryStore>, config: MatcherConfig) -> Self {
        Self { store, config }
    }

    /// Resolve one track reference. Never errors for "no match"; storage
    /// failures propagate.
    pub fn resolve(&self, track: &TrackReference) -> Result<MatchResult> {
        // Tier 1: the referenced path still exists verbatim
        if self.store.music_file_by_path(&track.path)?.is_some() {
            return Ok(MatchResult {
                status: MatchStatus::Matched,
                method: MatchMethod::ExactPath,
                similarity: self.config.exact_path_similarity,
                matched_path: Some(track.path.clone()),
                candidates: Vec::new(),
            });
        }

        // Tier 2: same normalized stem, preferring the same directory
        let same_stem = self
            .store
            .music_files_by_normalized_stem(&track.normalized_file_name)?;
        if !same_stem.is_empty() {
            let track_dir = normalized_directory(&track.path);
            if let Some(same_dir) = same_stem
                .iter()
                .find(|f| normalized_directory(&f.path) == track_dir)
            {
                return Ok(MatchResult {
                    status: MatchStatus::Matched,
                    method: MatchMethod::SameDirectorySameName,
                    similarity: self.config.same_directory_similarity,
                    matched_path: Some(same_dir.path.clone()),
                    candidates: Vec::new(),
                });
            }
            return Ok(MatchResult {
                status: MatchStatus::Matched,
                method: MatchMethod::DifferentDirectorySameName,
                similarity: self.config.different_directory_similarity,
                matched_path: Some(same_stem[0].path.clone()),
                candidates: Vec::new(),
            });
        }

        // Tier 3: similarity fallback over the name snapshot
        self.resolve_by_similarity(track)
    }

    /// Resolve and persist the outcome on the stored reference. A match
    /// marks the track found, no candidates marks it missing; a pending
    /// result leaves the stored status alone until a human decides.
    pub fn resolve_and_record(&self, track: &TrackReference) -> Result<MatchResult> {
        let result = self.resolve(track)?;
        let recorded = match result.status {
            MatchStatus::Matched => Some(TrackStatus::Found),
            MatchStatus::Missing => Some(TrackStatus::Missing),
            MatchStatus::Pending => None,
        };
        if let Some(status) = recorded {
            if status != track.status {
                self.store.update_track_status(track.id, status)?;
            }
        }
        Ok(result)
    }

    fn resolve_by_similarity(&self, track: &TrackReference) -> Result<MatchResult> {
        let snapshot = self.store.all_music_file_names()?;
        let matcher = ProgressiveMatcher::new(&snapshot, self.config.result_cap);
        let outcome = matcher.search(&track.normalized_file_name);
        if outcome.candidates.is_empty() {
            debug!("no candidates for {:?}", track.path);
            return Ok(MatchResult::missing());
        }

        let mut ranked: Vec<RankedCandidate> = outcome
            .candidates
            .iter()
            .map(|candidate| {
                let alignment = score_alignment(&track.normalized_file_name, &candidate.name);
                RankedCandidate {
                    music_file_id: candidate.id,
                    normalized_name: candidate.name.clone(),
                    score: alignment.score,
                    matched_words: alignment.matched_words(),
                }
            })
            .collect();
        // Stable sort keeps snapshot order among equal scores
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let best = &ranked[0];
        let matched_path = self
            .store
            .music_file_by_id(best.music_file_id)?
            .map(|f| f.path);
        let status = if best.score >= self.config.auto_accept_threshold {
            MatchStatus::Matched
        } else {
            MatchStatus::Pending
        };

        Ok(MatchResult {
            status,
            method: MatchMethod::SimilaritySearch,
            similarity: best.score,
            matched_path,
            candidates: ranked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_store::{MusicFileRecord, PlaylistKind, SqliteLibraryStore};
    use chrono::Utc;

    fn matcher_with_files(paths: &[&str]) -> TrackMatcher {
        let store = SqliteLibraryStore::in_memory().unwrap();
        for path in paths {
            store
                .insert_music_file(&MusicFileRecord::from_path(path, 100, Utc::now()))
                .unwrap();
        }
        TrackMatcher::new(Arc::new(store), MatcherConfig::default())
    }

    fn track(path: &str) -> TrackReference {
        TrackReference::from_playlist_entry(path, PlaylistKind::M3u, "/p.m3u", 1)
    }

    #[test]
    fn exact_path_wins_with_similarity_one() {
        let matcher = matcher_with_files(&["/music/Artist - Song.mp3"]);
        let result = matcher.resolve(&track("/music/Artist - Song.mp3")).unwrap();
        assert_eq!(result.status, MatchStatus::Matched);
        assert_eq!(result.method, MatchMethod::ExactPath);
        assert_eq!(result.similarity, 1.0);
        assert_eq!(result.matched_path.as_deref(), Some("/music/Artist - Song.mp3"));
    }

    #[test]
    fn same_directory_same_name_beats_different_directory() {
        let matcher = matcher_with_files(&[
            "/other/Artist - Song.flac",
            "/music/Artist - Song.flac",
        ]);
        // Same stem, same directory, different extension
        let result = matcher.resolve(&track("/music/Artist - Song.mp3")).unwrap();
        assert_eq!(result.method, MatchMethod::SameDirectorySameName);
        assert_eq!(result.similarity, 0.95);
        assert_eq!(result.matched_path.as_deref(), Some("/music/Artist - Song.flac"));
    }

    #[test]
    fn different_directory_same_name_scores_lower() {
        let matcher = matcher_with_files(&["/moved/Artist - Song.mp3"]);
        let result = matcher.resolve(&track("/music/Artist - Song.mp3")).unwrap();
        assert_eq!(result.status, MatchStatus::Matched);
        assert_eq!(result.method, MatchMethod::DifferentDirectorySameName);
        assert_eq!(result.similarity, 0.9);
        assert!(result.similarity < 0.95);
        assert_eq!(result.matched_path.as_deref(), Some("/moved/Artist - Song.mp3"));
    }

    #[test]
    fn directory_comparison_ignores_case() {
        let matcher = matcher_with_files(&["/Music/Dance/Artist - Song.flac"]);
        let result = matcher
            .resolve(&track("/music/dance/Artist - Song.mp3"))
            .unwrap();
        assert_eq!(result.method, MatchMethod::SameDirectorySameName);
    }

    #[test]
    fn similarity_fallback_ranks_candidates_and_stays_pending() {
        let matcher = matcher_with_files(&[
            "/lib/Artist - Song (Remix).mp3",
            "/lib/Unrelated Band - Thing.mp3",
        ]);
        let result = matcher
            .resolve(&track("/gone/Artist - Song (Remix) [Radio Edit].mp3"))
            .unwrap();
        assert_eq!(result.method, MatchMethod::SimilaritySearch);
        assert_eq!(result.status, MatchStatus::Pending);
        assert!((result.similarity - 0.75).abs() < 1e-9);
        assert_eq!(
            result.matched_path.as_deref(),
            Some("/lib/Artist - Song (Remix).mp3")
        );
        assert_eq!(result.candidates[0].normalized_name, "artist song remix");
        assert_eq!(result.candidates[0].matched_words, 3);
    }

    #[test]
    fn near_identical_name_clears_auto_accept() {
        let matcher = matcher_with_files(&["/lib/Artist - Song Remix Radio.mp3"]);
        // One-letter typo in one of four words: 3.8 / 4 = 0.95
        let result = matcher
            .resolve(&track("/gone/Artist - Song Remix Radia.mp3"))
            .unwrap();
        assert_eq!(result.method, MatchMethod::SimilaritySearch);
        assert_eq!(result.status, MatchStatus::Matched);
        assert!(result.similarity >= 0.85);
    }

    #[test]
    fn no_candidates_resolves_missing() {
        let matcher = matcher_with_files(&["/lib/Completely Different.mp3"]);
        let result = matcher.resolve(&track("/gone/zzz qqq.mp3")).unwrap();
        assert_eq!(result.status, MatchStatus::Missing);
        assert_eq!(result.method, MatchMethod::None);
        assert_eq!(result.similarity, 0.0);
        assert!(result.matched_path.is_none());
        assert!(result.candidates.is_empty());
    }

    fn store_with_files(paths: &[&str]) -> Arc<dyn LibraryStore> {
        let store = SqliteLibraryStore::in_memory().unwrap();
        for path in paths {
            store
                .insert_music_file(&MusicFileRecord::from_path(path, 100, Utc::now()))
                .unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn resolve_and_record_marks_a_moved_file_found() {
        let store = store_with_files(&["/moved/Artist - Song.mp3"]);
        let id = store
            .insert_track_reference(&track("/music/Artist - Song.mp3"))
            .unwrap();
        let matcher = TrackMatcher::new(store.clone(), MatcherConfig::default());

        let stored = store.track_reference_by_id(id).unwrap().unwrap();
        assert_eq!(stored.status, TrackStatus::Processing);
        let result = matcher.resolve_and_record(&stored).unwrap();
        assert_eq!(result.method, MatchMethod::DifferentDirectorySameName);

        let reread = store.track_reference_by_id(id).unwrap().unwrap();
        assert_eq!(reread.status, TrackStatus::Found);
    }

    #[test]
    fn resolve_and_record_marks_a_hopeless_track_missing() {
        let store = store_with_files(&["/lib/Completely Different.mp3"]);
        let id = store.insert_track_reference(&track("/gone/zzz qqq.mp3")).unwrap();
        let matcher = TrackMatcher::new(store.clone(), MatcherConfig::default());

        let stored = store.track_reference_by_id(id).unwrap().unwrap();
        matcher.resolve_and_record(&stored).unwrap();
        let reread = store.track_reference_by_id(id).unwrap().unwrap();
        assert_eq!(reread.status, TrackStatus::Missing);
    }

    #[test]
    fn pending_resolution_leaves_the_stored_status_alone() {
        let store = store_with_files(&["/lib/Artist - Song (Remix).mp3"]);
        let id = store
            .insert_track_reference(&track("/gone/Artist - Song (Remix) [Radio Edit].mp3"))
            .unwrap();
        let matcher = TrackMatcher::new(store.clone(), MatcherConfig::default());

        let stored = store.track_reference_by_id(id).unwrap().unwrap();
        let result = matcher.resolve_and_record(&stored).unwrap();
        assert_eq!(result.status, MatchStatus::Pending);
        let reread = store.track_reference_by_id(id).unwrap().unwrap();
        assert_eq!(reread.status, TrackStatus::Processing);
    }

    #[test]
    fn resolution_is_idempotent() {
        let matcher = matcher_with_files(&["/lib/Artist - Song (Remix).mp3"]);
        let t = track("/gone/Artist - Song (Remix) [Radio Edit].mp3");
        let first = matcher.resolve(&t).unwrap();
        let second = matcher.resolve(&t).unwrap();
        assert_eq!(first, second);
    }
}
