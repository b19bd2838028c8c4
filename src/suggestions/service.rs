//! Batch suggestion generation over all unmatched track references.

use super::cache::{SuggestionCache, SUGGESTIONS_KEY};
use super::models::{
    BucketCounts, BucketThresholds, FixSuggestion, LibraryStatistics, PlaylistKindCount,
    SuggestionFilters, SuggestionPage, SuggestionSet,
};
use crate::library_store::{LibraryStore, TrackReference};
use crate::matching::{MatchMethod, MatchStatus, TrackMatcher};
use crate::normalize::normalized_stem;
use crate::progress::{CancellationFlag, ProgressReporter};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Unmatched tracks resolved per storage round-trip during generation.
const GENERATION_BATCH_SIZE: usize = 200;

/// How many playlists the statistics payload lists.
const TOP_PLAYLIST_COUNT: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct SuggestionConfig {
    pub thresholds: BucketThresholds,
    /// Candidates scoring below this are rejected before surfacing.
    pub min_composite_score: f64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        SuggestionConfig {
            thresholds: BucketThresholds::default(),
            min_composite_score: 0.375,
        }
    }
}

pub struct SuggestionService {
    store: Arc<dyn LibraryStore>,
    cache: SuggestionCache,
    matcher: TrackMatcher,
    config: SuggestionConfig,
}

impl SuggestionService {
    pub fn new(
        store: Arc<dyn LibraryStore>,
        cache: SuggestionCache,
        matcher: TrackMatcher,
        config: SuggestionConfig,
    ) -> Self {
        Self {
            store,
            cache,
            matcher,
            config,
        }
    }

    /// Return a filtered, paginated page of fix suggestions.
    ///
    /// A non-expired cached set skips all matching work. On a miss the full
    /// unmatched set is resolved in batches, sorted by bucket rank then
    /// score, persisted, and only then filtered for the caller; generation
    /// is deterministic, so a concurrent regeneration losing the final
    /// cache write is harmless.
    pub fn generate(
        &self,
        filters: &SuggestionFilters,
        progress: &dyn ProgressReporter,
        cancel: &CancellationFlag,
    ) -> Result<SuggestionPage> {
        if let Some((set, cached_at)) = self.cache.get::<SuggestionSet>(SUGGESTIONS_KEY)? {
            debug!("serving suggestions from cache ({} entries)", set.suggestions.len());
            return Ok(Self::page_from_set(set, filters, true, Some(cached_at)));
        }

        let set = self.compute_full_set(progress, cancel)?;
        let cached_at = self.cache.set(SUGGESTIONS_KEY, &set)?;
        Ok(Self::page_from_set(set, filters, false, Some(cached_at)))
    }

    /// Drop the cached suggestion set, forcing the next call to recompute.
    pub fn invalidate_cache(&self) -> Result<()> {
        self.cache.invalidate(SUGGESTIONS_KEY)
    }

    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    /// Read-only aggregates; never mutates the cache or the index.
    pub fn statistics(&self) -> Result<LibraryStatistics> {
        let playlists_by_kind = self
            .store
            .playlist_counts_by_kind()?
            .into_iter()
            .map(|(kind, playlists)| PlaylistKindCount { kind, playlists })
            .collect();
        Ok(LibraryStatistics {
            music_files: self.store.music_file_count()?,
            tracks: self.store.track_count()?,
            matched_tracks: self.store.matched_track_count()?,
            unmatched_tracks: self.store.unmatched_track_count()?,
            playlists: self.store.playlist_count()?,
            playlists_by_kind,
            top_playlists: self.store.top_playlists_by_track_count(TOP_PLAYLIST_COUNT)?,
        })
    }

    fn compute_full_set(
        &self,
        progress: &dyn ProgressReporter,
        cancel: &CancellationFlag,
    ) -> Result<SuggestionSet> {
        let total_unmatched = self.store.unmatched_track_count()?;
        progress.started("generate suggestions", Some(total_unmatched as usize));

        let mut suggestions = Vec::new();
        let mut offset = 0usize;
        loop {
            let batch = self
                .store
                .unmatched_tracks_page(GENERATION_BATCH_SIZE, offset)?;
            if batch.is_empty() {
                break;
            }
            for track in &batch {
                if let Some(suggestion) = self.suggest_for_track(track)? {
                    suggestions.push(suggestion);
                }
            }
            offset += batch.len();
            progress.progressed("generate suggestions", offset);
            if cancel.is_cancelled() {
                info!("suggestion generation cancelled after {} tracks", offset);
                break;
            }
        }

        suggestions.sort_by(|a, b| {
            a.bucket
                .rank()
                .cmp(&b.bucket.rank())
                .then(b.similarity.total_cmp(&a.similarity))
        });
        progress.finished("generate suggestions");
        info!(
            "generated {} suggestions over {} unmatched tracks",
            suggestions.len(),
            total_unmatched
        );

        Ok(SuggestionSet {
            total_unmatched,
            suggestions,
        })
    }

    /// Best candidate only; weak candidates are rejected outright. The
    /// resolution outcome is recorded on the stored reference as a side
    /// effect.
    fn suggest_for_track(&self, track: &TrackReference) -> Result<Option<FixSuggestion>> {
        let result = self.matcher.resolve_and_record(track)?;
        if result.status == MatchStatus::Missing {
            return Ok(None);
        }
        if result.similarity < self.config.min_composite_score {
            return Ok(None);
        }
        let candidate_path = match result.matched_path {
            Some(path) => path,
            None => return Ok(None),
        };

        let matched_words = match result.method {
            MatchMethod::SimilaritySearch => {
                result.candidates.first().map(|c| c.matched_words).unwrap_or(0)
            }
            _ => track.normalized_file_name.split_whitespace().count(),
        };

        Ok(Some(FixSuggestion {
            track_id: track.id,
            track_path: track.path.clone(),
            source: track.source,
            source_file: track.source_file.clone(),
            candidate_name: normalized_stem(&candidate_path),
            candidate_path,
            similarity: result.similarity,
            bucket: self.config.thresholds.bucket_for(result.similarity),
            matched_words,
            method: result.method.as_str().to_string(),
        }))
    }

    fn page_from_set(
        set: SuggestionSet,
        filters: &SuggestionFilters,
        cached: bool,
        cached_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> SuggestionPage {
        let stats = BucketCounts::tally(&set.suggestions);

        let filtered: Vec<FixSuggestion> = set
            .suggestions
            .into_iter()
            .filter(|s| filters.bucket.map_or(true, |b| s.bucket == b))
            .filter(|s| filters.min_similarity.map_or(true, |m| s.similarity >= m))
            .collect();

        let offset = filters.offset.unwrap_or(0);
        let limit = filters.limit.unwrap_or(usize::MAX);
        let suggestions: Vec<FixSuggestion> =
            filtered.into_iter().skip(offset).take(limit).collect();

        SuggestionPage {
            count: suggestions.len(),
            suggestions,
            total_unmatched: set.total_unmatched,
            stats,
            cached,
            cached_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_store::{
        MusicFileRecord, PlaylistKind, SqliteLibraryStore, TrackReference, TrackStatus,
    };
    use crate::matching::MatcherConfig;
    use crate::progress::NoOpProgress;
    use crate::suggestions::models::MatchBucket;
    use chrono::Utc;

    fn service_with(files: &[&str], tracks: &[&str]) -> SuggestionService {
        let store: Arc<dyn LibraryStore> = Arc::new(SqliteLibraryStore::in_memory().unwrap());
        for path in files {
            store
                .insert_music_file(&MusicFileRecord::from_path(path, 100, Utc::now()))
                .unwrap();
        }
        for path in tracks {
            store
                .insert_track_reference(&TrackReference::from_playlist_entry(
                    path,
                    PlaylistKind::M3u,
                    "/p.m3u",
                    1,
                ))
                .unwrap();
        }
        SuggestionService::new(
            store.clone(),
            SuggestionCache::with_default_ttl(store.clone()),
            TrackMatcher::new(store, MatcherConfig::default()),
            SuggestionConfig::default(),
        )
    }

    fn generate(service: &SuggestionService, filters: &SuggestionFilters) -> SuggestionPage {
        service
            .generate(filters, &NoOpProgress, &CancellationFlag::new())
            .unwrap()
    }

    #[test]
    fn second_call_is_served_from_cache_with_identical_content() {
        let service = service_with(
            &["/lib/Artist - Song (Remix).mp3"],
            &["/gone/Artist - Song (Remix) [Radio Edit].mp3"],
        );
        let filters = SuggestionFilters::default();

        let first = generate(&service, &filters);
        let second = generate(&service, &filters);

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.suggestions, second.suggestions);
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.total_unmatched, second.total_unmatched);
    }

    #[test]
    fn scenario_radio_edit_lands_in_high_bucket() {
        let service = service_with(
            &["/lib/Artist - Song (Remix).mp3"],
            &["/gone/Artist - Song (Remix) [Radio Edit].mp3"],
        );
        let page = generate(&service, &SuggestionFilters::default());

        assert_eq!(page.total_unmatched, 1);
        assert_eq!(page.count, 1);
        let suggestion = &page.suggestions[0];
        assert!((suggestion.similarity - 0.75).abs() < 1e-9);
        assert_eq!(suggestion.bucket, MatchBucket::High);
        assert_eq!(suggestion.matched_words, 3);
        assert_eq!(suggestion.candidate_path, "/lib/Artist - Song (Remix).mp3");
        assert_eq!(page.stats.high, 1);
    }

    #[test]
    fn weak_candidates_are_rejected_outright() {
        // Single shared word "song" out of many gives a composite below the
        // minimum acceptable score
        let service = service_with(
            &["/lib/Entirely Different Long Name With Song.mp3"],
            &["/gone/Other Song.mp3"],
        );
        let page = generate(&service, &SuggestionFilters::default());
        assert_eq!(page.count, 0);
        assert_eq!(page.total_unmatched, 1);
    }

    #[test]
    fn no_unmatched_tracks_yields_empty_page_with_stats() {
        let service = service_with(&["/lib/a.mp3"], &["/lib/a.mp3"]);
        let page = generate(&service, &SuggestionFilters::default());
        assert_eq!(page.total_unmatched, 0);
        assert_eq!(page.count, 0);
        assert_eq!(page.stats, BucketCounts::default());
    }

    #[test]
    fn filters_and_pagination_apply_after_stats() {
        let service = service_with(
            &[
                "/lib/Alpha Track.mp3",
                "/lib/Beta Track.mp3",
            ],
            &[
                "/gone/Alpha Track.mp3",
                "/gone/Beta Track.mp3",
            ],
        );
        // Both resolve by stem in a different directory (0.9, exact bucket)
        let all = generate(&service, &SuggestionFilters::default());
        assert_eq!(all.count, 2);
        assert_eq!(all.stats.exact, 2);

        let limited = generate(
            &service,
            &SuggestionFilters {
                limit: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(limited.count, 1);
        // stats still cover the full set
        assert_eq!(limited.stats.exact, 2);

        let offset = generate(
            &service,
            &SuggestionFilters {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(offset.count, 1);
        assert_ne!(limited.suggestions[0], offset.suggestions[0]);

        let none = generate(
            &service,
            &SuggestionFilters {
                bucket: Some(MatchBucket::Low),
                ..Default::default()
            },
        );
        assert_eq!(none.count, 0);
    }

    #[test]
    fn generation_records_resolution_status_on_each_track() {
        let store: Arc<dyn LibraryStore> = Arc::new(SqliteLibraryStore::in_memory().unwrap());
        store
            .insert_music_file(&MusicFileRecord::from_path(
                "/lib/Artist - Song.mp3",
                100,
                Utc::now(),
            ))
            .unwrap();
        let moved = store
            .insert_track_reference(&TrackReference::from_playlist_entry(
                "/gone/Artist - Song.mp3",
                PlaylistKind::M3u,
                "/p.m3u",
                1,
            ))
            .unwrap();
        let hopeless = store
            .insert_track_reference(&TrackReference::from_playlist_entry(
                "/gone/zzz qqq.mp3",
                PlaylistKind::M3u,
                "/p.m3u",
                2,
            ))
            .unwrap();
        let service = SuggestionService::new(
            store.clone(),
            SuggestionCache::with_default_ttl(store.clone()),
            TrackMatcher::new(store.clone(), MatcherConfig::default()),
            SuggestionConfig::default(),
        );

        generate(&service, &SuggestionFilters::default());

        let moved = store.track_reference_by_id(moved).unwrap().unwrap();
        assert_eq!(moved.status, TrackStatus::Found);
        let hopeless = store.track_reference_by_id(hopeless).unwrap().unwrap();
        assert_eq!(hopeless.status, TrackStatus::Missing);
    }

    #[test]
    fn invalidation_forces_recomputation() {
        let service = service_with(
            &["/lib/Artist - Song.mp3"],
            &["/gone/Artist - Song.mp3"],
        );
        generate(&service, &SuggestionFilters::default());
        service.invalidate_cache().unwrap();
        let page = generate(&service, &SuggestionFilters::default());
        assert!(!page.cached);
    }

    #[test]
    fn statistics_are_read_only() {
        let service = service_with(
            &["/lib/a.mp3"],
            &["/lib/a.mp3", "/gone/b.mp3"],
        );
        let stats = service.statistics().unwrap();
        assert_eq!(stats.music_files, 1);
        assert_eq!(stats.tracks, 2);
        assert_eq!(stats.matched_tracks, 1);
        assert_eq!(stats.unmatched_tracks, 1);
        assert_eq!(stats.playlists, 1);
        // the cache stays untouched
        assert!(!service.cache().exists(SUGGESTIONS_KEY).unwrap());
    }
}
