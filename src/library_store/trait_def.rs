//! LibraryStore trait definition.
//!
//! Everything the matching engine needs from storage goes through this
//! trait, so the engine itself never holds a connection and tests can run
//! against an in-memory database.

use super::models::{
    CacheRow, CacheRowInfo, EntityClass, FixLogEntry, IndexedName, MusicFileRecord,
    PlaylistKind, PlaylistSummary, TrackReference, TrackStatus, WordIndexEntry,
};
use anyhow::Result;
use chrono::{DateTime, Utc};

pub trait LibraryStore: Send + Sync {
    // =========================================================================
    // Music files
    // =========================================================================

    /// Insert a music file record, returning its rowid. Inserting a path
    /// that already exists replaces the previous record.
    fn insert_music_file(&self, file: &MusicFileRecord) -> Result<i64>;

    fn music_file_by_path(&self, path: &str) -> Result<Option<MusicFileRecord>>;

    fn music_file_by_id(&self, id: i64) -> Result<Option<MusicFileRecord>>;

    /// All music files whose normalized name equals `stem`, in rowid order.
    fn music_files_by_normalized_stem(&self, stem: &str) -> Result<Vec<MusicFileRecord>>;

    /// Snapshot of (rowid, normalized name) for every music file, in rowid
    /// order. The progressive matcher searches over this.
    fn all_music_file_names(&self) -> Result<Vec<IndexedName>>;

    fn music_file_count(&self) -> Result<i64>;

    // =========================================================================
    // Track references
    // =========================================================================

    /// Insert a track reference, returning its rowid.
    fn insert_track_reference(&self, track: &TrackReference) -> Result<i64>;

    fn track_reference_by_id(&self, id: i64) -> Result<Option<TrackReference>>;

    fn update_track_status(&self, id: i64, status: TrackStatus) -> Result<()>;

    /// Update a track's path and mark it found, guarded by the original
    /// (path, source, source_file) tuple. Returns `Ok(false)` when the
    /// guard matched zero rows (the reference changed since it was read).
    fn update_track_path_guarded(
        &self,
        id: i64,
        new_path: &str,
        original_path: &str,
        source: PlaylistKind,
        source_file: &str,
    ) -> Result<bool>;

    /// Count of track references whose path has no music file (anti-join),
    /// computed in a single query.
    fn unmatched_track_count(&self) -> Result<i64>;

    /// One page of unmatched track references, ordered by rowid.
    fn unmatched_tracks_page(&self, limit: usize, offset: usize) -> Result<Vec<TrackReference>>;

    /// Snapshot of (rowid, normalized name) for every track reference.
    fn all_track_names(&self) -> Result<Vec<IndexedName>>;

    fn track_count(&self) -> Result<i64>;

    /// Count of track references whose path resolves to an indexed file.
    fn matched_track_count(&self) -> Result<i64>;

    fn playlist_count(&self) -> Result<i64>;

    fn playlist_counts_by_kind(&self) -> Result<Vec<(PlaylistKind, i64)>>;

    fn top_playlists_by_track_count(&self, n: usize) -> Result<Vec<PlaylistSummary>>;

    // =========================================================================
    // Word index
    // =========================================================================

    /// Insert index rows in fixed-size batches, one transaction per batch,
    /// ignoring rows that collide on (entity_id, word, word_position).
    /// Returns the number of rows actually inserted.
    fn bulk_upsert_words(&self, class: EntityClass, rows: &[WordIndexEntry]) -> Result<usize>;

    fn clear_words(&self, class: EntityClass) -> Result<()>;

    fn word_row_count(&self, class: EntityClass) -> Result<i64>;

    // =========================================================================
    // Fix log
    // =========================================================================

    /// Append one audit row; never updates existing rows.
    fn append_fix_log(&self, entry: &FixLogEntry) -> Result<i64>;

    fn fix_log_for_track(&self, track_id: i64) -> Result<Vec<FixLogEntry>>;

    // =========================================================================
    // Cache rows
    // =========================================================================

    fn cache_get_row(&self, key: &str) -> Result<Option<CacheRow>>;

    /// Overwrite the entry for `key` in a single statement.
    fn cache_put_row(&self, key: &str, payload: &str, cached_at: DateTime<Utc>) -> Result<()>;

    fn cache_delete_row(&self, key: &str) -> Result<()>;

    fn cache_rows_info(&self) -> Result<Vec<CacheRowInfo>>;
}
