use super::models::{
    CacheRow, CacheRowInfo, EntityClass, FixLogEntry, IndexedName, MusicFileRecord,
    PlaylistKind, PlaylistSummary, TrackReference, TrackStatus, WordIndexEntry,
};
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::LibraryStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Rows per word-index insert transaction.
const WORD_UPSERT_BATCH_SIZE: usize = 5_000;

pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open library database")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        if is_new_db {
            info!("Creating new library database at {:?}", path);
            LIBRARY_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            Self::validate_and_migrate(&mut conn)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests and by one-shot CLI runs that do not
    /// want to persist anything.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        LIBRARY_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn validate_and_migrate(conn: &mut Connection) -> Result<()> {
        let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let db_version = raw_version - BASE_DB_VERSION as i64;

        if db_version < 1 {
            anyhow::bail!(
                "Library database version {} is invalid (expected >= 1)",
                db_version
            );
        }

        let current_schema = LIBRARY_VERSIONED_SCHEMAS.last().unwrap();
        let version_index = LIBRARY_VERSIONED_SCHEMAS
            .iter()
            .position(|s| s.version == db_version as usize)
            .with_context(|| format!("Unknown library database version {}", db_version))?;
        LIBRARY_VERSIONED_SCHEMAS[version_index]
            .validate(conn)
            .with_context(|| {
                format!(
                    "Library database schema validation failed for version {}",
                    db_version
                )
            })?;

        if (db_version as usize) < current_schema.version {
            let tx = conn.transaction()?;
            let mut latest = db_version as usize;
            for schema in LIBRARY_VERSIONED_SCHEMAS.iter() {
                if schema.version > latest {
                    info!(
                        "Migrating library database from version {} to {}",
                        latest, schema.version
                    );
                    if let Some(migration_fn) = schema.migration {
                        migration_fn(&tx).with_context(|| {
                            format!("Failed to run migration to version {}", schema.version)
                        })?;
                    }
                    latest = schema.version;
                }
            }
            tx.execute(
                &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
                [],
            )?;
            tx.commit()?;
        }
        Ok(())
    }

    fn row_to_music_file(row: &rusqlite::Row) -> rusqlite::Result<MusicFileRecord> {
        let modified_epoch: i64 = row.get("modified_time")?;
        Ok(MusicFileRecord {
            id: row.get("rowid")?,
            path: row.get("path")?,
            file_name: row.get("file_name")?,
            file_name_only: row.get("file_name_only")?,
            normalized_file_name: row.get("normalized_file_name")?,
            extension: row.get("extension")?,
            size: row.get("size")?,
            modified_time: Utc
                .timestamp_opt(modified_epoch, 0)
                .single()
                .unwrap_or_else(Utc::now),
        })
    }

    fn row_to_track(row: &rusqlite::Row) -> rusqlite::Result<TrackReference> {
        let source_str: String = row.get("source")?;
        let status_str: String = row.get("status")?;
        Ok(TrackReference {
            id: row.get("rowid")?,
            path: row.get("path")?,
            file_name: row.get("file_name")?,
            normalized_file_name: row.get("normalized_file_name")?,
            source: PlaylistKind::parse(&source_str).unwrap_or(PlaylistKind::M3u),
            source_file: row.get("source_file")?,
            track_order: row.get("track_order")?,
            status: TrackStatus::parse(&status_str).unwrap_or(TrackStatus::Error),
        })
    }

    fn row_to_fix_log(row: &rusqlite::Row) -> rusqlite::Result<FixLogEntry> {
        let timestamp_str: String = row.get("timestamp")?;
        Ok(FixLogEntry {
            id: row.get("rowid")?,
            track_id: row.get("track_id")?,
            previous_path: row.get("previous_path")?,
            new_path: row.get("new_path")?,
            similarity: row.get("similarity")?,
            method: row.get("method")?,
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

impl LibraryStore for SqliteLibraryStore {
    // =========================================================================
    // Music files
    // =========================================================================

    fn insert_music_file(&self, file: &MusicFileRecord) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO music_files
             (path, file_name, file_name_only, normalized_file_name, extension, size, modified_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                file.path,
                file.file_name,
                file.file_name_only,
                file.normalized_file_name,
                file.extension,
                file.size,
                file.modified_time.timestamp(),
            ],
        )
        .context("Failed to insert music file")?;
        Ok(conn.last_insert_rowid())
    }

    fn music_file_by_path(&self, path: &str) -> Result<Option<MusicFileRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT rowid, * FROM music_files WHERE path = ?1",
            params![path],
            Self::row_to_music_file,
        )
        .optional()
        .context("Failed to query music file by path")
    }

    fn music_file_by_id(&self, id: i64) -> Result<Option<MusicFileRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT rowid, * FROM music_files WHERE rowid = ?1",
            params![id],
            Self::row_to_music_file,
        )
        .optional()
        .context("Failed to query music file by id")
    }

    fn music_files_by_normalized_stem(&self, stem: &str) -> Result<Vec<MusicFileRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT rowid, * FROM music_files WHERE normalized_file_name = ?1 ORDER BY rowid",
        )?;
        let files = stmt
            .query_map(params![stem], Self::row_to_music_file)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    fn all_music_file_names(&self) -> Result<Vec<IndexedName>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT rowid, normalized_file_name FROM music_files ORDER BY rowid")?;
        let names = stmt
            .query_map([], |row| {
                Ok(IndexedName {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn music_file_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM music_files", [], |r| r.get(0))?)
    }

    // =========================================================================
    // Track references
    // =========================================================================

    fn insert_track_reference(&self, track: &TrackReference) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO track_refs
             (path, file_name, normalized_file_name, source, source_file, track_order, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                track.path,
                track.file_name,
                track.normalized_file_name,
                track.source.as_str(),
                track.source_file,
                track.track_order,
                track.status.as_str(),
            ],
        )
        .context("Failed to insert track reference")?;
        Ok(conn.last_insert_rowid())
    }

    fn track_reference_by_id(&self, id: i64) -> Result<Option<TrackReference>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT rowid, * FROM track_refs WHERE rowid = ?1",
            params![id],
            Self::row_to_track,
        )
        .optional()
        .context("Failed to query track reference")
    }

    fn update_track_status(&self, id: i64, status: TrackStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE track_refs SET status = ?1 WHERE rowid = ?2",
            params![status.as_str(), id],
        )?;
        Ok(())
    }

    fn update_track_path_guarded(
        &self,
        id: i64,
        new_path: &str,
        original_path: &str,
        source: PlaylistKind,
        source_file: &str,
    ) -> Result<bool> {
        let new_track = TrackReference::from_playlist_entry(new_path, source, source_file, 0);
        let conn = self.conn.lock().unwrap();
        let affected = conn
            .execute(
                "UPDATE track_refs
                 SET path = ?1, file_name = ?2, normalized_file_name = ?3, status = ?4
                 WHERE rowid = ?5 AND path = ?6 AND source = ?7 AND source_file = ?8",
                params![
                    new_path,
                    new_track.file_name,
                    new_track.normalized_file_name,
                    TrackStatus::Found.as_str(),
                    id,
                    original_path,
                    source.as_str(),
                    source_file,
                ],
            )
            .context("Failed to update track path")?;
        Ok(affected == 1)
    }

    fn unmatched_track_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM track_refs t
             WHERE NOT EXISTS (SELECT 1 FROM music_files f WHERE f.path = t.path)",
            [],
            |r| r.get(0),
        )?)
    }

    fn unmatched_tracks_page(&self, limit: usize, offset: usize) -> Result<Vec<TrackReference>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT rowid, * FROM track_refs t
             WHERE NOT EXISTS (SELECT 1 FROM music_files f WHERE f.path = t.path)
             ORDER BY rowid LIMIT ?1 OFFSET ?2",
        )?;
        let tracks = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_track)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }

    fn all_track_names(&self) -> Result<Vec<IndexedName>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT rowid, normalized_file_name FROM track_refs ORDER BY rowid")?;
        let names = stmt
            .query_map([], |row| {
                Ok(IndexedName {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn track_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM track_refs", [], |r| r.get(0))?)
    }

    fn matched_track_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM track_refs t
             WHERE EXISTS (SELECT 1 FROM music_files f WHERE f.path = t.path)",
            [],
            |r| r.get(0),
        )?)
    }

    fn playlist_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(
            "SELECT COUNT(DISTINCT source_file) FROM track_refs",
            [],
            |r| r.get(0),
        )?)
    }

    fn playlist_counts_by_kind(&self) -> Result<Vec<(PlaylistKind, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source, COUNT(DISTINCT source_file) FROM track_refs GROUP BY source",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let source: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((source, count))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(source, count)| PlaylistKind::parse(&source).map(|k| (k, count)))
            .collect())
    }

    fn top_playlists_by_track_count(&self, n: usize) -> Result<Vec<PlaylistSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source_file, source, COUNT(*) as track_count FROM track_refs
             GROUP BY source_file, source
             ORDER BY track_count DESC, source_file
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![n as i64], |row| {
                let source_file: String = row.get(0)?;
                let source: String = row.get(1)?;
                let track_count: i64 = row.get(2)?;
                Ok((source_file, source, track_count))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(source_file, source, track_count)| {
                PlaylistKind::parse(&source).map(|kind| PlaylistSummary {
                    source_file,
                    kind,
                    track_count,
                })
            })
            .collect())
    }

    // =========================================================================
    // Word index
    // =========================================================================

    fn bulk_upsert_words(&self, class: EntityClass, rows: &[WordIndexEntry]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let mut inserted = 0usize;

        for batch in rows.chunks(WORD_UPSERT_BATCH_SIZE) {
            // One transaction per batch; a failed batch rolls back alone.
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(&format!(
                    "INSERT OR IGNORE INTO {} (entity_id, word, word_length, word_position)
                     VALUES (?1, ?2, ?3, ?4)",
                    class.table_name()
                ))?;
                for row in batch {
                    inserted += stmt.execute(params![
                        row.entity_id,
                        row.word,
                        row.word_length,
                        row.word_position,
                    ])?;
                }
            }
            tx.commit()?;
        }
        Ok(inserted)
    }

    fn clear_words(&self, class: EntityClass) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(&format!("DELETE FROM {}", class.table_name()), [])?;
        Ok(())
    }

    fn word_row_count(&self, class: EntityClass) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", class.table_name()),
            [],
            |r| r.get(0),
        )?)
    }

    // =========================================================================
    // Fix log
    // =========================================================================

    fn append_fix_log(&self, entry: &FixLogEntry) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO fix_log (track_id, previous_path, new_path, similarity, method, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.track_id,
                entry.previous_path,
                entry.new_path,
                entry.similarity,
                entry.method,
                entry.timestamp.to_rfc3339(),
            ],
        )
        .context("Failed to append fix log entry")?;
        Ok(conn.last_insert_rowid())
    }

    fn fix_log_for_track(&self, track_id: i64) -> Result<Vec<FixLogEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT rowid, * FROM fix_log WHERE track_id = ?1 ORDER BY rowid")?;
        let entries = stmt
            .query_map(params![track_id], Self::row_to_fix_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    // =========================================================================
    // Cache rows
    // =========================================================================

    fn cache_get_row(&self, key: &str) -> Result<Option<CacheRow>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT key, payload, cached_at FROM suggestion_cache WHERE key = ?1",
            params![key],
            |row| {
                let cached_epoch: i64 = row.get(2)?;
                Ok(CacheRow {
                    key: row.get(0)?,
                    payload: row.get(1)?,
                    cached_at: Utc
                        .timestamp_opt(cached_epoch, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                })
            },
        )
        .optional()
        .context("Failed to read cache row")
    }

    fn cache_put_row(&self, key: &str, payload: &str, cached_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO suggestion_cache (key, payload, cached_at) VALUES (?1, ?2, ?3)",
            params![key, payload, cached_at.timestamp()],
        )
        .context("Failed to write cache row")?;
        Ok(())
    }

    fn cache_delete_row(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM suggestion_cache WHERE key = ?1",
            params![key],
        )?;
        Ok(())
    }

    fn cache_rows_info(&self) -> Result<Vec<CacheRowInfo>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT key, LENGTH(payload), cached_at FROM suggestion_cache ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| {
                let cached_epoch: i64 = row.get(2)?;
                Ok(CacheRowInfo {
                    key: row.get(0)?,
                    payload_bytes: row.get(1)?,
                    cached_at: Utc
                        .timestamp_opt(cached_epoch, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
