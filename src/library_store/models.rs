use crate::normalize::normalize_file_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// Playlist kinds and track statuses
// =============================================================================

/// The playlist format a track reference was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistKind {
    M3u,
    VdjFolder,
}

impl PlaylistKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistKind::M3u => "m3u",
            PlaylistKind::VdjFolder => "vdjfolder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "m3u" => Some(PlaylistKind::M3u),
            "vdjfolder" => Some(PlaylistKind::VdjFolder),
            _ => None,
        }
    }
}

/// Resolution status of a track reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Found,
    Missing,
    Error,
    Processing,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Found => "found",
            TrackStatus::Missing => "missing",
            TrackStatus::Error => "error",
            TrackStatus::Processing => "processing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "found" => Some(TrackStatus::Found),
            "missing" => Some(TrackStatus::Missing),
            "error" => Some(TrackStatus::Error),
            "processing" => Some(TrackStatus::Processing),
            _ => None,
        }
    }
}

// =============================================================================
// Library entities
// =============================================================================

/// An indexed music file on disk. Created during import; read-only to the
/// matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicFileRecord {
    /// Database rowid; 0 until inserted.
    pub id: i64,
    /// Absolute path, unique per library.
    pub path: String,
    /// File name including extension.
    pub file_name: String,
    /// File name without extension.
    pub file_name_only: String,
    /// Output of [`normalize_file_name`] over the file name.
    pub normalized_file_name: String,
    /// Extension without the dot, lowercased.
    pub extension: String,
    pub size: i64,
    pub modified_time: DateTime<Utc>,
}

impl MusicFileRecord {
    /// Build a record from a path plus filesystem metadata, deriving the
    /// name fields so they can never disagree with the path.
    pub fn from_path(path: &str, size: i64, modified_time: DateTime<Utc>) -> Self {
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (file_name_only, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), ext.to_lowercase()),
            None => (file_name.clone(), String::new()),
        };
        MusicFileRecord {
            id: 0,
            path: path.to_string(),
            normalized_file_name: normalize_file_name(&file_name),
            file_name,
            file_name_only,
            extension,
            size,
            modified_time,
        }
    }
}

/// A track entry read from a playlist file. Mutated by resolution and by
/// fix application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackReference {
    /// Database rowid; 0 until inserted.
    pub id: i64,
    /// Absolute path as written in the playlist.
    pub path: String,
    /// File name including extension.
    pub file_name: String,
    /// Output of [`normalize_file_name`] over the file name.
    pub normalized_file_name: String,
    pub source: PlaylistKind,
    /// Path of the playlist file this reference came from.
    pub source_file: String,
    /// 1-based position within the playlist.
    pub track_order: i64,
    pub status: TrackStatus,
}

impl TrackReference {
    pub fn from_playlist_entry(
        path: &str,
        source: PlaylistKind,
        source_file: &str,
        track_order: i64,
    ) -> Self {
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        TrackReference {
            id: 0,
            path: path.to_string(),
            normalized_file_name: normalize_file_name(&file_name),
            file_name,
            source,
            source_file: source_file.to_string(),
            track_order,
            status: TrackStatus::Processing,
        }
    }
}

// =============================================================================
// Word index
// =============================================================================

/// Which word-position index a row belongs to. Tracks and music files are
/// indexed separately so each side can be searched against the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityClass {
    Tracks,
    MusicFiles,
}

impl EntityClass {
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityClass::Tracks => "track_words",
            EntityClass::MusicFiles => "music_file_words",
        }
    }
}

/// One word of one entity's normalized name; positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordIndexEntry {
    pub entity_id: i64,
    pub word: String,
    pub word_length: i64,
    pub word_position: i64,
}

/// A (rowid, normalized name) pair, the snapshot unit the progressive
/// matcher searches over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedName {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Fix log
// =============================================================================

/// One row of the append-only fix audit trail. Written for every attempted
/// fix, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixLogEntry {
    /// Database rowid; 0 until inserted.
    pub id: i64,
    pub track_id: i64,
    pub previous_path: String,
    pub new_path: String,
    pub similarity: f64,
    pub method: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Cache rows and aggregates
// =============================================================================

/// Raw cache storage row; TTL interpretation lives in the cache layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRow {
    pub key: String,
    pub payload: String,
    pub cached_at: DateTime<Utc>,
}

/// Per-entry cache diagnostics (size and age, no payload).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheRowInfo {
    pub key: String,
    pub payload_bytes: i64,
    pub cached_at: DateTime<Utc>,
}

/// A playlist with its track count, for the statistics payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistSummary {
    pub source_file: String,
    pub kind: PlaylistKind,
    pub track_count: i64,
}
