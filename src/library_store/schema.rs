//! SQLite schema for the library database: indexed music files, playlist
//! track references, the two word-position indexes, the fix audit log and
//! the suggestion cache.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const MUSIC_FILES_TABLE: Table = Table {
    name: "music_files",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("path", &SqlType::Text, non_null = true),
        sqlite_column!("file_name", &SqlType::Text, non_null = true),
        sqlite_column!("file_name_only", &SqlType::Text, non_null = true),
        sqlite_column!("normalized_file_name", &SqlType::Text, non_null = true),
        sqlite_column!("extension", &SqlType::Text, non_null = true),
        sqlite_column!("size", &SqlType::Integer, non_null = true),
        sqlite_column!("modified_time", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_music_files_normalized", "normalized_file_name")],
    unique_constraints: &[&["path"]],
};

const TRACK_REFS_TABLE: Table = Table {
    name: "track_refs",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("path", &SqlType::Text, non_null = true),
        sqlite_column!("file_name", &SqlType::Text, non_null = true),
        sqlite_column!("normalized_file_name", &SqlType::Text, non_null = true),
        sqlite_column!("source", &SqlType::Text, non_null = true), // 'm3u', 'vdjfolder'
        sqlite_column!("source_file", &SqlType::Text, non_null = true),
        sqlite_column!("track_order", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'processing'")
        ), // 'found', 'missing', 'error', 'processing'
    ],
    indices: &[
        ("idx_track_refs_status", "status"),
        ("idx_track_refs_source_file", "source_file"),
        ("idx_track_refs_path", "path"),
    ],
    unique_constraints: &[],
};

/// One row per word per track reference; duplicates ignored on re-index.
const TRACK_WORDS_TABLE: Table = Table {
    name: "track_words",
    columns: &[
        sqlite_column!("entity_id", &SqlType::Integer, non_null = true),
        sqlite_column!("word", &SqlType::Text, non_null = true),
        sqlite_column!("word_length", &SqlType::Integer, non_null = true),
        sqlite_column!("word_position", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_track_words_word", "word")],
    unique_constraints: &[&["entity_id", "word", "word_position"]],
};

/// Same shape as `track_words`, over music files.
const MUSIC_FILE_WORDS_TABLE: Table = Table {
    name: "music_file_words",
    columns: &[
        sqlite_column!("entity_id", &SqlType::Integer, non_null = true),
        sqlite_column!("word", &SqlType::Text, non_null = true),
        sqlite_column!("word_length", &SqlType::Integer, non_null = true),
        sqlite_column!("word_position", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_music_file_words_word", "word")],
    unique_constraints: &[&["entity_id", "word", "word_position"]],
};

/// Append-only audit trail of applied and attempted fixes.
const FIX_LOG_TABLE: Table = Table {
    name: "fix_log",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("track_id", &SqlType::Integer, non_null = true),
        sqlite_column!("previous_path", &SqlType::Text, non_null = true),
        sqlite_column!("new_path", &SqlType::Text, non_null = true),
        sqlite_column!("similarity", &SqlType::Real, non_null = true),
        sqlite_column!("method", &SqlType::Text, non_null = true),
        sqlite_column!("timestamp", &SqlType::Text, non_null = true), // RFC 3339
    ],
    indices: &[("idx_fix_log_track", "track_id")],
    unique_constraints: &[],
};

const SUGGESTION_CACHE_TABLE: Table = Table {
    name: "suggestion_cache",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("payload", &SqlType::Text, non_null = true),
        sqlite_column!("cached_at", &SqlType::Integer, non_null = true), // unix seconds
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        MUSIC_FILES_TABLE,
        TRACK_REFS_TABLE,
        TRACK_WORDS_TABLE,
        MUSIC_FILE_WORDS_TABLE,
        FIX_LOG_TABLE,
        SUGGESTION_CACHE_TABLE,
    ],
    migration: None,
}];
