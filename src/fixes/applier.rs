//! Application of accepted fix suggestions.
//!
//! One fix runs as an explicit sequence: playlist backup, guarded database
//! update, playlist rewrite, audit log append. The audit row is written for
//! every attempt regardless of outcome, and a failure at any step surfaces
//! as a typed error naming that step so callers can retry deterministically.

use super::playlist_rewrite::{ensure_backup, rewrite_path};
use crate::library_store::{FixLogEntry, LibraryStore, PlaylistKind, TrackReference};
use crate::suggestions::FixSuggestion;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FixError {
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("track {0} not found")]
    TrackLookup(i64),

    #[error("backup of {source_file} failed: {reason}")]
    Backup { source_file: String, reason: String },

    #[error("track {track_id} changed since it was read")]
    StaleReference { track_id: i64 },

    #[error("rewrite of {source_file} failed: {reason}")]
    SourceRewrite { source_file: String, reason: String },

    #[error("{source_file} no longer references {old_path}")]
    PathNotInSource {
        source_file: String,
        old_path: String,
    },

    #[error("audit log append failed: {0}")]
    AuditLog(String),
}

/// Everything a successful fix changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFix {
    pub track_id: i64,
    pub previous_path: String,
    pub new_path: String,
    pub source_file: String,
    pub kind: PlaylistKind,
    pub entries_rewritten: usize,
    pub backup_written: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixItemError {
    pub track_id: i64,
    pub track_path: String,
    pub error: String,
}

/// Aggregate outcome of a batch apply; individual failures never abort the
/// batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixBatchSummary {
    pub applied: usize,
    pub failed: usize,
    pub m3u_files_updated: usize,
    pub vdj_files_updated: usize,
    pub errors: Vec<FixItemError>,
}

pub struct FixApplier {
    store: Arc<dyn LibraryStore>,
}

impl FixApplier {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Apply one accepted fix. `original_path` is the track path the
    /// suggestion was computed against; if the stored reference has moved
    /// on since, the fix fails as stale instead of clobbering it. The audit
    /// row is appended whether or not the lookup and the earlier steps
    /// succeeded; when only the append fails the fix itself has been
    /// applied and `FixError::AuditLog` reports the divergence.
    pub fn apply_fix(
        &self,
        track_id: i64,
        original_path: &str,
        candidate_path: &str,
        method: &str,
        similarity: f64,
    ) -> Result<AppliedFix, FixError> {
        let outcome = self
            .store
            .track_reference_by_id(track_id)
            .map_err(|e| FixError::Storage(e.to_string()))
            .and_then(|found| found.ok_or(FixError::TrackLookup(track_id)))
            .and_then(|track| self.run_fix_steps(&track, original_path, candidate_path));

        let log_entry = FixLogEntry {
            id: 0,
            track_id,
            previous_path: original_path.to_string(),
            new_path: candidate_path.to_string(),
            similarity,
            method: method.to_string(),
            timestamp: Utc::now(),
        };
        match (self.store.append_fix_log(&log_entry), outcome) {
            (Ok(_), Ok(applied)) => {
                info!(
                    "fixed track {}: {:?} -> {:?}",
                    track_id, applied.previous_path, applied.new_path
                );
                Ok(applied)
            }
            (Ok(_), Err(step_error)) => Err(step_error),
            (Err(log_error), Ok(_)) => Err(FixError::AuditLog(log_error.to_string())),
            (Err(log_error), Err(step_error)) => {
                warn!("audit log append also failed: {}", log_error);
                Err(step_error)
            }
        }
    }

    fn run_fix_steps(
        &self,
        track: &TrackReference,
        original_path: &str,
        candidate_path: &str,
    ) -> Result<AppliedFix, FixError> {
        // Step 1: preserve the pristine playlist before anything changes
        let backup_written =
            ensure_backup(&track.source_file).map_err(|e| FixError::Backup {
                source_file: track.source_file.clone(),
                reason: e.to_string(),
            })?;

        // Step 2: guarded update; zero rows means the reference moved on
        let updated = self
            .store
            .update_track_path_guarded(
                track.id,
                candidate_path,
                original_path,
                track.source,
                &track.source_file,
            )
            .map_err(|e| FixError::Storage(e.to_string()))?;
        if !updated {
            return Err(FixError::StaleReference { track_id: track.id });
        }

        // Step 3: rewrite the playlist entry
        let entries_rewritten = rewrite_path(
            &track.source_file,
            track.source,
            original_path,
            candidate_path,
        )
        .map_err(|e| FixError::SourceRewrite {
            source_file: track.source_file.clone(),
            reason: e.to_string(),
        })?;
        if entries_rewritten == 0 {
            return Err(FixError::PathNotInSource {
                source_file: track.source_file.clone(),
                old_path: track.path.clone(),
            });
        }

        Ok(AppliedFix {
            track_id: track.id,
            previous_path: original_path.to_string(),
            new_path: candidate_path.to_string(),
            source_file: track.source_file.clone(),
            kind: track.source,
            entries_rewritten,
            backup_written,
        })
    }

    /// Apply each suggestion independently; failures are collected, not
    /// fatal.
    pub fn apply_fixes_batch(&self, suggestions: &[FixSuggestion]) -> FixBatchSummary {
        let mut summary = FixBatchSummary::default();
        let mut m3u_files: HashSet<String> = HashSet::new();
        let mut vdj_files: HashSet<String> = HashSet::new();

        for suggestion in suggestions {
            match self.apply_fix(
                suggestion.track_id,
                &suggestion.track_path,
                &suggestion.candidate_path,
                &suggestion.method,
                suggestion.similarity,
            ) {
                Ok(applied) => {
                    summary.applied += 1;
                    match applied.kind {
                        PlaylistKind::M3u => m3u_files.insert(applied.source_file),
                        PlaylistKind::VdjFolder => vdj_files.insert(applied.source_file),
                    };
                }
                Err(error) => {
                    warn!(
                        "fix failed for track {} ({:?}): {}",
                        suggestion.track_id, suggestion.track_path, error
                    );
                    summary.failed += 1;
                    summary.errors.push(FixItemError {
                        track_id: suggestion.track_id,
                        track_path: suggestion.track_path.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        summary.m3u_files_updated = m3u_files.len();
        summary.vdj_files_updated = vdj_files.len();
        summary
    }
}
