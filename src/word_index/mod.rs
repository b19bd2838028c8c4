//! Word-position index maintenance.
//!
//! Each entity class (track references, music files) gets one index table
//! holding a row per word of each entity's normalized name, with the word's
//! character length and 1-based position. Rebuilding over unchanged inputs
//! inserts nothing; duplicate rows are ignored by the store.

use crate::library_store::{EntityClass, IndexedName, LibraryStore, WordIndexEntry};
use crate::progress::{CancellationFlag, ProgressReporter};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Entities handed to the store per upsert call. The store batches its
/// transactions internally; this bound keeps the in-memory row buffer small.
const ENTITIES_PER_FLUSH: usize = 1_000;

pub struct WordIndexBuilder {
    store: Arc<dyn LibraryStore>,
}

impl WordIndexBuilder {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Index every entity's normalized name, returning the number of rows
    /// actually inserted. Checks `cancel` between flushes; a cancelled run
    /// keeps whatever was already written.
    pub fn index_entities(
        &self,
        class: EntityClass,
        entities: &[IndexedName],
        progress: &dyn ProgressReporter,
        cancel: &CancellationFlag,
    ) -> Result<usize> {
        let operation = match class {
            EntityClass::Tracks => "index tracks",
            EntityClass::MusicFiles => "index music files",
        };
        progress.started(operation, Some(entities.len()));

        let mut inserted = 0usize;
        let mut processed = 0usize;
        let mut buffer: Vec<WordIndexEntry> = Vec::new();

        for entity in entities {
            buffer.extend(rows_for_entity(entity));
            processed += 1;

            if processed % ENTITIES_PER_FLUSH == 0 {
                inserted += self.store.bulk_upsert_words(class, &buffer)?;
                buffer.clear();
                progress.progressed(operation, processed);
                if cancel.is_cancelled() {
                    info!("{} cancelled after {} entities", operation, processed);
                    return Ok(inserted);
                }
            }
        }

        if !buffer.is_empty() {
            inserted += self.store.bulk_upsert_words(class, &buffer)?;
            progress.progressed(operation, processed);
        }

        progress.finished(operation);
        info!(
            "{}: {} entities, {} new index rows",
            operation,
            entities.len(),
            inserted
        );
        Ok(inserted)
    }

    /// Drop and rebuild the index for one entity class from scratch.
    pub fn rebuild(
        &self,
        class: EntityClass,
        entities: &[IndexedName],
        progress: &dyn ProgressReporter,
        cancel: &CancellationFlag,
    ) -> Result<usize> {
        self.store.clear_words(class)?;
        self.index_entities(class, entities, progress, cancel)
    }
}

fn rows_for_entity(entity: &IndexedName) -> Vec<WordIndexEntry> {
    entity
        .name
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| WordIndexEntry {
            entity_id: entity.id,
            word: word.to_string(),
            word_length: word.chars().count() as i64,
            word_position: (i + 1) as i64,
        })
        .collect()
}
