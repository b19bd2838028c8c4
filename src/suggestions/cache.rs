//! TTL cache over the store's key-value cache rows.
//!
//! Expired entries are indistinguishable from absent ones; `set` overwrites
//! in a single statement with a fresh timestamp. There is no locking around
//! population, concurrent writers resolve via last write wins.

use crate::library_store::{CacheRowInfo, LibraryStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// The single well-known key for the full suggestion set.
pub const SUGGESTIONS_KEY: &str = "suggestions";

pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize)]
pub struct CacheDiagnostics {
    pub entry_count: usize,
    pub total_bytes: i64,
    pub entries: Vec<CacheRowInfo>,
}

pub struct SuggestionCache {
    store: Arc<dyn LibraryStore>,
    ttl: Duration,
}

impl SuggestionCache {
    pub fn new(store: Arc<dyn LibraryStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn with_default_ttl(store: Arc<dyn LibraryStore>) -> Self {
        Self::new(store, Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// The stored value and its timestamp, or `None` when the entry is
    /// absent or older than the TTL.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, DateTime<Utc>)>> {
        let row = match self.store.cache_get_row(key)? {
            Some(row) => row,
            None => return Ok(None),
        };
        if Utc::now() - row.cached_at >= self.ttl {
            return Ok(None);
        }
        let value = serde_json::from_str(&row.payload)
            .with_context(|| format!("Corrupt cache payload for key {:?}", key))?;
        Ok(Some((value, row.cached_at)))
    }

    /// Overwrite the entry for `key`, stamping the current time.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<DateTime<Utc>> {
        let payload = serde_json::to_string(value)?;
        let now = Utc::now();
        self.store.cache_put_row(key, &payload, now)?;
        Ok(now)
    }

    pub fn invalidate(&self, key: &str) -> Result<()> {
        self.store.cache_delete_row(key)
    }

    /// Whether a non-expired entry exists for `key`.
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.age(key)?.is_some())
    }

    /// Age of the entry for `key`, or `None` when absent or expired.
    pub fn age(&self, key: &str) -> Result<Option<Duration>> {
        let row = match self.store.cache_get_row(key)? {
            Some(row) => row,
            None => return Ok(None),
        };
        let age = Utc::now() - row.cached_at;
        if age >= self.ttl {
            return Ok(None);
        }
        Ok(Some(age))
    }

    /// Entry count and per-entry size/age, including expired entries that
    /// have not been rewritten yet.
    pub fn diagnostics(&self) -> Result<CacheDiagnostics> {
        let entries = self.store.cache_rows_info()?;
        Ok(CacheDiagnostics {
            entry_count: entries.len(),
            total_bytes: entries.iter().map(|e| e.payload_bytes).sum(),
            entries,
        })
    }
}
