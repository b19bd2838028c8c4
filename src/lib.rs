//! Playlist Mender Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod fixes;
pub mod library_import;
pub mod library_store;
pub mod matching;
pub mod normalize;
pub mod progress;
pub mod sqlite_persistence;
pub mod suggestions;
pub mod word_index;

// Re-export commonly used types for convenience
pub use fixes::{FixApplier, FixBatchSummary, FixError};
pub use library_store::{LibraryStore, SqliteLibraryStore};
pub use matching::{MatchResult, MatcherConfig, TrackMatcher};
pub use suggestions::{SuggestionCache, SuggestionFilters, SuggestionService};
pub use word_index::WordIndexBuilder;
