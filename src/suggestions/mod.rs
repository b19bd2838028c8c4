mod cache;
mod models;
mod service;

pub use cache::{CacheDiagnostics, SuggestionCache, DEFAULT_TTL_HOURS, SUGGESTIONS_KEY};
pub use models::{
    BucketCounts, BucketThresholds, FixSuggestion, LibraryStatistics, MatchBucket,
    PlaylistKindCount, SuggestionFilters, SuggestionPage, SuggestionSet,
};
pub use service::{SuggestionConfig, SuggestionService};
