mod alignment;
mod levenshtein;
mod progressive;
mod track_matcher;

pub use alignment::{score_alignment, AlignedPair, AlignmentScore};
pub use levenshtein::{levenshtein_distance, word_similarity};
pub use progressive::{ProgressiveMatcher, SearchOutcome, SearchStage};
pub use track_matcher::{
    MatchMethod, MatchResult, MatchStatus, MatcherConfig, RankedCandidate, TrackMatcher,
};
