//! Stepped query-relaxation search over a name snapshot.
//!
//! The cascade prefers precision over recall: the full phrase first, then
//! progressively shorter prefixes, then single words by descending length.
//! The first stage with any hit wins and later stages never run.

use crate::library_store::IndexedName;
use crate::normalize::strip_leading_track_number;

/// Which relaxation stage produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    FullPhrase,
    PrefixPhrase,
    SingleWord,
}

impl SearchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStage::FullPhrase => "full_phrase",
            SearchStage::PrefixPhrase => "prefix_phrase",
            SearchStage::SingleWord => "single_word",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub stage: SearchStage,
    /// The phrase that produced the hits; empty when nothing matched.
    pub phrase: String,
    /// Candidates in snapshot order, capped at the configured limit.
    pub candidates: Vec<IndexedName>,
}

impl SearchOutcome {
    fn empty() -> Self {
        SearchOutcome {
            stage: SearchStage::SingleWord,
            phrase: String::new(),
            candidates: Vec::new(),
        }
    }
}

pub struct ProgressiveMatcher<'a> {
    names: &'a [IndexedName],
    result_cap: usize,
}

impl<'a> ProgressiveMatcher<'a> {
    /// `names` is an immutable snapshot of the opposite entity class; the
    /// matcher never touches storage.
    pub fn new(names: &'a [IndexedName], result_cap: usize) -> Self {
        Self { names, result_cap }
    }

    /// Search for `query` (a normalized name), relaxing in three stages.
    /// A query that is empty after stripping its track-number prefix, or
    /// that never hits, yields an empty outcome rather than an error.
    pub fn search(&self, query: &str) -> SearchOutcome {
        let stripped = strip_leading_track_number(query.trim());
        let words: Vec<&str> = stripped.split_whitespace().collect();
        if words.is_empty() {
            return SearchOutcome::empty();
        }

        // Stage 1: the full joined phrase
        let phrase = words.join(" ");
        let candidates = self.substring_search(&phrase);
        if !candidates.is_empty() {
            return SearchOutcome {
                stage: SearchStage::FullPhrase,
                phrase,
                candidates,
            };
        }

        // Stage 2: drop trailing words, longest prefix first
        if words.len() >= 3 {
            for cut in (2..words.len()).rev() {
                let prefix = words[..cut].join(" ");
                let candidates = self.substring_search(&prefix);
                if !candidates.is_empty() {
                    return SearchOutcome {
                        stage: SearchStage::PrefixPhrase,
                        phrase: prefix,
                        candidates,
                    };
                }
            }
        }

        // Stage 3: single words, longest first
        let mut by_length = words.clone();
        by_length.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
        for word in by_length {
            let candidates = self.substring_search(word);
            if !candidates.is_empty() {
                return SearchOutcome {
                    stage: SearchStage::SingleWord,
                    phrase: word.to_string(),
                    candidates,
                };
            }
        }

        SearchOutcome::empty()
    }

    fn substring_search(&self, needle: &str) -> Vec<IndexedName> {
        self.names
            .iter()
            .filter(|entry| entry.name.contains(needle))
            .take(self.result_cap)
            .cloned()
            .collect()
    }
}
