//! Greedy word-to-word alignment scoring between two normalized names.

use super::levenshtein::word_similarity;
use serde::Serialize;

/// One query word paired with the candidate word it consumed, or with
/// nothing when the candidate ran out of words.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPair {
    pub query_word: String,
    pub matched_word: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentScore {
    /// Sum of per-query-word best scores over the mean of the two word
    /// counts, in [0, 1]. Identical names score 1.0; a length mismatch on
    /// either side dilutes the score symmetrically.
    pub score: f64,
    pub pairs: Vec<AlignedPair>,
}

impl AlignmentScore {
    fn zero() -> Self {
        AlignmentScore {
            score: 0.0,
            pairs: Vec::new(),
        }
    }

    /// Count of query words that consumed a candidate word.
    pub fn matched_words(&self) -> usize {
        self.pairs.iter().filter(|p| p.matched_word.is_some()).count()
    }
}

/// Score `query` against `candidate` by greedy word alignment.
///
/// Each query word, in original order, consumes the not-yet-consumed
/// candidate word with the highest `1 - lev/maxlen` similarity; ties go to
/// the first candidate word. Unmatched query words score 0. Empty input on
/// either side scores 0.
///
/// The sum is divided by the mean of the two word counts rather than the
/// query word count alone. Dividing by the query count would let leftover
/// candidate words ride along for free ("artist" would score 1.0 against
/// "artist song remix"); the mean makes the dilution symmetric, so a
/// five-word query hitting three of a three-word candidate exactly scores
/// 3 / 4 = 0.75, and identical names still score 1.0.
pub fn score_alignment(query: &str, candidate: &str) -> AlignmentScore {
    let query_words: Vec<&str> = query.split_whitespace().collect();
    let candidate_words: Vec<&str> = candidate.split_whitespace().collect();
    if query_words.is_empty() || candidate_words.is_empty() {
        return AlignmentScore::zero();
    }

    let mut consumed = vec![false; candidate_words.len()];
    let mut pairs = Vec::with_capacity(query_words.len());
    let mut total = 0.0;

    for query_word in &query_words {
        let mut best: Option<(usize, f64)> = None;
        for (i, candidate_word) in candidate_words.iter().enumerate() {
            if consumed[i] {
                continue;
            }
            let score = word_similarity(query_word, candidate_word);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
        }

        match best {
            Some((i, score)) => {
                consumed[i] = true;
                total += score;
                pairs.push(AlignedPair {
                    query_word: query_word.to_string(),
                    matched_word: Some(candidate_words[i].to_string()),
                    score,
                });
            }
            None => pairs.push(AlignedPair {
                query_word: query_word.to_string(),
                matched_word: None,
                score: 0.0,
            }),
        }
    }

    let mean_len = (query_words.len() + candidate_words.len()) as f64 / 2.0;
    AlignmentScore {
        score: total / mean_len,
        pairs,
    }
}
