use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::comprehension::helper::Tokenizer;

/// Set of normalized base-form tokens derived from a question or sentence.
///
/// Ordered so that iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    /// Number of distinct keywords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no keyword survived normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cardinality of the intersection with `other`.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> usize {
        self.0.intersection(&other.0).count()
    }

    /// True when every keyword of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl FromIterator<String> for KeywordSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Extracts the keyword set of `text`.
#[must_use]
pub fn extract_keywords(tokenizer: &Tokenizer, text: &str) -> KeywordSet {
    tokenizer.tokenize(text).into_iter().collect()
}

/// Relevance of a sentence to a question: plain intersection count.
#[must_use]
pub fn score(question: &KeywordSet, sentence: &KeywordSet) -> usize {
    question.overlap(sentence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> KeywordSet {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn keyword_set_ignores_word_order_and_repeats() {
        let tokenizer = Tokenizer::english();
        let forward = extract_keywords(&tokenizer, "citizens trust digital services");
        let shuffled = extract_keywords(&tokenizer, "services digital citizens trust citizens");
        assert_eq!(forward, shuffled);
        assert_eq!(forward.len(), 4);
    }

    #[test]
    fn score_counts_shared_keywords_only() {
        let question = set(&["digit", "govern", "help", "citizen"]);
        assert_eq!(score(&question, &set(&["digit", "govern", "public"])), 2);
        assert_eq!(score(&question, &set(&["access", "onlin"])), 0);
        assert_eq!(score(&KeywordSet::default(), &set(&["digit"])), 0);
    }

    #[test]
    fn superset_sentence_never_scores_lower() {
        let question = set(&["cat", "mat", "sat"]);
        let narrow = set(&["cat"]);
        let wide = set(&["cat", "mat", "dog"]);
        assert!(narrow.is_subset(&wide));
        assert!(score(&question, &wide) >= score(&question, &narrow));
    }
}
