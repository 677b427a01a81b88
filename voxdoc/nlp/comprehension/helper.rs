use std::{collections::HashSet, fmt};

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

/// Closed English stop-word list, modelled on the spaCy English defaults.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
        "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became", "because",
        "become", "becomes", "becoming", "been", "before", "beforehand", "behind", "being",
        "below", "beside", "besides", "between", "beyond", "both", "bottom", "but", "by", "ca",
        "call", "can", "cannot", "could", "did", "do", "does", "doing", "done", "down", "due",
        "during", "each", "eight", "either", "eleven", "else", "elsewhere", "empty", "enough",
        "even", "ever", "every", "everyone", "everything", "everywhere", "except", "few",
        "fifteen", "fifty", "first", "five", "for", "former", "formerly", "forty", "four",
        "from", "front", "full", "further", "get", "give", "go", "had", "has", "have", "he",
        "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers", "herself",
        "him", "himself", "his", "how", "however", "hundred", "i", "if", "in", "indeed", "into",
        "is", "it", "its", "itself", "just", "keep", "last", "latter", "latterly", "least",
        "less", "made", "make", "many", "may", "me", "meanwhile", "might", "mine", "more",
        "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely",
        "neither", "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone",
        "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one",
        "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
        "over", "own", "part", "per", "perhaps", "please", "put", "quite", "rather", "re",
        "really", "regarding", "same", "say", "see", "seem", "seemed", "seeming", "seems",
        "serious", "several", "she", "should", "show", "side", "since", "six", "sixty", "so",
        "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere",
        "still", "such", "take", "ten", "than", "that", "the", "their", "them", "themselves",
        "then", "thence", "there", "thereafter", "thereby", "therefore", "therein",
        "thereupon", "these", "they", "third", "this", "those", "though", "three", "through",
        "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards",
        "twelve", "twenty", "two", "under", "unless", "until", "up", "upon", "us", "used",
        "using", "various", "very", "via", "was", "we", "well", "were", "what", "whatever",
        "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
        "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever",
        "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet",
        "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Returns true when `word` (already lowercased) is on the stop-word list.
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Contraction and possessive suffixes detached from the host word.
const CLITICS: &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Drops a trailing clitic so `government's` and `government’s` keep their
/// noun. Typographic apostrophes are folded to ASCII first.
fn strip_clitic(word: &str) -> String {
    let word = word.replace('\u{2019}', "'");
    CLITICS
        .iter()
        .find_map(|clitic| word.strip_suffix(*clitic))
        .map_or_else(|| word.clone(), str::to_string)
}

/// Lexical normalizer used for both questions and document sentences.
///
/// Pipeline: lowercase, Unicode word segmentation, clitic stripping, drop
/// stop-words and any token with a non-alphabetic character, then reduce the
/// survivors to their Snowball English stem.
pub struct Tokenizer {
    stemmer: Stemmer,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("language", &"english")
            .finish()
    }
}

impl Tokenizer {
    /// Creates the English tokenizer; matching always runs in English.
    #[must_use]
    pub fn english() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Produces the ordered sequence of normalized tokens for `text`.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        lowered
            .unicode_words()
            .map(strip_clitic)
            .filter(|word| !word.is_empty() && word.chars().all(char::is_alphabetic))
            .filter(|word| !is_stop_word(word))
            .map(|word| self.stemmer.stem(&word).into_owned())
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_drops_stop_words_and_non_alphabetic_tokens() {
        let tokenizer = Tokenizer::english();
        let tokens = tokenizer.tokenize("The 3 cats of R2D2 sat quietly");
        assert_eq!(tokens, tokenizer.tokenize("cats sat quietly"));
        assert!(!tokens.iter().any(|t| t == "the" || t == "of"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn tokenizer_reduces_inflections_to_one_form() {
        let tokenizer = Tokenizer::english();
        assert_eq!(tokenizer.tokenize("Citizens"), tokenizer.tokenize("citizen"));
        assert_eq!(tokenizer.tokenize("services"), tokenizer.tokenize("service"));
        assert_eq!(tokenizer.tokenize("citizens"), vec!["citizen".to_string()]);
    }

    #[test]
    fn stop_word_only_and_empty_input_yield_nothing() {
        let tokenizer = Tokenizer::english();
        assert!(tokenizer.tokenize("the a of").is_empty());
        assert!(tokenizer.tokenize("   ").is_empty());
        assert!(tokenizer.tokenize("xyz123").is_empty());
    }

    #[test]
    fn possessives_keep_their_noun() {
        let tokenizer = Tokenizer::english();
        let expected = vec!["govern".to_string(), "plan".to_string()];
        assert_eq!(tokenizer.tokenize("What is the government's plan?"), expected);
        assert_eq!(tokenizer.tokenize("What is the government\u{2019}s plan?"), expected);
        assert_eq!(tokenizer.tokenize("government's"), tokenizer.tokenize("government"));
    }

    #[test]
    fn contractions_reduce_to_stop_words() {
        let tokenizer = Tokenizer::english();
        assert!(tokenizer.tokenize("don't").is_empty());
        assert!(tokenizer.tokenize("can\u{2019}t").is_empty());
        assert_eq!(tokenizer.tokenize("citizens' rights"), tokenizer.tokenize("citizen right"));
    }
}
