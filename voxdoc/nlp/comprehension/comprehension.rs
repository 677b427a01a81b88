use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    comprehension::{
        algo::{extract_keywords, score, KeywordSet},
        helper::Tokenizer,
        segmenter::Sentence,
    },
    document::{DocumentCache, DocumentError, DocumentLoader},
    telemetry::NlpTelemetry,
};

/// Message returned when no sentence shares a keyword with the question.
pub const DEFAULT_FALLBACK: &str = "Sorry, I couldn't find an answer.";

/// Outcome of answer selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Winning sentence text, or the fallback message.
    pub answer: String,
    /// False when the fallback message was returned.
    pub matched: bool,
    /// Keyword overlap of the winner (0 on fallback).
    pub score: usize,
    /// Ordinal of the winning sentence.
    pub sentence: Option<usize>,
}

impl AnswerResult {
    fn fallback(message: &str) -> Self {
        Self {
            answer: message.to_string(),
            matched: false,
            score: 0,
            sentence: None,
        }
    }

    fn winner(sentence: &Sentence, score: usize) -> Self {
        Self {
            answer: sentence.text.clone(),
            matched: true,
            score,
            sentence: Some(sentence.ordinal),
        }
    }
}

/// Keeps the first strictly-best candidate, so earlier sentences win ties.
fn pick_best<'a>(
    scored: impl Iterator<Item = (&'a Sentence, usize)>,
) -> Option<(&'a Sentence, usize)> {
    let mut best = None;
    let mut best_score = 0;
    for (sentence, candidate) in scored {
        if candidate > best_score {
            best_score = candidate;
            best = Some((sentence, candidate));
        }
    }
    best
}

/// Selects the best sentence from a plain sentence list, re-deriving every
/// sentence's keywords.
#[must_use]
pub fn select(
    tokenizer: &Tokenizer,
    question: &str,
    sentences: &[Sentence],
    fallback: &str,
) -> AnswerResult {
    let question_keywords = extract_keywords(tokenizer, question);
    let scored = sentences.iter().map(|sentence| {
        let keywords = extract_keywords(tokenizer, &sentence.text);
        (sentence, score(&question_keywords, &keywords))
    });
    pick_best(scored).map_or_else(
        || AnswerResult::fallback(fallback),
        |(sentence, best)| AnswerResult::winner(sentence, best),
    )
}

/// Immutable state shared by every query: tokenizer, cached document, and
/// fallback message.
#[derive(Debug)]
pub struct DocumentContext {
    tokenizer: Tokenizer,
    cache: DocumentCache,
    fallback: String,
}

impl DocumentContext {
    /// Builds a context from raw document text.
    pub fn from_text(
        source: impl Into<String>,
        raw: &str,
        fallback: impl Into<String>,
    ) -> Result<Self, DocumentError> {
        let tokenizer = Tokenizer::english();
        let cache = DocumentCache::build(source, raw, &tokenizer)?;
        Ok(Self {
            tokenizer,
            cache,
            fallback: fallback.into(),
        })
    }

    /// Loads the document at `path` and builds the context.
    pub fn load(
        loader: &dyn DocumentLoader,
        path: &Path,
        fallback: impl Into<String>,
    ) -> Result<Self, DocumentError> {
        let tokenizer = Tokenizer::english();
        let cache = DocumentCache::load(loader, path, &tokenizer)?;
        Ok(Self {
            tokenizer,
            cache,
            fallback: fallback.into(),
        })
    }

    /// Cached document.
    #[must_use]
    pub const fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Tokenizer used for both questions and sentences.
    #[must_use]
    pub const fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Fallback message.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Keyword set of an arbitrary text under this context's tokenizer.
    #[must_use]
    pub fn keywords(&self, text: &str) -> KeywordSet {
        extract_keywords(&self.tokenizer, text)
    }
}

/// Answer selector over the cached document. Cloning shares the context.
#[derive(Debug, Clone)]
pub struct AnswerSelector {
    context: Arc<DocumentContext>,
    telemetry: Option<NlpTelemetry>,
}

impl AnswerSelector {
    /// Creates a selector over `context`.
    #[must_use]
    pub fn new(context: Arc<DocumentContext>, telemetry: Option<NlpTelemetry>) -> Self {
        Self { context, telemetry }
    }

    /// Shared document context.
    #[must_use]
    pub fn context(&self) -> &Arc<DocumentContext> {
        &self.context
    }

    /// Picks the sentence sharing the most keywords with `question`.
    #[must_use]
    pub fn select(&self, question: &str) -> AnswerResult {
        let question_keywords = self.context.keywords(question);
        let scored = self
            .context
            .cache
            .sentences()
            .iter()
            .map(|cached| (&cached.sentence, score(&question_keywords, &cached.keywords)));
        let result = pick_best(scored).map_or_else(
            || AnswerResult::fallback(&self.context.fallback),
            |(sentence, best)| AnswerResult::winner(sentence, best),
        );
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Debug,
                "nlp.answer.selected",
                json!({
                    "keywords": question_keywords.len(),
                    "matched": result.matched,
                    "score": result.score,
                    "sentence": result.sentence,
                }),
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUEPRINT: &str =
        "Digital government improves public services. Citizens benefit from online access.";

    fn selector(text: &str) -> AnswerSelector {
        let context = DocumentContext::from_text("inline", text, DEFAULT_FALLBACK).unwrap();
        AnswerSelector::new(Arc::new(context), None)
    }

    #[test]
    fn first_sentence_wins_ties() {
        let tokenizer = Tokenizer::english();
        let sentences = Sentence::from_texts(["The cat sat.", "The cat ran."]);
        let result = select(&tokenizer, "cat", &sentences, DEFAULT_FALLBACK);
        assert_eq!(result.answer, "The cat sat.");
        assert_eq!(result.sentence, Some(0));
        assert_eq!(result.score, 1);
        assert_eq!(selector("The cat sat. The cat ran.").select("cat").answer, "The cat sat.");
    }

    #[test]
    fn no_overlap_falls_back() {
        let result = selector(BLUEPRINT).select("xyz123");
        assert!(!result.matched);
        assert_eq!(result.answer, DEFAULT_FALLBACK);
        assert_eq!(result.sentence, None);
    }

    #[test]
    fn stop_word_question_falls_back() {
        let selector = selector(BLUEPRINT);
        assert!(selector.context().keywords("the a of").is_empty());
        let result = selector.select("the a of");
        assert!(!result.matched);
        assert!(!selector.select("").matched);
    }

    #[test]
    fn end_to_end_blueprint_question() {
        let selector = selector(BLUEPRINT);
        let question = "How does digital government help citizens?";
        let keywords = selector.context().keywords(question);
        assert_eq!(keywords, selector.context().keywords("digital government help citizen"));
        assert_eq!(keywords.len(), 4);

        let result = selector.select(question);
        assert!(result.matched);
        assert_eq!(result.score, 2);
        assert_eq!(result.answer, "Digital government improves public services.");
    }

    #[test]
    fn later_sentence_wins_only_with_strictly_higher_score() {
        let selector = selector("Rust is fast. Rust has a borrow checker. Python is dynamic.");
        let result = selector.select("Does Rust have a borrow checker?");
        assert_eq!(result.answer, "Rust has a borrow checker.");
        assert_eq!(result.sentence, Some(1));
    }

    #[test]
    fn cached_and_plain_selection_agree_and_repeat() {
        let selector = selector(BLUEPRINT);
        let sentences: Vec<Sentence> = selector
            .context()
            .cache()
            .sentences()
            .iter()
            .map(|cached| cached.sentence.clone())
            .collect();
        for question in ["online citizens", "public services", "nothing relevant", "the"] {
            let tokenizer = selector.context().tokenizer();
            let plain = select(tokenizer, question, &sentences, DEFAULT_FALLBACK);
            let cached = selector.select(question);
            assert_eq!(plain, cached);
            assert_eq!(cached, selector.select(question));
        }
    }

    #[test]
    fn possessive_question_matches_possessive_sentence() {
        let selector = selector(
            "The government's plan covers digital services. Parking is free on weekends.",
        );
        for question in ["government's", "government\u{2019}s", "What is the government's plan?"] {
            let result = selector.select(question);
            assert!(result.matched, "{question} should match");
            assert_eq!(result.answer, "The government's plan covers digital services.");
        }
    }

    #[test]
    fn custom_fallback_is_used() {
        let context = DocumentContext::from_text("inline", BLUEPRINT, "No answer.").unwrap();
        let selector = AnswerSelector::new(Arc::new(context), None);
        assert_eq!(selector.select("zebra").answer, "No answer.");
    }
}
