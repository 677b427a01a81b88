use std::path::Path;

use crate::{
    comprehension::{
        algo::{extract_keywords, KeywordSet},
        helper::Tokenizer,
        segmenter::{fold_line_wraps, split_sentences, Sentence},
    },
    document::loader::{DocumentError, DocumentLoader},
};

/// A sentence paired with its precomputed keyword set.
#[derive(Debug, Clone)]
pub struct CachedSentence {
    /// The sentence itself.
    pub sentence: Sentence,
    /// Keywords extracted once at build time.
    pub keywords: KeywordSet,
}

/// Segmented, keyword-indexed view of the single reference document.
///
/// Built once; read-only afterwards.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    source: String,
    text: String,
    sentences: Vec<CachedSentence>,
}

impl DocumentCache {
    /// Segments `raw` and precomputes keyword sets.
    ///
    /// A document without any sentence is rejected.
    pub fn build(
        source: impl Into<String>,
        raw: &str,
        tokenizer: &Tokenizer,
    ) -> Result<Self, DocumentError> {
        let source = source.into();
        let text = fold_line_wraps(raw);
        let sentences: Vec<CachedSentence> = split_sentences(&text)
            .into_iter()
            .map(|sentence| CachedSentence {
                keywords: extract_keywords(tokenizer, &sentence.text),
                sentence,
            })
            .collect();
        if sentences.is_empty() {
            return Err(DocumentError::Empty(source));
        }
        Ok(Self {
            source,
            text,
            sentences,
        })
    }

    /// Loads the document through `loader` and builds the cache.
    pub fn load(
        loader: &dyn DocumentLoader,
        path: &Path,
        tokenizer: &Tokenizer,
    ) -> Result<Self, DocumentError> {
        let raw = loader.load_text(path)?;
        Self::build(path.display().to_string(), &raw, tokenizer)
    }

    /// Where the document came from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Normalized document text that sentence offsets refer to.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cached sentences in document order.
    #[must_use]
    pub fn sentences(&self) -> &[CachedSentence] {
        &self.sentences
    }

    /// Number of sentences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// Always false for a successfully built cache.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use crate::document::loader::FileDocumentLoader;

    #[test]
    fn cache_indexes_every_sentence_once() {
        let tokenizer = Tokenizer::english();
        let cache = DocumentCache::build(
            "inline",
            "Digital government improves public services. Citizens benefit from online access.",
            &tokenizer,
        )
        .unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.sentences()[1].sentence.ordinal, 1);
        assert_eq!(
            cache.sentences()[1].keywords,
            extract_keywords(&tokenizer, "Citizens benefit from online access.")
        );
        let first = &cache.sentences()[0].sentence;
        assert!(cache.text()[first.offset..].starts_with("Digital"));
    }

    #[test]
    fn whitespace_document_fails_to_build() {
        let err = DocumentCache::build("blank", " \n\n ", &Tokenizer::english()).unwrap_err();
        assert!(matches!(err, DocumentError::Empty(ref source) if source == "blank"));
    }

    #[test]
    fn cache_loads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, "One line\nwrapped here. Another sentence.").unwrap();
        let cache = DocumentCache::load(&FileDocumentLoader, &path, &Tokenizer::english()).unwrap();
        assert_eq!(cache.sentences()[0].sentence.text, "One line wrapped here.");
    }
}
