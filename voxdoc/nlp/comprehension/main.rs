//! Answer-selection engine: normalization, segmentation, keyword overlap,
//! and first-best sentence selection.

/// Concurrent batch answering.
pub mod advanced;
/// Keyword sets and relevance scoring.
pub mod algo;
/// Document context and answer selector.
#[allow(clippy::module_inception)]
pub mod comprehension;
/// Tokenizer and text normalization.
pub mod helper;
/// Sentence boundary detection.
pub mod segmenter;

pub use advanced::BatchAnswerController;
pub use algo::{extract_keywords, score, KeywordSet};
pub use comprehension::{select, AnswerResult, AnswerSelector, DocumentContext, DEFAULT_FALLBACK};
pub use helper::Tokenizer;
pub use segmenter::{fold_line_wraps, split_sentences, Sentence};
