use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("paragraph pattern is valid"));

/// Tokens that end in a period without ending the sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "vs.", "e.g.", "i.e.", "fig.",
    "dept.", "approx.", "govt.",
];

/// Abbreviations that are also ordinary sentence-final words. They only join
/// a successor that starts in lowercase or with a digit.
const AMBIGUOUS_ABBREVIATIONS: &[&str] = &["no.", "st.", "inc.", "ltd.", "co.", "etc."];

/// One sentence of the reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Zero-based position in document order.
    pub ordinal: usize,
    /// Byte offset into the normalized document text.
    pub offset: usize,
    /// Sentence text with whitespace collapsed.
    pub text: String,
}

impl Sentence {
    /// Builds a sentence with no meaningful offset, for ad-hoc sentence lists.
    #[must_use]
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            offset: 0,
            text: text.into(),
        }
    }

    /// Builds an ordered sentence list from plain strings.
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Self::new(ordinal, text))
            .collect()
    }
}

/// Folds hard line wraps into spaces while keeping blank lines as paragraph
/// breaks. Extracted PDF text wraps every visual line.
#[must_use]
pub fn fold_line_wraps(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    PARAGRAPH_BREAK
        .split(&unified)
        .map(|paragraph| paragraph.replace('\n', " "))
        .filter(|paragraph| !paragraph.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Splits already-folded text into ordered sentences.
///
/// Boundaries follow UAX #29, then spans ending in a known abbreviation are
/// re-joined with their successor (ambiguous ones only before a lowercase or
/// numeric continuation). Whitespace-only spans are dropped.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut spans: Vec<(usize, String)> = Vec::new();
    for (offset, raw) in text.split_sentence_bound_indices() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        if let Some((_, previous)) = spans.last_mut() {
            if joins_next(previous, &collapsed) {
                previous.push(' ');
                previous.push_str(&collapsed);
                continue;
            }
        }
        let leading = raw.len() - raw.trim_start().len();
        spans.push((offset + leading, collapsed));
    }
    spans
        .into_iter()
        .enumerate()
        .map(|(ordinal, (offset, text))| Sentence {
            ordinal,
            offset,
            text,
        })
        .collect()
}

fn joins_next(span: &str, next: &str) -> bool {
    let last = span.rsplit(' ').next().unwrap_or(span).to_lowercase();
    if ABBREVIATIONS.contains(&last.as_str()) {
        return true;
    }
    AMBIGUOUS_ABBREVIATIONS.contains(&last.as_str())
        && next
            .chars()
            .next()
            .is_some_and(|c| c.is_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn split_sentences_detects_boundaries() {
        let sentences = split_sentences("One. Two! Three?");
        assert_eq!(texts(&sentences), vec!["One.", "Two!", "Three?"]);
        assert_eq!(sentences[2].ordinal, 2);
    }

    #[test]
    fn decimals_and_abbreviations_do_not_split() {
        let sentences = split_sentences("Dr. Smith measured 3.14 units. He left.");
        assert_eq!(
            texts(&sentences),
            vec!["Dr. Smith measured 3.14 units.", "He left."]
        );
    }

    #[test]
    fn ambiguous_abbreviations_end_sentences_before_capitals() {
        let sentences = split_sentences("The answer is no. Parking is free.");
        assert_eq!(texts(&sentences), vec!["The answer is no.", "Parking is free."]);

        let sentences = split_sentences("Shipping is handled by Acme Co. Returns take a week.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].text, "Returns take a week.");
    }

    #[test]
    fn ambiguous_abbreviations_join_lowercase_or_numeric_continuations() {
        assert!(joins_next("Form no.", "4 applies."));
        assert!(joins_next("Acme Co.", "ltd. is listed."));
        assert!(!joins_next("The answer is no.", "Parking is free."));
        assert!(joins_next("Ask Dr.", "Smith."));
    }

    #[test]
    fn offsets_point_into_the_text() {
        let text = "Alpha beta.  Gamma delta.";
        let sentences = split_sentences(text);
        assert_eq!(sentences[1].offset, text.find("Gamma").unwrap());
    }

    #[test]
    fn line_wraps_fold_but_paragraphs_break() {
        let folded = fold_line_wraps(
            "Digital government\nimproves services.\r\n\r\nAnnex A\n\n\nCitizens benefit.",
        );
        let sentences = split_sentences(&folded);
        assert_eq!(
            texts(&sentences),
            vec![
                "Digital government improves services.",
                "Annex A",
                "Citizens benefit."
            ]
        );
    }

    #[test]
    fn blank_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(&fold_line_wraps(" \n\n \t ")).is_empty());
    }
}
