use std::{fmt, str::FromStr};

use anyhow::anyhow;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Languages a question can be asked and answered in.
///
/// Matching itself always runs in English; other languages go through
/// translation before and after selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English.
    #[default]
    #[serde(rename = "en")]
    English,
    /// Hindi.
    #[serde(rename = "hi")]
    Hindi,
    /// Marathi.
    #[serde(rename = "mr")]
    Marathi,
    /// Spanish.
    #[serde(rename = "es")]
    Spanish,
    /// French.
    #[serde(rename = "fr")]
    French,
}

impl Language {
    /// Every supported language in display order.
    pub const ALL: [Self; 5] = [
        Self::English,
        Self::Hindi,
        Self::Marathi,
        Self::Spanish,
        Self::French,
    ];

    /// Two-letter request code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Marathi => "mr",
            Self::Spanish => "es",
            Self::French => "fr",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Marathi => "Marathi",
            Self::Spanish => "Spanish",
            Self::French => "French",
        }
    }

    /// Voice tag handed to speech synthesizers.
    #[must_use]
    pub const fn voice(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Hindi => "hi-IN",
            Self::Marathi => "mr-IN",
            Self::Spanish => "es-ES",
            Self::French => "fr-FR",
        }
    }

    /// Language part of the voice tag.
    #[must_use]
    pub fn speech_code(self) -> &'static str {
        self.voice().split('-').next().unwrap_or("en")
    }

    /// Localized prompt returned for a blank question.
    #[must_use]
    pub const fn empty_prompt(self) -> &'static str {
        match self {
            Self::English => "Please ask a question.",
            Self::Hindi => "कृपया एक प्रश्न पूछें।",
            Self::Marathi => "कृपया एक प्रश्न विचारा.",
            Self::Spanish => "Por favor, haga una pregunta.",
            Self::French => "Veuillez poser une question.",
        }
    }

    /// Looks up a code, case-insensitively.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    /// Resolves a requested code, falling back to `default` when absent or
    /// unrecognized.
    #[must_use]
    pub fn resolve(code: Option<&str>, default: Self) -> Self {
        code.and_then(Self::from_code).unwrap_or(default)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        Self::from_code(raw).ok_or_else(|| anyhow!("unsupported language code `{raw}`"))
    }
}

/// Public description of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    /// Display name.
    pub name: &'static str,
    /// Voice tag.
    pub voice: &'static str,
}

/// Ordered `code -> {name, voice}` table.
#[must_use]
pub fn language_table() -> IndexMap<&'static str, LanguageInfo> {
    Language::ALL
        .into_iter()
        .map(|lang| {
            (
                lang.code(),
                LanguageInfo {
                    name: lang.name(),
                    voice: lang.voice(),
                },
            )
        })
        .collect()
}
