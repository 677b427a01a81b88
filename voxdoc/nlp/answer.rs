use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    comprehension::{AnswerResult, AnswerSelector, DocumentContext},
    config::{AppConfig, StrategyKind},
    document::FileDocumentLoader,
    language::{language_table, Language, LanguageInfo},
    speech::{
        AudioStore, CommandTtsStrategy, RemoteTtsStrategy, SpeechStrategy, SpeechSynthesizer,
        SynthesisChain,
    },
    telemetry::NlpTelemetry,
    translation::{HttpTranslator, PassthroughTranslator, Translator},
};

/// Response to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Answer text in the requested language, or a prompt/fallback message.
    pub response: String,
    /// Audio URL; absent for the blank-question prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Language the response is in.
    pub language: Language,
    /// Whether a document sentence was found.
    pub matched: bool,
}

/// Response to a standalone speech request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeakResponse {
    /// Audio produced.
    Audio {
        /// Audio URL.
        audio_url: String,
        /// Language spoken.
        language: Language,
    },
    /// Request rejected.
    Error {
        /// Reason.
        error: String,
    },
}

/// Request boundary of the application: language policy, translation around
/// answer selection, and speech synthesis of the result.
pub struct QaService {
    selector: AnswerSelector,
    translator: Arc<dyn Translator>,
    speech: Arc<dyn SpeechSynthesizer>,
    default_language: Language,
    telemetry: Option<NlpTelemetry>,
}

impl QaService {
    /// Creates a service from explicit collaborators.
    #[must_use]
    pub fn new(
        selector: AnswerSelector,
        translator: Arc<dyn Translator>,
        speech: Arc<dyn SpeechSynthesizer>,
        default_language: Language,
    ) -> Self {
        Self {
            selector,
            translator,
            speech,
            default_language,
            telemetry: None,
        }
    }

    /// Loads the reference document and wires collaborators from config.
    ///
    /// `document` overrides the configured document path. Any failure here
    /// must stop the process from serving.
    pub fn bootstrap(
        config: &AppConfig,
        document: Option<&Path>,
        telemetry: Option<NlpTelemetry>,
    ) -> Result<Self> {
        let path = document
            .map(Path::to_path_buf)
            .or_else(|| config.document_path())
            .context("no reference document configured")?;
        let context = DocumentContext::load(
            &FileDocumentLoader,
            &path,
            config.document.fallback_message.clone(),
        )
        .with_context(|| format!("loading reference document {}", path.display()))?;
        if let Some(tel) = &telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "nlp.document.loaded",
                json!({
                    "source": context.cache().source(),
                    "characters": context.cache().text().chars().count(),
                    "sentences": context.cache().len(),
                }),
            );
        }
        let selector = AnswerSelector::new(Arc::new(context), telemetry.clone());

        let translator: Arc<dyn Translator> = if config.translation.enabled {
            Arc::new(HttpTranslator::new(
                config.translation.endpoint.clone(),
                config.translation.timeout(),
            )?)
        } else {
            Arc::new(PassthroughTranslator)
        };

        let mut strategies: Vec<Arc<dyn SpeechStrategy>> = Vec::new();
        for kind in &config.speech.strategies {
            match kind {
                StrategyKind::Remote => strategies.push(Arc::new(RemoteTtsStrategy::new(
                    config.speech.endpoint.clone(),
                    config.speech.timeout(),
                )?)),
                StrategyKind::Command => strategies.push(Arc::new(CommandTtsStrategy::new(
                    config.speech.command.clone(),
                    config.speech.timeout(),
                ))),
                StrategyKind::Silent => {}
            }
        }
        let store = AudioStore::new(config.audio_dir(), config.speech.url_prefix.clone());
        let mut chain = SynthesisChain::new(store, strategies);
        if let Some(tel) = &telemetry {
            chain = chain.with_telemetry(tel.clone());
        }

        let service = Self::new(
            selector,
            translator,
            Arc::new(chain),
            config.languages.default,
        );
        Ok(match telemetry {
            Some(tel) => service.with_telemetry(tel),
            None => service,
        })
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: NlpTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Underlying selector.
    #[must_use]
    pub const fn selector(&self) -> &AnswerSelector {
        &self.selector
    }

    /// Language used for absent or unknown codes.
    #[must_use]
    pub const fn default_language(&self) -> Language {
        self.default_language
    }

    /// Answers `query` in the requested language.
    pub async fn ask(&self, query: &str, language: Option<&str>) -> AskResponse {
        let language = Language::resolve(language, self.default_language);
        let query = query.trim();
        if query.is_empty() {
            return AskResponse {
                response: language.empty_prompt().to_string(),
                audio_url: None,
                language,
                matched: false,
            };
        }

        let question = self.translate_or_original(query, Language::English, language).await;
        let AnswerResult {
            answer,
            matched,
            score,
            sentence,
        } = self.selector.select(&question);
        let response = self.translate_or_original(&answer, language, language).await;
        let audio = self.speech.synthesize(&response, language).await;

        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "nlp.ask.completed",
                json!({
                    "language": language.code(),
                    "matched": matched,
                    "score": score,
                    "sentence": sentence,
                    "audio_strategy": audio.strategy,
                }),
            );
        }
        AskResponse {
            response,
            audio_url: Some(audio.url),
            language,
            matched,
        }
    }

    /// Synthesizes speech for arbitrary text.
    pub async fn speak(&self, text: &str, language: Option<&str>) -> SpeakResponse {
        let text = text.trim();
        if text.is_empty() {
            return SpeakResponse::Error {
                error: "No text provided".into(),
            };
        }
        let language = Language::resolve(language, self.default_language);
        let audio = self.speech.synthesize(text, language).await;
        SpeakResponse::Audio {
            audio_url: audio.url,
            language,
        }
    }

    /// Supported languages.
    #[must_use]
    pub fn languages(&self) -> IndexMap<&'static str, LanguageInfo> {
        language_table()
    }

    /// Translates into `target` unless the request is English; any failure
    /// yields `text` unchanged.
    async fn translate_or_original(
        &self,
        text: &str,
        target: Language,
        requested: Language,
    ) -> String {
        if requested == Language::English {
            return text.to_string();
        }
        match self.translator.translate(text, target).await {
            Ok(translated) => translated,
            Err(err) => {
                tracing::warn!("translation to {target} failed: {err}");
                if let Some(tel) = &self.telemetry {
                    let _ = tel.log(
                        LogLevel::Warn,
                        "nlp.translation.failed",
                        json!({ "target": target.code(), "error": err.to_string() }),
                    );
                }
                text.to_string()
            }
        }
    }
}
