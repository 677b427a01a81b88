use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::language::Language;

/// Public Google Translate endpoint used by default.
pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Errors emitted by translation backends.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Network or client failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("translation service returned status {0}")]
    Status(u16),
    /// Unexpected payload shape.
    #[error("unexpected translation payload: {0}")]
    Decode(String),
}

/// Capability to translate text into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into `target`.
    async fn translate(&self, text: &str, target: Language) -> Result<String, TranslationError>;
}

/// Returns the input unchanged; used when translation is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str, _target: Language) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}

/// Translator backed by the Google Translate `translate_a/single` API.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
}

impl HttpTranslator {
    /// Creates a translator with a request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("voxdoc/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, TranslationError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|err| TranslationError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|err| TranslationError::Decode(err.to_string()))?;
        parse_translation_payload(&payload)
    }
}

/// Concatenates the translated segments of a `translate_a/single` response,
/// shaped `[[["translated", "source", ...], ...], ...]`.
pub fn parse_translation_payload(payload: &Value) -> Result<String, TranslationError> {
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Decode("missing segment list".into()))?;
    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    if translated.is_empty() {
        return Err(TranslationError::Decode("no translated segments".into()));
    }
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_segments_are_concatenated() {
        let payload = json!([
            [
                [
                    "Digital government improves services. ",
                    "El gobierno digital mejora los servicios. ",
                    null
                ],
                ["Citizens benefit.", "Los ciudadanos se benefician.", null]
            ],
            null,
            "es"
        ]);
        assert_eq!(
            parse_translation_payload(&payload).unwrap(),
            "Digital government improves services. Citizens benefit."
        );
    }

    #[test]
    fn malformed_payloads_are_decode_errors() {
        assert!(matches!(
            parse_translation_payload(&json!({"error": "quota"})),
            Err(TranslationError::Decode(_))
        ));
        assert!(matches!(
            parse_translation_payload(&json!([[]])),
            Err(TranslationError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn passthrough_returns_input() {
        let out = PassthroughTranslator
            .translate("bonjour", Language::English)
            .await
            .unwrap();
        assert_eq!(out, "bonjour");
    }
}
