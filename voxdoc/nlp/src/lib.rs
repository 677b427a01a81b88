#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Voxdoc single-document question answering: lexical answer selection over
//! a reference document, with translation and speech synthesis around it.

/// Request-level service combining selection, translation, and speech.
#[path = "../answer.rs"]
pub mod answer;

/// Answer-selection engine.
#[path = "../comprehension/main.rs"]
pub mod comprehension;

/// TOML configuration.
#[path = "../config.rs"]
pub mod config;

/// JSON-lines console ingestion.
#[path = "../consolecmdreceiver.rs"]
pub mod consolecmdreceiver;

/// Reference document loading and caching.
#[path = "../document/main.rs"]
pub mod document;

/// Supported languages.
#[path = "../language.rs"]
pub mod language;

/// HTTP host.
#[path = "../server.rs"]
pub mod server;

/// Speech synthesis strategies.
#[path = "../speech.rs"]
pub mod speech;

/// Telemetry helpers.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Translation backends.
#[path = "../translation.rs"]
pub mod translation;

pub use answer::{AskResponse, QaService, SpeakResponse};
pub use comprehension::{
    AnswerResult, AnswerSelector, BatchAnswerController, DocumentContext, KeywordSet, Sentence,
    Tokenizer, DEFAULT_FALLBACK,
};
pub use config::{AppConfig, ServerSettings};
pub use consolecmdreceiver::{dispatch, ConsoleCommand, ConsoleCommandReceiver};
pub use document::{DocumentCache, DocumentError, DocumentLoader, FileDocumentLoader};
pub use language::{language_table, Language, LanguageInfo};
pub use server::{AskRequest, HttpHost, TtsRequest};
pub use speech::{AudioArtifact, SpeechError, SpeechSynthesizer, SynthesisChain};
pub use telemetry::{NlpTelemetry, NlpTelemetryBuilder};
pub use translation::{HttpTranslator, PassthroughTranslator, TranslationError, Translator};
