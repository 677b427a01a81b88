use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared_logging::LogLevel;

use crate::{
    comprehension::DEFAULT_FALLBACK, language::Language, speech::DEFAULT_TTS_ENDPOINT,
    translation::DEFAULT_TRANSLATE_ENDPOINT,
};

/// Runtime configuration, usually read from `voxdoc.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Reference document settings.
    pub document: DocumentSettings,
    /// Language policy.
    pub languages: LanguageSettings,
    /// Translation backend.
    pub translation: TranslationSettings,
    /// Speech synthesis chain.
    pub speech: SpeechSettings,
    /// Structured logging.
    pub telemetry: TelemetrySettings,
    /// HTTP host.
    pub server: ServerSettings,
    #[serde(skip)]
    source_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            document: DocumentSettings::default(),
            languages: LanguageSettings::default(),
            translation: TranslationSettings::default(),
            speech: SpeechSettings::default(),
            telemetry: TelemetrySettings::default(),
            server: ServerSettings::default(),
            source_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file; relative paths inside it are
    /// resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config =
            Self::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))?;
        config.source_dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), |path| Self::load(path))
    }

    /// Parses configuration text and validates it.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.document.fallback_message.trim().is_empty() {
            bail!("document.fallback_message must not be empty");
        }
        if self.speech.url_prefix.trim().is_empty() {
            bail!("speech.url_prefix must not be empty");
        }
        self.telemetry.min_level()?;
        Ok(())
    }

    /// Resolves a path relative to the configuration file.
    #[must_use]
    pub fn resolve_path(&self, candidate: impl AsRef<Path>) -> PathBuf {
        let candidate = candidate.as_ref();
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.source_dir.join(candidate)
        }
    }

    /// Resolved document path, if configured.
    #[must_use]
    pub fn document_path(&self) -> Option<PathBuf> {
        self.document.path.as_ref().map(|path| self.resolve_path(path))
    }

    /// Resolved audio directory.
    #[must_use]
    pub fn audio_dir(&self) -> PathBuf {
        self.resolve_path(&self.speech.audio_dir)
    }

    /// Resolved log path, if configured.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.telemetry.log_path.as_ref().map(|path| self.resolve_path(path))
    }
}

/// `[document]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Path to the reference document (`.pdf` or text).
    pub path: Option<PathBuf>,
    /// Message returned when nothing matches.
    pub fallback_message: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            path: None,
            fallback_message: DEFAULT_FALLBACK.into(),
        }
    }
}

/// `[languages]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    /// Language used when a request names none or an unknown one.
    pub default: Language,
}

/// `[translation]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// When false, text is never translated.
    pub enabled: bool,
    /// Translation API endpoint.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl TranslationSettings {
    /// Timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_TRANSLATE_ENDPOINT.into(),
            timeout_ms: 5_000,
        }
    }
}

/// Strategy names accepted in `speech.strategies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// HTTP text-to-speech service.
    Remote,
    /// Local synthesizer command.
    Command,
    /// Empty placeholder; always appended anyway.
    Silent,
}

/// `[speech]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Directory audio files are written to.
    pub audio_dir: PathBuf,
    /// URL prefix the hosting layer serves audio under.
    pub url_prefix: String,
    /// Strategies tried in order before the silent placeholder.
    pub strategies: Vec<StrategyKind>,
    /// Remote TTS endpoint.
    pub endpoint: String,
    /// Local synthesizer program.
    pub command: String,
    /// Timeout applied to each strategy attempt.
    pub timeout_ms: u64,
}

impl SpeechSettings {
    /// Timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("static/audio"),
            url_prefix: "/audio".into(),
            strategies: vec![StrategyKind::Remote, StrategyKind::Command],
            endpoint: DEFAULT_TTS_ENDPOINT.into(),
            command: "espeak-ng".into(),
            timeout_ms: 10_000,
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// JSON-lines log file; no file logging when absent.
    pub log_path: Option<PathBuf>,
    /// Minimum level written (`debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl TelemetrySettings {
    /// Parsed minimum level.
    pub fn min_level(&self) -> Result<LogLevel> {
        self.level
            .parse()
            .with_context(|| format!("telemetry.level `{}`", self.level))
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_path: None,
            level: "info".into(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address of the HTTP host.
    pub bind: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
        }
    }
}
