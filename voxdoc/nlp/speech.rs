use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use shared_logging::LogLevel;
use thiserror::Error;
use tokio::{fs, process::Command, time::timeout};
use uuid::Uuid;

use crate::{language::Language, telemetry::NlpTelemetry};

/// Google Translate TTS endpoint, as used by gTTS.
pub const DEFAULT_TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";
/// Longest text the remote endpoint accepts per request.
pub const TTS_CHUNK_CHARS: usize = 100;

/// Failures of a single synthesis strategy.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Nothing to say.
    #[error("no text to synthesize")]
    EmptyText,
    /// Network or client failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("speech service returned status {0}")]
    Status(u16),
    /// Local synthesizer failed.
    #[error("synthesizer command failed: {0}")]
    Command(String),
    /// Local synthesizer ran too long.
    #[error("synthesizer timed out after {0:?}")]
    Timeout(Duration),
    /// Writing the artifact failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reference to a synthesized audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioArtifact {
    /// File name inside the audio directory.
    pub filename: String,
    /// Full path on disk.
    pub path: PathBuf,
    /// URL under which the hosting layer serves the file.
    pub url: String,
    /// Strategy that produced the file.
    pub strategy: &'static str,
    /// Size in bytes (0 for the silent placeholder).
    pub bytes: u64,
}

/// One way of rendering speech into a file.
#[async_trait]
pub trait SpeechStrategy: Send + Sync {
    /// Short name for logs and artifacts.
    fn name(&self) -> &'static str;

    /// Renders `text` into `target`.
    async fn render(
        &self,
        text: &str,
        language: Language,
        target: &Path,
    ) -> Result<(), SpeechError>;
}

/// Capability consumed by the hosting layer. Never fails.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Produces an audio artifact for `text`.
    async fn synthesize(&self, text: &str, language: Language) -> AudioArtifact;
}

/// Splits text into chunks of at most `max_chars` characters on word
/// boundaries; words longer than the limit are cut.
#[must_use]
pub fn split_tts_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect::<String>()));
            continue;
        }
        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Fetches MP3 audio from a gTTS-style HTTP endpoint, chunk by chunk.
#[derive(Debug, Clone)]
pub struct RemoteTtsStrategy {
    client: Client,
    endpoint: String,
}

impl RemoteTtsStrategy {
    /// Creates the strategy with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("voxdoc/0.1")
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SpeechStrategy for RemoteTtsStrategy {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn render(
        &self,
        text: &str,
        language: Language,
        target: &Path,
    ) -> Result<(), SpeechError> {
        let chunks = split_tts_chunks(text, TTS_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language.speech_code()),
                    ("q", chunk.as_str()),
                    ("idx", idx.as_str()),
                    ("total", total.as_str()),
                ])
                .send()
                .await
                .map_err(|err| SpeechError::Transport(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(SpeechError::Status(status.as_u16()));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|err| SpeechError::Transport(err.to_string()))?;
            audio.extend_from_slice(&bytes);
        }
        fs::write(target, audio).await?;
        Ok(())
    }
}

/// Runs an offline synthesizer such as `espeak-ng -v <lang> -w <file> <text>`.
#[derive(Debug, Clone)]
pub struct CommandTtsStrategy {
    program: String,
    limit: Duration,
}

impl CommandTtsStrategy {
    /// Creates the strategy for `program` with a run-time limit.
    #[must_use]
    pub fn new(program: impl Into<String>, limit: Duration) -> Self {
        Self {
            program: program.into(),
            limit,
        }
    }

    /// Arguments for one invocation. `--` ends option parsing so text that
    /// starts with a dash is spoken rather than read as a flag.
    fn command_args(language: Language, target: &Path, text: &str) -> Vec<OsString> {
        vec![
            "-v".into(),
            language.speech_code().into(),
            "-w".into(),
            target.as_os_str().to_owned(),
            "--".into(),
            text.into(),
        ]
    }
}

#[async_trait]
impl SpeechStrategy for CommandTtsStrategy {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn render(
        &self,
        text: &str,
        language: Language,
        target: &Path,
    ) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let mut command = Command::new(&self.program);
        command
            .args(Self::command_args(language, target, text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = command
            .spawn()
            .map_err(|err| SpeechError::Command(format!("{}: {err}", self.program)))?;
        let output = timeout(self.limit, child.wait_with_output())
            .await
            .map_err(|_| SpeechError::Timeout(self.limit))??;
        if !output.status.success() {
            return Err(SpeechError::Command(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal strategy: writes an empty file so the audio URL still resolves.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentStrategy;

#[async_trait]
impl SpeechStrategy for SilentStrategy {
    fn name(&self) -> &'static str {
        "silent"
    }

    async fn render(
        &self,
        _text: &str,
        _language: Language,
        target: &Path,
    ) -> Result<(), SpeechError> {
        fs::write(target, b"").await?;
        Ok(())
    }
}

/// Names audio files and maps them to URLs.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    url_prefix: String,
}

impl AudioStore {
    /// Creates a store rooted at `dir`, served under `url_prefix`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Audio directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocates a fresh `<uuid>.mp3` name, returning `(filename, path, url)`.
    #[must_use]
    pub fn allocate(&self) -> (String, PathBuf, String) {
        let filename = format!("{}.mp3", Uuid::new_v4());
        let path = self.dir.join(&filename);
        let url = format!("{}/{}", self.url_prefix, filename);
        (filename, path, url)
    }
}

/// Ordered graceful-degradation chain of synthesis strategies, always ending
/// with [`SilentStrategy`].
pub struct SynthesisChain {
    store: AudioStore,
    strategies: Vec<Arc<dyn SpeechStrategy>>,
    telemetry: Option<NlpTelemetry>,
}

impl SynthesisChain {
    /// Creates a chain trying `strategies` in order.
    #[must_use]
    pub fn new(store: AudioStore, strategies: Vec<Arc<dyn SpeechStrategy>>) -> Self {
        Self {
            store,
            strategies,
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: NlpTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Names of the configured strategies, terminal one included.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies
            .iter()
            .map(|strategy| strategy.name())
            .chain(std::iter::once(SilentStrategy.name()))
            .collect()
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for SynthesisChain {
    async fn synthesize(&self, text: &str, language: Language) -> AudioArtifact {
        let (filename, path, url) = self.store.allocate();
        if let Err(err) = fs::create_dir_all(self.store.dir()).await {
            tracing::warn!("cannot create audio directory {:?}: {err}", self.store.dir());
        }
        let mut produced_by = None;
        for strategy in &self.strategies {
            match strategy.render(text, language, &path).await {
                Ok(()) => {
                    produced_by = Some(strategy.name());
                    break;
                }
                Err(err) => {
                    tracing::warn!("speech strategy {} failed: {err}", strategy.name());
                    self.log(
                        LogLevel::Warn,
                        "nlp.speech.strategy_failed",
                        json!({ "strategy": strategy.name(), "error": err.to_string() }),
                    );
                    let _ = fs::remove_file(&path).await;
                }
            }
        }
        let strategy = match produced_by {
            Some(name) => name,
            None => {
                if let Err(err) = SilentStrategy.render(text, language, &path).await {
                    tracing::warn!("silent audio placeholder not written: {err}");
                    self.log(
                        LogLevel::Error,
                        "nlp.speech.placeholder_failed",
                        json!({ "error": err.to_string() }),
                    );
                }
                SilentStrategy.name()
            }
        };
        let bytes = fs::metadata(&path).await.map_or(0, |meta| meta.len());
        self.log(
            LogLevel::Info,
            "nlp.speech.synthesized",
            json!({ "strategy": strategy, "bytes": bytes, "language": language.code() }),
        );
        AudioArtifact {
            filename,
            path,
            url,
            strategy,
            bytes,
        }
    }
}
