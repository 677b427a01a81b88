//! Console command ingestion: one JSON object per line on stdin.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_logging::LogLevel;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc::UnboundedSender,
};

use crate::{answer::QaService, telemetry::NlpTelemetry};

/// Commands accepted from the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleCommand {
    /// Ask a question about the loaded document.
    Ask {
        /// Question text.
        query: String,
        /// Requested language code.
        #[serde(default)]
        language: Option<String>,
    },
    /// Synthesize speech for arbitrary text.
    Tts {
        /// Text to speak.
        text: String,
        /// Requested language code.
        #[serde(default)]
        language: Option<String>,
    },
    /// List supported languages.
    Languages,
    /// Exit the loop.
    Quit,
}

/// Receives JSON line commands and forwards them to a channel.
pub struct ConsoleCommandReceiver {
    sender: UnboundedSender<ConsoleCommand>,
    telemetry: Option<NlpTelemetry>,
}

impl ConsoleCommandReceiver {
    /// Creates a new receiver.
    #[must_use]
    pub fn new(sender: UnboundedSender<ConsoleCommand>, telemetry: Option<NlpTelemetry>) -> Self {
        Self { sender, telemetry }
    }

    /// Reads stdin until EOF or `quit`.
    pub async fn run(&self) -> Result<()> {
        self.run_from(BufReader::new(tokio::io::stdin())).await
    }

    /// Reads commands from `reader` until EOF or `quit`. Malformed lines are
    /// logged and skipped.
    pub async fn run_from<R>(&self, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let cmd: ConsoleCommand = match serde_json::from_str(&line) {
                Ok(cmd) => cmd,
                Err(err) => {
                    tracing::warn!("skipping console line: {err}");
                    self.log(
                        LogLevel::Warn,
                        "nlp.console.invalid_command",
                        json!({ "error": err.to_string() }),
                    );
                    continue;
                }
            };
            if matches!(cmd, ConsoleCommand::Quit) {
                break;
            }
            self.sender.send(cmd)?;
        }
        self.log(LogLevel::Info, "nlp.console.receiver_shutdown", json!({}));
        Ok(())
    }

    fn log(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

/// Executes one command against the service and returns the JSON reply.
pub async fn dispatch(service: &QaService, command: ConsoleCommand) -> Result<Value> {
    let reply = match command {
        ConsoleCommand::Ask { query, language } => {
            serde_json::to_value(service.ask(&query, language.as_deref()).await)?
        }
        ConsoleCommand::Tts { text, language } => {
            serde_json::to_value(service.speak(&text, language.as_deref()).await)?
        }
        ConsoleCommand::Languages => serde_json::to_value(service.languages())?,
        ConsoleCommand::Quit => json!({ "status": "bye" }),
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    use crate::{
        comprehension::{AnswerSelector, DocumentContext, DEFAULT_FALLBACK},
        language::Language,
        speech::{AudioStore, SynthesisChain},
        translation::PassthroughTranslator,
    };

    #[tokio::test]
    async fn forwards_commands_and_skips_garbage() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let receiver = ConsoleCommandReceiver::new(tx, None);
        let input: &[u8] = b"{\"type\":\"ask\",\"query\":\"who?\",\"language\":\"fr\"}\n\
not json\n\
\n\
{\"type\":\"languages\"}\n\
{\"type\":\"quit\"}\n\
{\"type\":\"languages\"}\n";
        receiver.run_from(input).await.unwrap();
        drop(receiver);

        let mut received = Vec::new();
        while let Some(cmd) = rx.recv().await {
            received.push(cmd);
        }
        assert_eq!(
            received,
            vec![
                ConsoleCommand::Ask {
                    query: "who?".into(),
                    language: Some("fr".into()),
                },
                ConsoleCommand::Languages,
            ]
        );
    }

    #[tokio::test]
    async fn dispatch_produces_json_replies() {
        let dir = tempfile::tempdir().unwrap();
        let context = DocumentContext::from_text(
            "inline",
            "The library opens at nine. Parking is free on weekends.",
            DEFAULT_FALLBACK,
        )
        .unwrap();
        let chain = SynthesisChain::new(AudioStore::new(dir.path(), "/audio"), Vec::new());
        let service = QaService::new(
            AnswerSelector::new(Arc::new(context), None),
            Arc::new(PassthroughTranslator),
            Arc::new(chain),
            Language::English,
        );

        let reply = dispatch(
            &service,
            ConsoleCommand::Ask {
                query: "When does the library open?".into(),
                language: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(reply["response"], "The library opens at nine.");
        assert_eq!(reply["language"], "en");

        let tts = dispatch(
            &service,
            ConsoleCommand::Tts {
                text: String::new(),
                language: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(tts["error"], "No text provided");

        let langs = dispatch(&service, ConsoleCommand::Languages).await.unwrap();
        assert_eq!(langs["hi"]["voice"], "hi-IN");
    }
}
