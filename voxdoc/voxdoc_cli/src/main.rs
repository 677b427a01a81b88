use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use shared_logging::LogLevel;
use tokio::{runtime::Runtime, sync::mpsc};
use tracing_subscriber::EnvFilter;
use voxdoc_nlp::{
    dispatch, language_table, AppConfig, BatchAnswerController, ConsoleCommandReceiver, HttpHost,
    NlpTelemetry, QaService,
};

const DEFAULT_CONFIG: &str = "voxdoc.toml";

#[derive(Parser, Debug)]
#[command(name = "voxdoc", version, about = "Ask questions about a single reference document")]
struct Cli {
    /// Configuration file; `voxdoc.toml` is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Reference document, overriding the configured one.
    #[arg(long, global = true)]
    document: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answers one question.
    Ask {
        query: String,
        #[arg(long, short)]
        language: Option<String>,
    },
    /// Synthesizes speech for arbitrary text.
    Tts {
        text: String,
        #[arg(long, short)]
        language: Option<String>,
    },
    /// Lists supported languages.
    Languages,
    /// Prints the segmented sentences of the document.
    Sentences,
    /// Answers every line of a file concurrently.
    Batch { questions: PathBuf },
    /// Reads JSON-lines commands from stdin and writes JSON replies.
    Console,
    /// Serves `/ask`, `/tts`, `/languages` and `/audio/<file>` over HTTP.
    Serve {
        /// Listen address, overriding `[server] bind`.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("voxdoc=info,voxdoc_nlp=info,warp=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        config,
        document,
        command,
    } = Cli::parse();
    let open = || Session::open(config.as_deref(), document.as_deref());

    match command {
        Commands::Languages => print_json(&language_table()),
        Commands::Ask { query, language } => {
            let session = open()?;
            let response = session
                .runtime
                .block_on(session.service.ask(&query, language.as_deref()));
            print_json(&response)
        }
        Commands::Tts { text, language } => {
            let session = open()?;
            let response = session
                .runtime
                .block_on(session.service.speak(&text, language.as_deref()));
            print_json(&response)
        }
        Commands::Sentences => {
            let session = open()?;
            let sentences: Vec<_> = session
                .service
                .selector()
                .context()
                .cache()
                .sentences()
                .iter()
                .map(|cached| &cached.sentence)
                .collect();
            print_json(&sentences)
        }
        Commands::Batch { questions } => {
            let session = open()?;
            let raw = fs::read_to_string(&questions)
                .with_context(|| format!("reading questions from {}", questions.display()))?;
            let lines: Vec<String> = raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            let controller = BatchAnswerController::new(
                session.service.selector().clone(),
                Some(session.telemetry.clone()),
            );
            let results = session.runtime.block_on(controller.answer_batch(lines))?;
            print_json(&results)
        }
        Commands::Console => {
            let session = open()?;
            session
                .runtime
                .block_on(run_console(&session.service, session.telemetry.clone()))
        }
        Commands::Serve { bind } => {
            let session = open()?;
            let addr = bind.unwrap_or(session.config.server.bind);
            let host = HttpHost::new(session.service.clone(), session.config.audio_dir())
                .with_telemetry(session.telemetry.clone());
            session.runtime.block_on(host.serve(addr))
        }
    }
}

/// Everything a document-backed command needs.
struct Session {
    config: AppConfig,
    telemetry: NlpTelemetry,
    service: Arc<QaService>,
    runtime: Runtime,
}

impl Session {
    fn open(config: Option<&Path>, document: Option<&Path>) -> Result<Self> {
        let config = load_config(config)?;
        let telemetry = build_telemetry(&config)?;
        let service = QaService::bootstrap(&config, document, Some(telemetry.clone()))?;
        tracing::info!(
            sentences = service.selector().context().cache().len(),
            "reference document loaded"
        );
        Ok(Self {
            config,
            telemetry,
            service: Arc::new(service),
            runtime: Runtime::new()?,
        })
    }
}

fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match explicit {
        Some(path) => AppConfig::load(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            AppConfig::load_or_default(default.exists().then_some(default))
        }
    }
}

fn build_telemetry(config: &AppConfig) -> Result<NlpTelemetry> {
    let mut builder = NlpTelemetry::builder("voxdoc").min_level(config.telemetry.min_level()?);
    if let Some(path) = config.log_path() {
        builder = builder.log_path(path);
    }
    builder.build()
}

async fn run_console(service: &QaService, telemetry: NlpTelemetry) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let receiver = ConsoleCommandReceiver::new(tx, Some(telemetry.clone()));
    let reader = tokio::spawn(async move { receiver.run().await });

    while let Some(command) = rx.recv().await {
        let reply = match dispatch(service, command).await {
            Ok(reply) => reply,
            Err(err) => {
                let _ = telemetry.log(
                    LogLevel::Error,
                    "voxdoc.console.dispatch_failed",
                    json!({ "error": err.to_string() }),
                );
                json!({ "error": err.to_string() })
            }
        };
        println!("{reply}");
    }
    reader.await??;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
