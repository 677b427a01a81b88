//! HTTP host: JSON endpoints over [`QaService`] and static audio files.
//!
//! | Route | Body | Reply |
//! |---|---|---|
//! | `POST /ask` | `{"query", "language"}` | [`crate::AskResponse`] |
//! | `POST /tts` | `{"text", "language"}` | [`crate::SpeakResponse`] |
//! | `GET /languages` | none | language table |
//! | `GET /audio/<filename>` | none | file from the audio directory |

use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use shared_logging::LogLevel;
use warp::{Filter, Rejection, Reply};

use crate::{answer::QaService, telemetry::NlpTelemetry};

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Body of `POST /ask`. Missing fields take their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AskRequest {
    /// Question text.
    pub query: String,
    /// Requested language code.
    pub language: Option<String>,
}

/// Body of `POST /tts`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TtsRequest {
    /// Text to speak.
    pub text: String,
    /// Requested language code.
    pub language: Option<String>,
}

/// Serves a [`QaService`] over HTTP. Audio files written by the service are
/// exposed under `/audio/`.
pub struct HttpHost {
    service: Arc<QaService>,
    audio_dir: PathBuf,
    telemetry: Option<NlpTelemetry>,
}

impl HttpHost {
    /// Creates a host over `service`, serving files from `audio_dir`.
    #[must_use]
    pub fn new(service: Arc<QaService>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            audio_dir: audio_dir.into(),
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: NlpTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Combined route filter.
    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone + Send + Sync + 'static
    {
        let service = self.service.clone();
        let service_filter = warp::any().map(move || service.clone());

        let ask = warp::path!("ask")
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::json())
            .and(service_filter.clone())
            .and_then(ask_handler);

        let tts = warp::path!("tts")
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::json())
            .and(service_filter.clone())
            .and_then(tts_handler);

        let languages = warp::path!("languages")
            .and(warp::get())
            .and(service_filter)
            .map(|service: Arc<QaService>| warp::reply::json(&service.languages()));

        let audio = warp::path("audio").and(warp::fs::dir(self.audio_dir.clone()));

        ask.or(tts)
            .or(languages)
            .or(audio)
            .with(warp::trace::request())
    }

    /// Binds `addr` and serves until the process stops.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .with_context(|| format!("creating audio directory {}", self.audio_dir.display()))?;
        let (bound, server) = warp::serve(self.routes())
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding {addr}"))?;
        tracing::info!(%bound, "http host listening");
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "nlp.server.listening",
                json!({ "addr": bound.to_string() }),
            );
        }
        server.await;
        Ok(())
    }
}

async fn ask_handler(
    request: AskRequest,
    service: Arc<QaService>,
) -> Result<impl Reply, Infallible> {
    let response = service.ask(&request.query, request.language.as_deref()).await;
    Ok(warp::reply::json(&response))
}

async fn tts_handler(
    request: TtsRequest,
    service: Arc<QaService>,
) -> Result<impl Reply, Infallible> {
    let response = service.speak(&request.text, request.language.as_deref()).await;
    Ok(warp::reply::json(&response))
}
