// Talk endpoint: Received -> Composing -> Synthesizing -> Responding
//
// Generation failures never fail the request (the composer falls back);
// synthesis failures become 500. Single attempt, no retries.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_core::Stream;
use medaka_core::telemetry::StageTimer;
use medaka_core::AudioArtifact;
use serde::Deserialize;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

pub(crate) const REPLY_FILENAME: &str = "reply.mp3";

#[derive(Debug, Deserialize)]
struct TalkRequest {
    #[serde(default)]
    user_input: Option<String>,
}

pub(crate) async fn talk_with_fish_text(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let mut timer = StageTimer::start("talk_with_fish_text");

    // Received
    let req: TalkRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(target: "talk", error = %e, "Rejected malformed talk body");
        ApiError::BadRequest(format!("Invalid JSON body: {e}"))
    })?;
    let user_input = req.user_input.unwrap_or_default();
    if user_input.is_empty() {
        warn!(target: "talk", "Rejected talk request without user_input");
        return Err(ApiError::BadRequest("user_input is required".into()));
    }
    info!(target: "talk", user_input = %user_input, "Received user input");

    let _permit = match &state.limiter {
        Some(sem) => Some(
            sem.clone()
                .acquire_owned()
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        ),
        None => None,
    };

    // Composing
    let health = state.health.get();
    let reply = state.composer.compose(&user_input, health).await;
    timer.mark("composing");
    info!(
        target: "talk",
        reply = %reply.text,
        fallback_used = reply.fallback_used,
        health = %health,
        "Medaka reply"
    );

    // Synthesizing
    let artifact = state.synthesizer.synthesize(&reply.text).await.map_err(|e| {
        error!(
            target: "talk",
            error = %e,
            elapsed_ms = timer.total().as_millis() as u64,
            "Speech synthesis failed"
        );
        ApiError::Internal(e.to_string())
    })?;
    timer.mark("synthesizing");
    drop(_permit);

    // Responding
    let response = audio_response(artifact).await?;
    timer.mark("responding");
    info!(
        target: "talk",
        total_ms = timer.total().as_millis() as u64,
        "Talk request completed"
    );
    Ok(response)
}

/// mp3 download response whose body owns the artifact, so the temp file goes away
/// once the body is fully sent or dropped.
async fn audio_response(artifact: AudioArtifact) -> Result<Response, ApiError> {
    let file = artifact.open().await.map_err(|e| {
        error!(target: "talk", error = %e, "Failed to open synthesized audio");
        ApiError::Internal(e.to_string())
    })?;
    let len = artifact.len();
    let body = Body::from_stream(ArtifactStream {
        inner: ReaderStream::new(file),
        _artifact: artifact,
    });

    let disposition = format!("attachment; filename=\"{REPLY_FILENAME}\"");
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    if let Ok(v) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    Ok(response)
}

struct ArtifactStream {
    inner: ReaderStream<tokio::fs::File>,
    _artifact: AudioArtifact,
}

impl Stream for ArtifactStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
