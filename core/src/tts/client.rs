use crate::config::TtsConfig;
use crate::{MedakaError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Incremental audio bytes from a speech backend
pub type AudioStream = BoxStream<'static, Result<Bytes>>;

/// Remote speech-synthesis capability
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Start synthesis of `text` and return the audio as it arrives
    async fn stream_speech(&self, text: &str) -> Result<AudioStream>;
}

#[derive(Serialize, Debug)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    speed: f32,
    input: &'a str,
    response_format: &'static str,
}

/// HTTP client for the OpenAI `audio/speech` endpoint
#[derive(Clone)]
pub struct OpenAiSpeechClient {
    http: Client,
    cfg: TtsConfig,
    api_key: String,
}

impl OpenAiSpeechClient {
    pub fn new(cfg: TtsConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| MedakaError::Unavailable("OPENAI_API_KEY is not set".into()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| MedakaError::SynthesisError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg, api_key })
    }

    pub fn voice(&self) -> &str {
        &self.cfg.voice
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechClient {
    async fn stream_speech(&self, text: &str) -> Result<AudioStream> {
        let url = format!("{}/audio/speech", self.cfg.base_url.trim_end_matches('/'));
        debug!(target: "tts", "POST {}", url);

        let body = SpeechRequest {
            model: &self.cfg.model,
            voice: &self.cfg.voice,
            speed: self.cfg.speed,
            input: text,
            response_format: "mp3",
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MedakaError::SynthesisError(format!("Speech HTTP error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target: "tts", %status, body = %text, "Speech API error");
            return Err(MedakaError::SynthesisError(format!(
                "Speech API error: status={} body={}",
                status, text
            )));
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| MedakaError::SynthesisError(format!("Speech stream error: {e}"))))
            .boxed();
        Ok(stream)
    }
}
