use crate::config::LlmConfig;
use crate::{MedakaError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

/// Remote text-generation capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// HTTP client for the Gemini `models/{model}:generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    cfg: LlmConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: LlmConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| MedakaError::Unavailable("GEMINI_API_KEY is not set".into()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| MedakaError::GenerationError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg, api_key })
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        );
        debug!(target: "llm_client", "POST {} via generateContent", url);

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MedakaError::GenerationError(format!("Gemini HTTP error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target: "llm_client", %status, body = %text, "Gemini error");
            return Err(MedakaError::GenerationError(format!(
                "Gemini error: status={} body={}",
                status, text
            )));
        }

        let val: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| MedakaError::GenerationError(format!("Failed to parse Gemini JSON: {e}")))?;
        extract_text_from_candidates(&val).ok_or_else(|| {
            MedakaError::GenerationError("Missing candidates[0].content.parts text".into())
        })
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text_from_candidates(v: &serde_json::Value) -> Option<String> {
    let parts = v
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(key: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:9/v1beta".into(),
            model: "gemini-test".into(),
            api_key: key.map(str::to_string),
            request_timeout_ms: 1_000,
        }
    }

    #[test]
    fn missing_key_is_unavailable() {
        let err = GeminiClient::new(cfg(None)).err().unwrap();
        assert!(matches!(err, MedakaError::Unavailable(_)));
    }

    #[test]
    fn client_creation_succeeds_with_key() {
        let client = GeminiClient::new(cfg(Some("k"))).unwrap();
        assert_eq!(client.model(), "gemini-test");
    }

    #[test]
    fn extracts_joined_parts() {
        let v = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "わあい" }, { "text": "！" }] }
            }]
        });
        assert_eq!(extract_text_from_candidates(&v).as_deref(), Some("わあい！"));
    }

    #[test]
    fn blocked_response_yields_none() {
        let v = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(extract_text_from_candidates(&v).is_none());
        let empty = json!({ "candidates": [{ "content": { "parts": [] } }] });
        assert!(extract_text_from_candidates(&empty).is_none());
    }

    #[tokio::test]
    async fn unreachable_backend_is_generation_error() {
        let client = GeminiClient::new(cfg(Some("k"))).unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, MedakaError::GenerationError(_)));
    }
}
