use crate::config::TtsConfig;
use crate::{MedakaError, Result};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::client::{OpenAiSpeechClient, SpeechProvider};

/// Synthesized mp3 on local disk. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct AudioArtifact {
    path: TempPath,
    len: u64,
}

impl AudioArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub async fn open(&self) -> Result<tokio::fs::File> {
        Ok(tokio::fs::File::open(self.path()).await?)
    }
}

/// Streams speech for reply text into a fresh temp file per call
#[derive(Clone)]
pub struct SpeechSynthesizer {
    provider: Option<Arc<dyn SpeechProvider>>,
    temp_dir: PathBuf,
}

impl SpeechSynthesizer {
    pub fn new(provider: Option<Arc<dyn SpeechProvider>>, temp_dir: PathBuf) -> Self {
        Self { provider, temp_dir }
    }

    /// OpenAI-backed synthesizer; without a credential every call fails as unavailable
    pub fn from_config(cfg: TtsConfig) -> Self {
        let temp_dir = cfg.temp_dir.clone();
        let provider = match OpenAiSpeechClient::new(cfg) {
            Ok(client) => {
                info!(target: "tts", voice = client.voice(), "OpenAI speech synthesis enabled");
                Some(Arc::new(client) as Arc<dyn SpeechProvider>)
            }
            Err(e) => {
                warn!(target: "tts", error = %e, "Speech synthesis disabled");
                None
            }
        };
        Self::new(provider, temp_dir)
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Write the synthesized audio chunk by chunk. On any error the partial file is deleted.
    pub async fn synthesize(&self, text: &str) -> Result<AudioArtifact> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| MedakaError::Unavailable("speech synthesis is not configured".into()))?;

        let start = Instant::now();
        let mut stream = provider.stream_speech(text).await?;
        debug!(
            target: "tts",
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Speech stream opened"
        );

        let named = tempfile::Builder::new()
            .prefix("medaka-")
            .suffix(".mp3")
            .tempfile_in(&self.temp_dir)?;
        let (std_file, path) = named.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut len = 0u64;
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            len += chunk.len() as u64;
            chunks += 1;
        }
        file.flush().await?;

        info!(
            target: "tts",
            bytes = len,
            chunks,
            elapsed_ms = start.elapsed().as_millis() as u64,
            path = %path.display(),
            "Speech written"
        );
        Ok(AudioArtifact { path, len })
    }
}
