//! Text-to-Speech (TTS): remote speech capability and temp-file synthesizer
//!
//! - `SpeechProvider` is the seam to a streaming speech backend
//! - `OpenAiSpeechClient` calls the OpenAI `audio/speech` endpoint (mp3)
//! - `SpeechSynthesizer` writes the byte stream into an `AudioArtifact`,
//!   a temp file deleted when the artifact is dropped
//!
//! Env overrides:
//! - OPENAI_API_KEY, OPENAI_BASE_URL
//! - TTS_MODEL, TTS_VOICE, TTS_SPEED
//! - TTS_TIMEOUT_MS, TTS_TEMP_DIR

mod client;
mod synthesizer;

pub use client::{AudioStream, OpenAiSpeechClient, SpeechProvider};
pub use synthesizer::{AudioArtifact, SpeechSynthesizer};
