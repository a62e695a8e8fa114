// Medaka Core Library
// Reply composition, speech synthesis and health state for the medaka talk service

pub mod config;
pub mod health;
pub mod llm;
pub mod telemetry;
pub mod tts;

// Export core types
pub use config::{LlmConfig, MedakaConfig, ServerConfig, TtsConfig};
pub use health::{HealthState, HealthStateStore};
pub use llm::{GeminiClient, Reply, ReplyComposer, TextGenerator};
pub use tts::{AudioArtifact, OpenAiSpeechClient, SpeechProvider, SpeechSynthesizer};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedakaError {
    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Invalid health status: {0}")]
    InvalidHealth(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MedakaError>;
