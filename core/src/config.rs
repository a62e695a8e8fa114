use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration for the medaka talk service
#[derive(Clone, Debug, Default)]
pub struct MedakaConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
}

/// HTTP listener and static file settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub index_path: PathBuf,
    /// Cap on requests inside compose/synthesize at once; None = unbounded
    pub max_concurrent_requests: Option<usize>,
}

/// Gemini text generation settings
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

/// OpenAI speech synthesis settings
#[derive(Clone, Debug)]
pub struct TtsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub voice: String,
    pub speed: f32,
    pub request_timeout_ms: u64,
    pub temp_dir: PathBuf,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env_string("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_parse("PORT").unwrap_or(8000),
            static_dir: env_string("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            index_path: env_string("INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("index.html")),
            max_concurrent_requests: env_parse::<usize>("MAX_CONCURRENT_REQUESTS")
                .filter(|n| *n > 0),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: env_string("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model: env_string("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash-exp".to_string()),
            api_key: env_string("GEMINI_API_KEY"),
            request_timeout_ms: env_parse("GEMINI_TIMEOUT_MS").unwrap_or(30_000),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: env_string("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key: env_string("OPENAI_API_KEY"),
            model: env_string("TTS_MODEL").unwrap_or_else(|| "tts-1".to_string()),
            voice: env_string("TTS_VOICE").unwrap_or_else(|| "nova".to_string()),
            speed: env_parse("TTS_SPEED").unwrap_or(0.9),
            request_timeout_ms: env_parse("TTS_TIMEOUT_MS").unwrap_or(60_000),
            temp_dir: env_string("TTS_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl MedakaConfig {
    /// Load configuration: env-driven defaults, then an optional TOML overlay
    /// (path via MEDAKA_CONFIG or ./medaka.toml). `.env` is read by the binary before this runs.
    pub fn load() -> Self {
        let path = std::env::var("MEDAKA_CONFIG").unwrap_or_else(|_| "medaka.toml".into());
        Self::load_from(Path::new(&path))
    }

    /// Env-driven defaults overlaid with the TOML file at `path`, if it exists and parses.
    pub fn load_from(path: &Path) -> Self {
        let default = Self::default();
        if !path.exists() {
            tracing::info!(target: "config", path = %path.display(), "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(path) {
            Ok(s) => match Self::overlay_toml(&s, default.clone()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(target: "config", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "config", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    pub fn overlay_toml(s: &str, base: MedakaConfig) -> crate::Result<MedakaConfig> {
        let t = toml::from_str::<MedakaToml>(s)
            .map_err(|e| crate::MedakaError::ConfigError(e.to_string()))?;
        Ok(t.overlay(base))
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct MedakaToml {
    pub server: Option<ServerToml>,
    pub llm: Option<LlmToml>,
    pub tts: Option<TtsToml>,
}

impl MedakaToml {
    fn overlay(self, mut base: MedakaConfig) -> MedakaConfig {
        if let Some(s) = self.server {
            s.apply(&mut base.server);
        }
        if let Some(l) = self.llm {
            l.apply(&mut base.llm);
        }
        if let Some(t) = self.tts {
            t.apply(&mut base.tts);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ServerToml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub max_concurrent_requests: Option<usize>,
}
impl ServerToml {
    fn apply(self, s: &mut ServerConfig) {
        if let Some(x) = self.host {
            s.host = x;
        }
        if let Some(x) = self.port {
            s.port = x;
        }
        if let Some(x) = self.static_dir {
            s.static_dir = x;
        }
        if let Some(x) = self.index_path {
            s.index_path = x;
        }
        if let Some(x) = self.max_concurrent_requests {
            // 0 disables the limit
            s.max_concurrent_requests = Some(x).filter(|n| *n > 0);
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct LlmToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
}
impl LlmToml {
    fn apply(self, l: &mut LlmConfig) {
        if let Some(x) = self.base_url {
            l.base_url = x;
        }
        if let Some(x) = self.model {
            l.model = x;
        }
        if let Some(x) = self.api_key {
            l.api_key = Some(x).filter(|k| !k.is_empty());
        }
        if let Some(x) = self.request_timeout_ms {
            l.request_timeout_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct TtsToml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub request_timeout_ms: Option<u64>,
    pub temp_dir: Option<PathBuf>,
}
impl TtsToml {
    fn apply(self, t: &mut TtsConfig) {
        if let Some(x) = self.base_url {
            t.base_url = x;
        }
        if let Some(x) = self.api_key {
            t.api_key = Some(x).filter(|k| !k.is_empty());
        }
        if let Some(x) = self.model {
            t.model = x;
        }
        if let Some(x) = self.voice {
            t.voice = x;
        }
        if let Some(x) = self.speed {
            t.speed = x;
        }
        if let Some(x) = self.request_timeout_ms {
            t.request_timeout_ms = x;
        }
        if let Some(x) = self.temp_dir {
            t.temp_dir = x;
        }
    }
}
