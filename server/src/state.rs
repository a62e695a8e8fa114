use medaka_core::{HealthStateStore, MedakaConfig, ReplyComposer, SpeechSynthesizer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

/// Shared handler state, cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<HealthStateStore>,
    pub composer: Arc<ReplyComposer>,
    pub synthesizer: Arc<SpeechSynthesizer>,
    /// Bounds concurrent compose/synthesize work when configured
    pub limiter: Option<Arc<Semaphore>>,
    pub index_path: PathBuf,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(composer: ReplyComposer, synthesizer: SpeechSynthesizer) -> Self {
        Self {
            health: Arc::new(HealthStateStore::default()),
            composer: Arc::new(composer),
            synthesizer: Arc::new(synthesizer),
            limiter: None,
            index_path: PathBuf::from("index.html"),
            static_dir: PathBuf::from("static"),
        }
    }

    /// Build provider clients once from config. Missing credentials leave that capability disabled.
    pub fn from_config(cfg: &MedakaConfig) -> Self {
        let composer = ReplyComposer::from_config(cfg.llm.clone());
        let synthesizer = SpeechSynthesizer::from_config(cfg.tts.clone());
        let mut state = Self::new(composer, synthesizer)
            .with_index_path(cfg.server.index_path.clone())
            .with_static_dir(cfg.server.static_dir.clone());
        if let Some(n) = cfg.server.max_concurrent_requests {
            state = state.with_concurrency_limit(n);
        }
        state
    }

    /// Cap in-flight talk requests. Zero means unbounded.
    pub fn with_concurrency_limit(mut self, permits: usize) -> Self {
        if permits == 0 {
            self.limiter = None;
            return self;
        }
        info!(target: "server", permits, "Concurrency limit enabled for talk requests");
        self.limiter = Some(Arc::new(Semaphore::new(permits)));
        self
    }

    pub fn with_index_path(mut self, path: PathBuf) -> Self {
        self.index_path = path;
        self
    }

    pub fn with_static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = dir;
        self
    }
}
