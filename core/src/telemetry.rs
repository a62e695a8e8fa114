// Logging setup and per-stage timing
use std::time::{Duration, Instant};
use tracing::info;

/// Install the global fmt subscriber. Filter comes from RUST_LOG, falling back to `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Wall-clock timer for one request, logging each stage it passes through
#[derive(Debug)]
pub struct StageTimer {
    request: &'static str,
    started: Instant,
    last: Instant,
}

impl StageTimer {
    pub fn start(request: &'static str) -> Self {
        let now = Instant::now();
        Self {
            request,
            started: now,
            last: now,
        }
    }

    /// Log the time spent since the previous mark and return it
    pub fn mark(&mut self, stage: &'static str) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        info!(
            target: "timing",
            request = self.request,
            stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stage finished"
        );
        elapsed
    }

    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_sum_to_at_most_total() {
        let mut t = StageTimer::start("test");
        let a = t.mark("one");
        std::thread::sleep(Duration::from_millis(2));
        let b = t.mark("two");
        assert!(b >= Duration::from_millis(2));
        assert!(a + b <= t.total());
    }
}
