use medaka_core::telemetry::init_logging;
use medaka_core::MedakaConfig;
use medaka_server::MedakaServer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // .env may carry RUST_LOG, so load it before the subscriber reads the filter
    let dotenv = dotenvy::dotenv();
    init_logging("info,medaka_core=info,medaka_server=info");
    match dotenv {
        Ok(path) => info!(target: "config", path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => info!(target: "config", "No .env file found"),
        Err(e) => warn!(target: "config", error = %e, "Failed to read .env file"),
    }

    info!(target: "server", version = env!("CARGO_PKG_VERSION"), "Starting medaka talk system");

    // Defaults + env + optional TOML overlay
    let config = MedakaConfig::load();

    MedakaServer::new(config).serve().await?;

    info!(target: "server", "Server shutdown complete");
    Ok(())
}
