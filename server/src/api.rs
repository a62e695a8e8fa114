// HTTP API server
//
// Routes for the talk flow, the health state of the fish and the bundled page

use crate::error::ApiError;
use crate::state::AppState;
use crate::talk::talk_with_fish_text;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use medaka_core::{HealthState, MedakaConfig};
use serde_json::{json, Value};
use std::io::ErrorKind;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

/// Medaka HTTP server
pub struct MedakaServer {
    config: MedakaConfig,
    state: AppState,
}

impl MedakaServer {
    pub fn new(config: MedakaConfig) -> Self {
        let state = AppState::from_config(&config);
        Self { config, state }
    }

    /// Bind and serve until ctrl-c
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.server.addr();
        info!(target: "server", addr = %addr, "Starting medaka server");

        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(
            target: "server",
            url = %format!("http://{}", addr),
            "Medaka server ready"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!(target: "server", "Shutdown signal received");
            })
            .await?;

        Ok(())
    }
}

/// Build the router with open CORS (any origin, method and header)
pub fn router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();
    Router::new()
        .route("/", get(index_handler))
        .route("/talk_with_fish_text", post(talk_with_fish_text))
        .route("/update_health", post(update_health_handler))
        .route("/health_status", get(health_status_handler))
        .route("/health", get(liveness_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn index_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    match tokio::fs::read(&state.index_path).await {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(target: "server", path = %state.index_path.display(), "Index page not found");
            Ok((
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "HTMLファイルが見つかりません" })),
            )
                .into_response())
        }
        Err(e) => {
            error!(target: "server", path = %state.index_path.display(), error = %e, "Failed to read index page");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

async fn update_health_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;
    let Value::Object(fields) = req else {
        warn!(target: "health", "Rejected non-object health update");
        return Err(ApiError::BadRequest("Invalid health status".into()));
    };

    // Absent key means Normal; null, numbers and unknown names are rejected
    let raw = match fields.get("health_status") {
        None => HealthState::Normal.as_str().to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    match state.health.set(&raw) {
        Ok(health) => Ok(Json(json!({ "status": "success", "health": health }))),
        Err(e) => {
            warn!(target: "health", error = %e, "Rejected health update");
            Err(ApiError::BadRequest("Invalid health status".into()))
        }
    }
}

async fn health_status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "health": state.health.get() }))
}

/// Liveness probe with the current health and epoch seconds
async fn liveness_handler(State(state): State<AppState>) -> Json<Value> {
    let timestamp = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    Json(json!({
        "status": "healthy",
        "medaka_health": state.health.get(),
        "timestamp": timestamp,
    }))
}
