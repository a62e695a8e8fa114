//! # medaka-server
//!
//! axum HTTP surface for the medaka talk service.
//!
//! Provides:
//! - `POST /talk_with_fish_text`: text in, spoken mp3 reply out
//! - `POST /update_health`, `GET /health_status`: health state of the fish
//! - `GET /health`: liveness probe
//! - `GET /` and `/static/*`: the bundled page and its assets

mod api;
mod error;
mod state;
mod talk;

pub use api::{router, MedakaServer};
pub use error::ApiError;
pub use state::AppState;
