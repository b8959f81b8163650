//! Watch, Learn & Win · comprehension quiz backend
//!
//! - Generates a 10-question quiz about a key concept from a video transcript
//!   (Hugging Face inference API)
//! - Walks a learner through primary and True/False redemption questions
//! - Converts the final score into screen-time minutes
//! - Axum HTTP + WebSocket API, static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   HF_API_TOKEN     : required to generate quizzes
//!   HF_MODEL_URL     : default Mistral-7B-Instruct-v0.2 inference endpoint
//!   QUIZ_CONFIG_PATH : path to TOML config (quiz, generation, reward, cache, prompts, videos)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod cache;
mod prompt;
mod hf;
mod extract;
mod pipeline;
mod transcript;
mod quiz;
mod reward;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = config::load_config_from_env().map_err(|e| {
    error!(target: "watchlearn", error = %e, "Invalid configuration");
    e
  })?;

  // Build shared application state (transcripts, question pipeline, sessions).
  let state = Arc::new(AppState::new(config)?);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "watchlearn", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "watchlearn", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
