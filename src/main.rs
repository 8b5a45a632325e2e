//! Language Assessment Quiz Backend
//!
//! - Axum HTTP API: batch generation of six question types and answer grading
//! - Server-rendered quiz pages with per-card feedback
//! - OpenAI-compatible completion provider (via environment variables)
//! - Static frontend fallback (server.static_dir)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   OPENAI_API_KEY    : enables the completion provider if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_MODEL      : default "gpt-4o-mini"
//!   GRADING_MODE      : "local" (default) or "ai"
//!   QUIZ_CONFIG_PATH  : path to TOML config (prompts, grading, generation, server)
//!   STATIC_DIR        : frontend directory, default "./public"
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod prompts;
mod provider;
mod generation;
mod grading;
mod playback;
mod session;
mod render;
mod state;
mod protocol;
mod routes;
#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (provider, prompts, grader, batch store).
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizgen", %addr, mode = %state.grading_mode(), "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "quizgen", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "quizgen", error = %e, "Could not listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
}
