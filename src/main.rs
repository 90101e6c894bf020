//! Vocabulary Quiz Backend
//!
//! - Multiple-choice quizzes generated from lesson word lists
//! - Axum HTTP + WebSocket API (hosted sessions, pushed snapshots)
//! - Optional OpenAI example sentences (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   OPENAI_API_KEY    : enables example sentences if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL : default "gpt-4o-mini"
//!   QUIZ_CONFIG_PATH  : path to TOML config (prompts, quiz defaults, speech, extra lessons)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod quiz;
mod session;
mod enrichment;
mod controller;
mod config;
mod seeds;
mod state;
mod protocol;
mod logic;
mod openai;
mod routes;
mod pinyin;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (lesson catalog, session registry, sentence source).
  let state = Arc::new(AppState::new());

  // Evict hosted sessions that were completed or abandoned.
  state.spawn_session_sweeper();

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "vocab_quiz", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "vocab_quiz", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "vocab_quiz", error = %e, "Failed to listen for Ctrl+C");
    std::future::pending::<()>().await;
  }
}
