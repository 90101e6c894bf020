//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one quiz per connection, pushed snapshots and utterances)
/// - lessons, words and hosted quiz sessions under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/lessons", get(http::http_list_lessons))
        .route("/api/v1/lessons/:lesson_id", get(http::http_get_lesson))
        .route("/api/v1/words", get(http::http_list_words))
        .route("/api/v1/quiz", post(http::http_start_quiz))
        .route(
            "/api/v1/quiz/:session_id",
            get(http::http_get_quiz).delete(http::http_discard_quiz),
        )
        .route("/api/v1/quiz/:session_id/answer", post(http::http_post_answer))
        .route("/api/v1/quiz/:session_id/advance", post(http::http_post_advance))
        .route("/api/v1/quiz/:session_id/restart", post(http::http_post_restart))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}
