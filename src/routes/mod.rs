//! Router assembly: JSON endpoints, quiz pages, static files, CORS, and HTTP tracing.

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
pub mod pages;

/// Build the application router with:
/// - JSON API: `/api/health`, `/api/generate-all-questions`, `/evaluate`, playback plans
/// - Server-rendered quiz under `/quiz`
/// - Static frontend from `server.static_dir` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{static_dir}/index.html")));

    Router::new()
        // JSON API
        .route("/api/health", get(http::http_health))
        .route("/api/generate-all-questions", get(http::http_generate_all))
        .route("/evaluate", post(http::http_evaluate))
        .route("/api/quiz/:id/playback/:kind", get(http::http_playback))
        // Quiz pages
        .route("/quiz", get(pages::quiz_new))
        .route("/quiz/:id", get(pages::quiz_page))
        .route("/quiz/:id/:kind", post(pages::quiz_submit))
        // State + CORS + HTTP tracing
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
        // Frontend fallback
        .fallback_service(static_service)
}
