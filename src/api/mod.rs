pub mod error;
mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue},
    routing::{any, get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::session::SessionManager;

use handlers::*;

pub const SEND_PATH: &str = "/api/terminal/claude/send";
pub const OUTPUT_PATH: &str = "/api/terminal/claude/output";
pub const STATUS_PATH: &str = "/api/terminal/claude/status";
pub const RESTART_PATH: &str = "/api/terminal/claude/restart";

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

impl AppState {
    pub fn new(manager: SessionManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.manager.config().clone();

    let api = Router::new()
        .route(SEND_PATH, post(send))
        .route(OUTPUT_PATH, get(output))
        .route(STATUS_PATH, get(status))
        .route(RESTART_PATH, post(restart))
        .route("/health", get(health))
        // Unknown API paths stay JSON even when static files own the fallback.
        .route("/api/{*rest}", any(not_found))
        .with_state(state);

    let router = match config.static_dir.as_deref() {
        Some(dir) => api.merge(static_routes(dir)),
        None => api.fallback(not_found),
    };

    let router = router
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http());

    if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Frontend files: `/` and `/terminal` are the app shell, everything else is
/// looked up in `dir` (manifest.json, css/, js/, icons/).
fn static_routes(dir: &Path) -> Router {
    let index = dir.join("index.html");
    Router::new()
        .route_service("/", ServeFile::new(&index))
        .route_service("/terminal", ServeFile::new(&index))
        .fallback_service(ServeDir::new(dir))
}
