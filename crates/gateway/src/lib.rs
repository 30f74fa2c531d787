pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod directory;
pub mod intent;
pub mod login;
pub mod notify;
pub mod state;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The API router with request tracing and, when `server.static_dir` is
/// set, the built frontend as the fallback for every other path.
pub fn app(state: AppState) -> Router {
    let router = api::router();

    let router = match state.config.server.static_dir.as_deref() {
        Some(dir) if dir.exists() => {
            let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
            tracing::info!(dir = %dir.display(), "serving frontend");
            router.fallback_service(spa)
        }
        Some(dir) => {
            tracing::warn!(dir = %dir.display(), "static_dir does not exist; frontend not served");
            router
        }
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
