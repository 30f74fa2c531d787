pub mod health;
pub mod intent;
pub mod login;
pub mod session;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// There is no bearer-token layer: every route either establishes a
/// session or reads it from the session cookie itself.
pub fn router() -> Router<AppState> {
    Router::new()
        // Magic-link login
        .route("/api/request-login", post(login::request_login))
        .route("/verify", get(login::verify))
        .route("/job/:job_number", get(login::job_link))
        .route("/api/logout", post(login::logout))
        // Session
        .route("/api/check-session", get(session::check_session))
        // Ask Dot
        .route("/claude/parse", post(intent::parse))
        .route("/claude/clear", post(intent::clear))
        // Health
        .route("/api/health", get(health::health))
}

/// Build a JSON error response: `{ "error": message }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
