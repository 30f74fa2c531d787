use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/health
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut features = vec!["api", "magic-link-auth", "conversations"];
    if state.intent.is_some() {
        features.push("intent");
    }
    if state.config.server.static_dir.is_some() {
        features.push("static");
    }

    Json(serde_json::json!({
        "status": "ok",
        "service": state.config.observability.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "features": features,
    }))
}
