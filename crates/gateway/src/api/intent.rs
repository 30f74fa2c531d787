//! "Ask Dot" endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::api::api_error;
use crate::api::session::SessionUser;
use crate::intent::{ClassifyError, ClientRef};
use crate::state::AppState;

/// Conversation key used when neither the body nor a session names one.
const ANONYMOUS: &str = "anonymous";

fn resolve_session_id(explicit: Option<String>, user: &SessionUser) -> String {
    explicit
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .or_else(|| user.0.as_ref().map(|id| id.email.clone()))
        .unwrap_or_else(|| ANONYMOUS.to_owned())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /claude/parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseBody {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub clients: Vec<ClientRef>,
    #[serde(default)]
    pub session_id: Option<String>,
}

pub async fn parse(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<ParseBody>,
) -> Response {
    let question = body.question.trim();
    if question.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "question is required");
    }
    let Some(intent) = state.intent.as_ref() else {
        return api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "classifier is not configured",
        );
    };

    let session_id = resolve_session_id(body.session_id, &user);
    match intent.classify(&session_id, question, &body.clients).await {
        Ok(parsed) => Json(serde_json::json!({ "parsed": parsed })).into_response(),
        Err(ClassifyError::UnparsableResponse(_)) => Json(serde_json::json!({
            "parsed": null,
            "error": "Could not understand the classifier's reply",
        }))
        .into_response(),
        Err(ClassifyError::UpstreamFailure(_)) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "classifier request failed",
        ),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /claude/clear
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearBody {
    #[serde(default)]
    pub session_id: Option<String>,
}

pub async fn clear(
    State(state): State<AppState>,
    user: SessionUser,
    body: Option<Json<ClearBody>>,
) -> impl IntoResponse {
    let explicit = body.and_then(|Json(b)| b.session_id);
    let session_id = resolve_session_id(explicit, &user);
    let cleared = state.conversations.clear(&session_id);
    Json(serde_json::json!({ "success": true, "cleared": cleared }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_domain::identity::{AccessLevel, Identity};

    #[test]
    fn session_id_fallbacks() {
        let nobody = SessionUser(None);
        let pat = SessionUser(Some(Identity::new(
            "pat@example.com",
            "SKY",
            "Pat",
            AccessLevel::ClientRestricted,
        )));

        assert_eq!(resolve_session_id(Some("Pat".into()), &pat), "Pat");
        assert_eq!(resolve_session_id(Some("  ".into()), &pat), "pat@example.com");
        assert_eq!(resolve_session_id(None, &pat), "pat@example.com");
        assert_eq!(resolve_session_id(None, &nobody), "anonymous");
    }
}
