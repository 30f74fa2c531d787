//! Session cookie extraction.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json};

use hub_domain::identity::Identity;
use hub_domain::trace::TraceEvent;

use crate::state::AppState;

/// The identity behind the request's session cookie, if any.
///
/// Never rejects: a missing, tampered or expired cookie is simply `None`.
/// Handlers that require a user check the option themselves.
pub struct SessionUser(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| state.cookies.extract_from_header(raw));

        let Some(token) = token else {
            return Ok(SessionUser(None));
        };

        match state.cookies.validate(token) {
            Ok(record) => Ok(SessionUser(Some(record.identity))),
            Err(e) => {
                TraceEvent::TokenRejected {
                    route: parts.uri.path().to_owned(),
                    reason: e.reason().to_owned(),
                }
                .emit();
                Ok(SessionUser(None))
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/check-session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn check_session(SessionUser(user): SessionUser) -> impl IntoResponse {
    match user {
        Some(identity) => Json(serde_json::json!({
            "authenticated": true,
            "user": identity,
        })),
        None => Json(serde_json::json!({ "authenticated": false })),
    }
}
