//! Magic-link endpoints.
//!
//! Browser-facing routes (`/verify`, `/job/:job_number`) always answer with
//! a redirect: on success to the hub with a fresh session cookie, otherwise
//! to `/?error=expired|invalid`.

use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Json, Redirect, Response};
use serde::Deserialize;

use hub_domain::trace::TraceEvent;

use crate::login::{LoginError, RedeemError, Redemption};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/request-login
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct RequestLoginBody {
    #[serde(default)]
    pub email: String,
}

/// A missing or non-JSON body is treated the same as an empty address.
pub async fn request_login(
    State(state): State<AppState>,
    body: Option<Json<RequestLoginBody>>,
) -> Response {
    let email = body.map(|Json(b)| b.email).unwrap_or_default();

    match state.login.request_login(&email).await {
        Ok(sent) => Json(serde_json::json!({
            "success": true,
            "message": format!("Link sent to {}", sent.email),
        }))
        .into_response(),
        Err(e) => login_failure(&e),
    }
}

fn login_failure(err: &LoginError) -> Response {
    let (status, message) = match err {
        LoginError::NoEmail => (StatusCode::BAD_REQUEST, "Please enter an email address"),
        LoginError::NotFound => (StatusCode::NOT_FOUND, "I don't recognise that email"),
        LoginError::EmailFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to send email"),
        LoginError::Upstream(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Couldn't check that email right now",
        ),
        LoginError::Token(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Couldn't create a login link",
        ),
    };
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": err.code(),
            "message": message,
        })),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /verify
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
}

pub async fn verify(State(state): State<AppState>, Query(q): Query<VerifyQuery>) -> Response {
    if let Some(pin) = q.pin.as_deref().filter(|p| !p.is_empty()) {
        match state.login.bypass(pin) {
            Ok(Some(redemption)) => return signed_in(&state, redemption),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "bypass session could not be issued");
                return error_redirect("/verify", "invalid");
            }
        }
    }

    let Some(token) = q.token.as_deref().filter(|t| !t.is_empty()) else {
        return error_redirect("/verify", "invalid");
    };

    match state.login.redeem(token) {
        Ok(redemption) => signed_in(&state, redemption),
        Err(e) => redeem_failure("/verify", &e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /job/:job_number
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct JobLinkQuery {
    #[serde(default)]
    pub t: Option<String>,
}

pub async fn job_link(
    State(state): State<AppState>,
    Path(job_number): Path<String>,
    Query(q): Query<JobLinkQuery>,
) -> Response {
    let Some(token) = q.t.as_deref().filter(|t| !t.is_empty()) else {
        return error_redirect("/job", "invalid");
    };

    match state.login.redeem_deep_link(&job_number, token) {
        Ok(redemption) => signed_in(&state, redemption),
        Err(e) => redeem_failure("/job", &e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/logout
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, state.cookies.clear_cookie_header())]),
        Json(serde_json::json!({ "success": true })),
    )
}

// ── helpers ─────────────────────────────────────────────────────────

fn signed_in(state: &AppState, redemption: Redemption) -> Response {
    let cookie = state.cookies.set_cookie_header(&redemption.cookie);
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to(&redemption.location),
    )
        .into_response()
}

fn redeem_failure(route: &str, err: &RedeemError) -> Response {
    error_redirect(route, err.reason())
}

fn error_redirect(route: &str, reason: &str) -> Response {
    TraceEvent::TokenRejected {
        route: route.to_owned(),
        reason: reason.to_owned(),
    }
    .emit();
    Redirect::to(&format!("/?error={reason}")).into_response()
}
