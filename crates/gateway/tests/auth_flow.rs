//! End-to-end magic-link login through the HTTP router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use parking_lot::Mutex;
use tower::ServiceExt;

use hub_domain::config::{BypassConfig, Config};
use hub_domain::error::Result;
use hub_domain::identity::{AccessLevel, Identity};
use hub_gateway::bootstrap::{self, Collaborators};
use hub_gateway::directory::StaticDirectory;
use hub_gateway::notify::{Notifier, OutboundEmail};
use hub_tokens::{IdentityRecord, TokenCodec};

const SECRET: &[u8] = b"auth-flow-test-secret";

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Notifier for Outbox {
    fn name(&self) -> &'static str {
        "outbox"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

fn pat() -> Identity {
    Identity::new("pat@example.com", "SKY", "Pat", AccessLevel::ClientRestricted)
}

fn app() -> (Router, Arc<Outbox>) {
    let mut config = Config::default();
    config.server.public_url = "https://hub.example.com".into();

    let outbox = Arc::new(Outbox::default());
    let state = bootstrap::assemble(
        Arc::new(config),
        SECRET,
        Collaborators {
            directory: Arc::new(StaticDirectory::new([pat()])),
            notifier: outbox.clone(),
            classifier: None,
        },
    );
    (hub_gateway::app(state), outbox)
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn set_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// `name=value` part of a `Set-Cookie` header.
fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap()
}

#[tokio::test]
async fn login_verify_and_check_session() {
    let (app, outbox) = app();

    let resp = send(
        &app,
        post_json("/api/request-login", serde_json::json!({ "email": " Pat@Example.com " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Link sent to pat@example.com");

    let link = outbox.sent.lock()[0].link.clone();
    let token = link
        .strip_prefix("https://hub.example.com/verify?token=")
        .unwrap()
        .to_owned();

    let resp = send(&app, get(&format!("/verify?token={token}"))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let cookie = set_cookie(&resp).unwrap();
    assert!(cookie.starts_with("dot_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains(&format!("Max-Age={}", 7 * 86_400)));

    let resp = send(
        &app,
        Request::get("/api/check-session")
            .header(header::COOKIE, cookie_pair(&cookie))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let body = json_body(resp).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], "pat@example.com");
    assert_eq!(body["user"]["firstName"], "Pat");
    assert_eq!(body["user"]["clientCode"], "SKY");
    assert_eq!(body["user"]["accessLevel"], "Client WIP");
}

#[tokio::test]
async fn unknown_email_is_404() {
    let (app, outbox) = app();
    let resp = send(
        &app,
        post_json("/api/request-login", serde_json::json!({ "email": "who@example.com" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "I don't recognise that email");
    assert!(outbox.sent.lock().is_empty());
}

#[tokio::test]
async fn missing_email_is_400() {
    let (app, _) = app();
    let resp = send(&app, post_json("/api/request-login", serde_json::json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "no_email");

    let resp = send(
        &app,
        Request::post("/api/request-login").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_token_redirects_without_cookie() {
    let (app, _) = app();
    let stale = TokenCodec::new(SECRET)
        .encode_record(&IdentityRecord {
            identity: pat(),
            expires_at: Utc::now().timestamp() - 60,
        })
        .unwrap();

    let resp = send(&app, get(&format!("/verify?token={stale}"))).await;
    assert_eq!(location(&resp), "/?error=expired");
    assert!(set_cookie(&resp).is_none());
}

#[tokio::test]
async fn foreign_or_missing_token_is_invalid() {
    let (app, _) = app();
    let foreign = TokenCodec::new("some other secret")
        .encode(&pat(), std::time::Duration::from_secs(3600))
        .unwrap();

    for uri in [
        format!("/verify?token={foreign}"),
        "/verify".to_string(),
        "/verify?token=not-a-token".to_string(),
    ] {
        let resp = send(&app, get(&uri)).await;
        assert_eq!(location(&resp), "/?error=invalid", "{uri}");
        assert!(set_cookie(&resp).is_none());
    }
}

#[tokio::test]
async fn pin_is_ignored_when_bypass_disabled() {
    let (app, _) = app();
    let resp = send(&app, get("/verify?pin=9871")).await;
    assert_eq!(location(&resp), "/?error=invalid");
    assert!(set_cookie(&resp).is_none());
}

#[tokio::test]
async fn armed_pin_signs_in_with_full_access() {
    let pin_env = "HUB_AUTH_FLOW_BYPASS_PIN";
    std::env::set_var(pin_env, "2468");

    let mut config = Config::default();
    config.auth.bypass = Some(BypassConfig {
        pin_env: pin_env.into(),
        email: "boss@example.com".into(),
        first_name: "Boss".into(),
        client_code: "ALL".into(),
    });
    let state = bootstrap::assemble(
        Arc::new(config),
        SECRET,
        Collaborators {
            directory: Arc::new(StaticDirectory::new([pat()])),
            notifier: Arc::new(Outbox::default()),
            classifier: None,
        },
    );
    std::env::remove_var(pin_env);
    assert!(state.login.bypass_enabled());
    let app = hub_gateway::app(state);

    let resp = send(&app, get("/verify?pin=2468")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let cookie = set_cookie(&resp).unwrap();
    let token = cookie_pair(&cookie).strip_prefix("dot_session=").unwrap();
    let record = TokenCodec::new(SECRET).decode(token).unwrap();
    assert_eq!(record.identity.email, "boss@example.com");
    assert_eq!(record.identity.access_level, AccessLevel::Full);

    let resp = send(&app, get("/verify?pin=1111")).await;
    assert_eq!(location(&resp), "/?error=invalid");
    assert!(set_cookie(&resp).is_none());
}

#[tokio::test]
async fn deep_link_sets_cookie_and_opens_job() {
    let (app, _) = app();
    let token = TokenCodec::new(SECRET)
        .encode(&pat(), std::time::Duration::from_secs(3600))
        .unwrap();

    let resp = send(&app, get(&format!("/job/SKY%20018?t={token}"))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/?job=SKY%20018");
    assert!(set_cookie(&resp).unwrap().starts_with("dot_session="));

    let resp = send(&app, get("/job/SKY018")).await;
    assert_eq!(location(&resp), "/?error=invalid");
}

#[tokio::test]
async fn logout_clears_cookie() {
    let (app, _) = app();
    let resp = send(&app, Request::post("/api/logout").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie(&resp).unwrap();
    assert!(cookie.starts_with("dot_session=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(json_body(resp).await["success"], true);
}

#[tokio::test]
async fn check_session_without_or_with_bad_cookie() {
    let (app, _) = app();
    let resp = send(&app, get("/api/check-session")).await;
    assert_eq!(json_body(resp).await, serde_json::json!({ "authenticated": false }));

    let resp = send(
        &app,
        Request::get("/api/check-session")
            .header(header::COOKIE, "theme=dark; dot_session=garbage")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(json_body(resp).await["authenticated"], false);
}

#[tokio::test]
async fn health_reports_service() {
    let (app, _) = app();
    let resp = send(&app, get("/api/health")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "dot-hub");
    let features = body["features"].as_array().unwrap();
    assert!(features.iter().any(|f| f == "magic-link-auth"));
    assert!(!features.iter().any(|f| f == "intent"));
}
