//! `/claude/parse` and `/claude/clear` against a scripted classifier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use tower::ServiceExt;

use hub_domain::config::Config;
use hub_domain::error::{Error, Result};
use hub_domain::identity::{AccessLevel, Identity};
use hub_gateway::bootstrap::{self, Collaborators};
use hub_gateway::directory::StaticDirectory;
use hub_gateway::notify::LogNotifier;
use hub_gateway::state::AppState;
use hub_providers::{ChatRequest, ChatResponse, LlmProvider};
use hub_tokens::TokenCodec;

const SECRET: &[u8] = b"intent-api-test-secret";

/// Pops one canned reply per call and keeps every request it saw.
#[derive(Default)]
struct ScriptedClassifier {
    replies: Mutex<Vec<Result<String>>>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClassifier {
    fn with(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedClassifier {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        self.seen.lock().push(req);
        let content = self.replies.lock().remove(0)?;
        Ok(ChatResponse {
            content,
            usage: None,
            model: "scripted".into(),
            finish_reason: None,
        })
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }
}

fn state(classifier: Option<Arc<ScriptedClassifier>>) -> AppState {
    bootstrap::assemble(
        Arc::new(Config::default()),
        SECRET,
        Collaborators {
            directory: Arc::new(StaticDirectory::new(Vec::<Identity>::new())),
            notifier: Arc::new(LogNotifier),
            classifier: classifier.map(|c| c as Arc<dyn LlmProvider>),
        },
    )
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
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

const FENCED_SKY: &str = "```json\n{\"coreRequest\":\"FIND\",\"modifiers\":{\"client\":\"SKY\",\"status\":\"In Progress\"},\"searchTerms\":[\"logo\"],\"understood\":true}\n```";

#[tokio::test]
async fn parse_returns_intent_and_carries_client() {
    let classifier = ScriptedClassifier::with(vec![
        Ok(FENCED_SKY.into()),
        Ok(r#"{"coreRequest":"DUE","modifiers":{"client":"SKY","dateRange":"week"},"understood":true}"#.into()),
    ]);
    let app = hub_gateway::app(state(Some(classifier.clone())));

    let resp = send(
        &app,
        post_json(
            "/claude/parse",
            serde_json::json!({
                "question": "show me the sky logo jobs",
                "clients": [{ "code": "SKY", "name": "Sky" }],
                "sessionId": "Pat",
            }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["parsed"]["coreRequest"], "FIND");
    assert_eq!(body["parsed"]["modifiers"]["client"], "SKY");
    assert_eq!(body["parsed"]["modifiers"]["status"], "In Progress");
    assert_eq!(body["parsed"]["understood"], true);

    let resp = send(
        &app,
        post_json(
            "/claude/parse",
            serde_json::json!({ "question": "what's due for them this week?", "sessionId": "Pat" }),
        ),
    )
    .await;
    assert_eq!(json_body(resp).await["parsed"]["modifiers"]["dateRange"], "week");

    let seen = classifier.seen.lock();
    assert!(seen[1]
        .system
        .as_deref()
        .unwrap()
        .contains("Last discussed client: SKY."));
    assert_eq!(seen[1].messages.first().unwrap().content, "show me the sky logo jobs");
}

#[tokio::test]
async fn unparsable_reply_is_parsed_null() {
    let classifier = ScriptedClassifier::with(vec![Ok("hmm, not sure".into())]);
    let state = state(Some(classifier));
    let app = hub_gateway::app(state.clone());

    let resp = send(
        &app,
        post_json("/claude/parse", serde_json::json!({ "question": "hi", "sessionId": "s" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["parsed"].is_null());
    assert!(body["error"].is_string());
    assert!(state.conversations.get_or_create("s").turns.is_empty());
}

#[tokio::test]
async fn upstream_failure_is_500() {
    let classifier =
        ScriptedClassifier::with(vec![Err(Error::Timeout("classifier".into()))]);
    let app = hub_gateway::app(state(Some(classifier)));
    let resp = send(&app, post_json("/claude/parse", serde_json::json!({ "question": "hi" }))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn unconfigured_classifier_is_500() {
    let app = hub_gateway::app(state(None));
    let resp = send(&app, post_json("/claude/parse", serde_json::json!({ "question": "hi" }))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn empty_question_is_400() {
    let app = hub_gateway::app(state(Some(ScriptedClassifier::with(vec![]))));
    let resp = send(&app, post_json("/claude/parse", serde_json::json!({ "question": "  " }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_cookie_names_the_conversation() {
    let classifier = ScriptedClassifier::with(vec![Ok(FENCED_SKY.into())]);
    let state = state(Some(classifier));
    let app = hub_gateway::app(state.clone());

    let pat = Identity::new("pat@example.com", "SKY", "Pat", AccessLevel::Full);
    let token = TokenCodec::new(SECRET)
        .encode(&pat, Duration::from_secs(3600))
        .unwrap();

    let resp = send(
        &app,
        Request::post("/claude/parse")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, format!("dot_session={token}"))
            .body(Body::from(r#"{"question":"sky logo"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let snap = state.conversations.get_or_create("pat@example.com");
    assert_eq!(snap.turns.len(), 2);
    assert_eq!(snap.context.last_client(), Some("SKY"));
}

#[tokio::test]
async fn clear_reports_whether_conversation_existed() {
    let state = state(None);
    state.conversations.get_or_create("Pat");
    let app = hub_gateway::app(state.clone());

    let resp = send(&app, post_json("/claude/clear", serde_json::json!({ "sessionId": "Pat" }))).await;
    assert_eq!(
        json_body(resp).await,
        serde_json::json!({ "success": true, "cleared": true })
    );

    let resp = send(&app, post_json("/claude/clear", serde_json::json!({ "sessionId": "Pat" }))).await;
    assert_eq!(json_body(resp).await["cleared"], false);
}
