use serde::Serialize;

/// Structured trace events emitted across all hub crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LoginRequested {
        email: String,
        found: bool,
    },
    LoginLinkSent {
        email: String,
        duration_ms: u64,
    },
    SessionIssued {
        email: String,
        access_level: String,
        /// `magic_link`, `deep_link` or `bypass`.
        via: String,
    },
    TokenRejected {
        route: String,
        reason: String,
    },
    ConversationCreated {
        session_id: String,
    },
    ConversationsSwept {
        removed: usize,
        remaining: usize,
    },
    ConversationCleared {
        session_id: String,
        existed: bool,
    },
    IntentClassified {
        session_id: String,
        core_request: String,
        understood: bool,
        duration_ms: u64,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "hub_event");
    }
}
