use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;

use hub_conversations::context::{LAST_CLIENT, LAST_JOB};
use hub_conversations::{ConversationContext, ConversationStore};
use hub_domain::trace::TraceEvent;
use hub_providers::LlmProvider;

use super::{parse, prompt, ClassifyError, ClientRef, Intent};

/// `SKY 018`, `TOW001`: two to five letters, optional space, three digits.
static JOB_NUMBER_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2,5} ?\d{3}$").expect("job number term pattern compiles")
});

/// Ties the conversation store to the classifier.
///
/// The store lock is only held inside the store's own calls; the LLM
/// round-trip happens between a snapshot read and a single write.
pub struct IntentOrchestrator {
    provider: Arc<dyn LlmProvider>,
    store: Arc<ConversationStore>,
    prompt_window: usize,
    max_tokens: Option<u32>,
}

impl IntentOrchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<ConversationStore>,
        prompt_window: usize,
    ) -> Self {
        Self {
            provider,
            store,
            prompt_window,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub async fn classify(
        &self,
        session_id: &str,
        question: &str,
        clients: &[ClientRef],
    ) -> Result<Intent, ClassifyError> {
        let started = Instant::now();
        let snapshot = self.store.get_or_create(session_id);

        let mut request = prompt::build_request(&snapshot, question, clients, self.prompt_window);
        request.max_tokens = self.max_tokens;

        let response = self.provider.chat(request).await.map_err(|e| {
            tracing::error!(
                provider = self.provider.provider_id(),
                error = %e,
                "classifier call failed"
            );
            ClassifyError::UpstreamFailure(e.to_string())
        })?;

        let intent = parse::parse_intent(&response.content).inspect_err(|e| {
            tracing::warn!(session_id, error = %e, "classifier reply did not parse");
        })?;

        self.store.record_exchange(
            session_id,
            question,
            intent.summary(),
            carried_context(&intent),
        );

        TraceEvent::IntentClassified {
            session_id: session_id.to_owned(),
            core_request: intent.core_request.as_str().to_owned(),
            understood: intent.understood,
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        Ok(intent)
    }
}

/// Context to merge after a successful classification.
fn carried_context(intent: &Intent) -> ConversationContext {
    let mut ctx = ConversationContext::new();
    if let Some(client) = intent.modifiers.client.as_deref().filter(|c| !c.is_empty()) {
        ctx.set(LAST_CLIENT, client);
    }
    if let Some(job) = intent
        .search_terms
        .iter()
        .map(|t| t.trim().to_uppercase())
        .find(|t| JOB_NUMBER_TERM.is_match(t))
    {
        ctx.set(LAST_JOB, job);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use hub_domain::error::{Error, Result};
    use hub_providers::{ChatRequest, ChatResponse};
    use parking_lot::Mutex;

    /// Replies with canned text and remembers every request.
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
            self.seen.lock().push(req);
            let content = self.replies.lock().remove(0)?;
            Ok(ChatResponse {
                content,
                usage: None,
                model: "scripted".into(),
                finish_reason: Some("end_turn".into()),
            })
        }

        fn provider_id(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted"
        }
    }

    fn orchestrator(provider: Arc<ScriptedProvider>) -> IntentOrchestrator {
        let store = Arc::new(ConversationStore::new(Duration::from_secs(1800), 20));
        IntentOrchestrator::new(provider, store, 10)
    }

    const SKY_FIND: &str = r#"{"coreRequest":"FIND","modifiers":{"client":"SKY"},"searchTerms":["sky 018"],"understood":true}"#;

    #[tokio::test]
    async fn success_records_exchange_and_context() {
        let provider = ScriptedProvider::new(vec![Ok(SKY_FIND.into())]);
        let orch = orchestrator(provider.clone());

        let intent = orch.classify("pat", "show me sky 018", &[]).await.unwrap();
        assert!(intent.understood);

        let snap = orch.store().get_or_create("pat");
        assert_eq!(snap.turns.len(), 2);
        assert_eq!(snap.turns[0].text, "show me sky 018");
        assert_eq!(snap.turns[1].text, "FIND client=SKY terms=sky 018");
        assert_eq!(snap.context.last_client(), Some("SKY"));
        assert_eq!(snap.context.last_job(), Some("SKY 018"));
    }

    #[tokio::test]
    async fn follow_up_carries_client_hint() {
        let provider = ScriptedProvider::new(vec![
            Ok(SKY_FIND.into()),
            Ok(r#"{"coreRequest":"DUE","understood":true}"#.into()),
        ]);
        let orch = orchestrator(provider.clone());
        orch.classify("pat", "sky jobs", &[]).await.unwrap();
        orch.classify("pat", "what's due for them?", &[]).await.unwrap();

        let seen = provider.seen.lock();
        let system = seen[1].system.as_deref().unwrap();
        assert!(system.contains("Last discussed client: SKY."));
        assert_eq!(seen[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn unparsable_reply_leaves_store_untouched() {
        let provider = ScriptedProvider::new(vec![Ok("no idea, sorry".into())]);
        let orch = orchestrator(provider);
        let err = orch.classify("pat", "hello?", &[]).await.unwrap_err();
        assert!(matches!(err, ClassifyError::UnparsableResponse(_)));

        let snap = orch.store().get_or_create("pat");
        assert!(snap.turns.is_empty());
        assert!(snap.context.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_upstream() {
        let provider = ScriptedProvider::new(vec![Err(Error::Timeout("30s".into()))]);
        let orch = orchestrator(provider);
        let err = orch.classify("pat", "hello?", &[]).await.unwrap_err();
        assert!(matches!(err, ClassifyError::UpstreamFailure(_)));
        assert!(orch.store().get_or_create("pat").turns.is_empty());
    }

    #[test]
    fn carried_context_ignores_non_job_terms() {
        let intent: Intent = serde_json::from_str(
            r#"{"coreRequest":"FIND","searchTerms":["logo","banner 2024"],"understood":true}"#,
        )
        .unwrap();
        assert!(carried_context(&intent).is_empty());
    }
}
