use std::sync::Arc;

use hub_conversations::ConversationStore;
use hub_domain::config::Config;
use hub_tokens::SessionCookieManager;

use crate::intent::IntentOrchestrator;
use crate::login::MagicLinkFlow;

/// Shared application state passed to all API handlers.
///
/// Nothing in here is per-user: sessions live in signed cookies and the
/// only mutable state is the conversation store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    // ── Identity & sessions ───────────────────────────────────────────
    pub cookies: Arc<SessionCookieManager>,
    pub login: Arc<MagicLinkFlow>,

    // ── Ask Dot ───────────────────────────────────────────────────────
    pub conversations: Arc<ConversationStore>,
    /// `None` when no classifier API key could be resolved.
    pub intent: Option<Arc<IntentOrchestrator>>,
}
