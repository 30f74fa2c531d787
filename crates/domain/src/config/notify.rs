use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outbound e-mail
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Magic-link delivery.  Mail is handed to an HTTP webhook as
/// `{ "to", "subject", "body" }`.  With no webhook configured the link is
/// only logged, which is enough for local development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook URL.  Takes precedence over `webhook_url_env`.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "d_webhook_env")]
    pub webhook_url_env: String,
    #[serde(default = "d_subject")]
    pub subject: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_url_env: d_webhook_env(),
            subject: d_subject(),
            timeout_ms: 10_000,
        }
    }
}

impl NotifyConfig {
    /// The configured webhook, if any (explicit value first, then env).
    pub fn resolve_webhook_url(&self) -> Option<String> {
        self.webhook_url
            .clone()
            .or_else(|| std::env::var(&self.webhook_url_env).ok())
            .filter(|url| !url.trim().is_empty())
    }
}

fn d_webhook_env() -> String {
    "PA_POSTMAN_URL".into()
}
fn d_subject() -> String {
    "Log in. Ask Dot...".into()
}
fn d_10000() -> u64 {
    10_000
}
