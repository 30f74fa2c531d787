//! Outbound e-mail for login links.

mod webhook;

pub use webhook::WebhookNotifier;

use std::sync::Arc;

use async_trait::async_trait;

use hub_domain::config::NotifyConfig;
use hub_domain::error::Result;

/// One message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// The call-to-action URL inside `body`, kept separately so a notifier
    /// that cannot deliver can still log it.
    pub link: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, email: &OutboundEmail) -> Result<()>;
}

/// Development fallback when no webhook is configured: logs the link and
/// reports success.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        tracing::warn!(
            to = %email.to,
            link = %email.link,
            "no mail webhook configured; login link logged instead of sent"
        );
        Ok(())
    }
}

pub fn from_config(cfg: &NotifyConfig) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match cfg.resolve_webhook_url() {
        Some(url) => Arc::new(WebhookNotifier::new(url, cfg.timeout_ms)?),
        None => Arc::new(LogNotifier),
    };
    tracing::info!(notifier = notifier.name(), "login mail notifier ready");
    Ok(notifier)
}
