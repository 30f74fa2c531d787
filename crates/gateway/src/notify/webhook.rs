use std::time::Duration;

use async_trait::async_trait;

use hub_domain::error::{Error, Result};
use hub_providers::util::from_reqwest;

use super::{Notifier, OutboundEmail};

/// Hands mail to an HTTP relay as `{ "to", "subject", "body" }`.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "to": email.to,
                "subject": email.subject,
                "body": email.body,
            }))
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Notify(format!("mail webhook HTTP {}", status.as_u16())));
        }
        tracing::info!(to = %email.to, "login e-mail handed to webhook");
        Ok(())
    }
}
