use serde::{Deserialize, Serialize};

/// Where to find a credential (API key, webhook URL, ...).
///
/// Resolution order is `key`, then the OS keychain (`service` + `account`),
/// then the `env` variable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretRef {
    /// Env var containing the secret.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct value (for config-only setups; prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "dot-hub").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "anthropic-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

impl SecretRef {
    pub fn from_env(var: &str) -> Self {
        Self {
            env: Some(var.to_owned()),
            ..Self::default()
        }
    }

    /// `true` when no source at all is configured.
    pub fn is_unset(&self) -> bool {
        self.env.is_none()
            && self.key.is_none()
            && (self.service.is_none() || self.account.is_none())
    }
}
