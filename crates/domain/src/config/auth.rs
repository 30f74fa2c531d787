use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tokens & session cookie
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the token signing secret.
    /// If unset or empty, a random per-process secret is generated and
    /// every token is invalidated on restart.
    #[serde(default = "d_secret_env")]
    pub secret_env: String,
    /// Lifetime of magic-link tokens and session cookies.
    #[serde(default = "d_7")]
    pub token_ttl_days: u32,
    #[serde(default = "d_cookie_name")]
    pub cookie_name: String,
    /// Emit the `Secure` attribute.  Turn off only for plain-HTTP local
    /// development.
    #[serde(default = "d_true")]
    pub cookie_secure: bool,
    /// Operational escape hatch that mints a super-admin session from a
    /// PIN in the query string.  Absent (disabled) by default.
    #[serde(default)]
    pub bypass: Option<BypassConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_env: d_secret_env(),
            token_ttl_days: 7,
            cookie_name: d_cookie_name(),
            cookie_secure: true,
            bypass: None,
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.token_ttl_days) * 24 * 60 * 60)
    }
}

/// Identity minted by the bypass PIN.  The access level is always `Full`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BypassConfig {
    /// Environment variable holding the PIN.  The bypass stays disabled
    /// while it is unset or empty.
    #[serde(default = "d_pin_env")]
    pub pin_env: String,
    pub email: String,
    pub first_name: String,
    #[serde(default = "d_all")]
    pub client_code: String,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_secret_env() -> String {
    "HUB_TOKEN_SECRET".into()
}
fn d_7() -> u32 {
    7
}
fn d_cookie_name() -> String {
    "dot_session".into()
}
fn d_true() -> bool {
    true
}
fn d_pin_env() -> String {
    "HUB_BYPASS_PIN".into()
}
fn d_all() -> String {
    "ALL".into()
}
