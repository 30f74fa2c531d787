use serde::{Deserialize, Serialize};

use super::SecretRef;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intent classifier (hosted LLM)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection settings for the Anthropic Messages API used to classify
/// questions.  When the API key cannot be resolved the gateway still
/// boots; `/claude/parse` answers with an error until it is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_1024")]
    pub max_tokens: u32,
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
    #[serde(default = "d_api_key")]
    pub api_key: SecretRef,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            model: d_model(),
            max_tokens: 1024,
            timeout_ms: 30_000,
            api_key: d_api_key(),
        }
    }
}

fn d_base_url() -> String {
    "https://api.anthropic.com".into()
}
fn d_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn d_1024() -> u32 {
    1024
}
fn d_30000() -> u64 {
    30_000
}
fn d_api_key() -> SecretRef {
    SecretRef::from_env("ANTHROPIC_API_KEY")
}
