use serde::{Deserialize, Serialize};

use super::SecretRef;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// People directory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub backend: DirectoryBackend,
    #[serde(default)]
    pub airtable: AirtableConfig,
    /// People known to the `static` backend.
    #[serde(default)]
    pub people: Vec<PersonConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryBackend {
    /// Airtable `People` table over the REST API.
    #[default]
    Airtable,
    /// The `[[directory.people]]` entries from this file.
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableConfig {
    #[serde(default = "d_airtable_url")]
    pub base_url: String,
    #[serde(default)]
    pub base_id: String,
    #[serde(default = "d_people")]
    pub table: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
    #[serde(default = "d_api_key")]
    pub api_key: SecretRef,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            base_url: d_airtable_url(),
            base_id: String::new(),
            table: d_people(),
            timeout_ms: 10_000,
            api_key: d_api_key(),
        }
    }
}

/// A single person for the `static` directory backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonConfig {
    pub email: String,
    pub first_name: String,
    pub client_code: String,
    /// `"Client WIP"` (default) or `"Full"`.
    #[serde(default = "d_access")]
    pub access: String,
}

fn d_airtable_url() -> String {
    "https://api.airtable.com/v0".into()
}
fn d_people() -> String {
    "People".into()
}
fn d_10000() -> u64 {
    10_000
}
fn d_api_key() -> SecretRef {
    SecretRef::from_env("AIRTABLE_API_KEY")
}
fn d_access() -> String {
    "Client WIP".into()
}
