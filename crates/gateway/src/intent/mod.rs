//! Natural-language intent classification for the "Ask Dot" box.
//!
//! A question plus the caller's recent conversation goes to a hosted LLM,
//! which answers with a small JSON object describing what the user wants.

mod orchestrator;
pub mod parse;
pub mod prompt;

pub use orchestrator::IntentOrchestrator;

use serde::{Deserialize, Serialize};

/// Used when the model says it did not understand but gives no message.
pub const DEFAULT_FALLBACK: &str = "That's outside my wheelhouse. I just do Hunch stuff!";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intent schema
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoreRequest {
    Find,
    Due,
    Update,
    Tracker,
    Help,
    Unknown,
}

impl CoreRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Find => "FIND",
            Self::Due => "DUE",
            Self::Update => "UPDATE",
            Self::Tracker => "TRACKER",
            Self::Help => "HELP",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Incoming,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
    Archived,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "Incoming",
            Self::InProgress => "In Progress",
            Self::OnHold => "On Hold",
            Self::Completed => "Completed",
            Self::Archived => "Archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Tomorrow,
    Week,
    Next,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifiers {
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub with_client: Option<bool>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

/// Models answer `null` for "nothing here" as often as they omit the key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured reading of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub core_request: CoreRequest,
    #[serde(default, deserialize_with = "null_as_default")]
    pub modifiers: Modifiers,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_terms: Vec<String>,
    pub understood: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_prompt: Option<String>,
}

impl Intent {
    /// `fallbackMessage` only travels with `understood: false`, and always
    /// does.
    pub fn normalize(mut self) -> Self {
        if self.understood {
            self.fallback_message = None;
        } else if self
            .fallback_message
            .as_deref()
            .map_or(true, |m| m.trim().is_empty())
        {
            self.fallback_message = Some(DEFAULT_FALLBACK.to_string());
        }
        self
    }

    /// One-line assistant turn stored in the conversation, e.g.
    /// `FIND client=SKY status=In Progress terms=logo`.
    pub fn summary(&self) -> String {
        if !self.understood {
            return self
                .fallback_message
                .clone()
                .unwrap_or_else(|| DEFAULT_FALLBACK.to_string());
        }

        let mut out = self.core_request.as_str().to_string();
        if let Some(client) = &self.modifiers.client {
            out.push_str(&format!(" client={client}"));
        }
        if let Some(status) = self.modifiers.status {
            out.push_str(&format!(" status={}", status.as_str()));
        }
        if let Some(with_client) = self.modifiers.with_client {
            out.push_str(&format!(" withClient={with_client}"));
        }
        if let Some(range) = self.modifiers.date_range {
            let range = match range {
                DateRange::Today => "today",
                DateRange::Tomorrow => "tomorrow",
                DateRange::Week => "week",
                DateRange::Next => "next",
            };
            out.push_str(&format!(" dateRange={range}"));
        }
        if !self.search_terms.is_empty() {
            out.push_str(&format!(" terms={}", self.search_terms.join(",")));
        }
        out
    }
}

/// A client the user can ask about, as listed by the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("classifier reply is not a valid intent: {0}")]
    UnparsableResponse(String),
    #[error("classifier request failed: {0}")]
    UpstreamFailure(String),
}
