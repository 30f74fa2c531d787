//! Classifier prompt construction.

use hub_conversations::{ConversationContext, ConversationSnapshot, TurnRole};
use hub_providers::{ChatMessage, ChatRequest};

use super::ClientRef;

pub const SYSTEM_PROMPT: &str = r#"You are Dot, the assistant inside Hunch's job hub. Read the user's question and reply with ONE JSON object and nothing else.

Schema:
{
  "coreRequest": "FIND" | "DUE" | "UPDATE" | "TRACKER" | "HELP" | "UNKNOWN",
  "modifiers": {
    "client": string | null,
    "status": "Incoming" | "In Progress" | "On Hold" | "Completed" | "Archived" | null,
    "withClient": boolean | null,
    "dateRange": "today" | "tomorrow" | "week" | "next" | null
  },
  "searchTerms": [string],
  "understood": boolean,
  "fallbackMessage": string
}

Rules:
- FIND: look up jobs. DUE: what is due and when. UPDATE: change a job. TRACKER: spend and budget. HELP: how to use the hub.
- "client" must be one of the client codes listed below, or null.
- Pronouns such as "them" or "their" refer to the last discussed client.
- "searchTerms" holds job numbers or topic words, never the client code.
- Only include "fallbackMessage" when "understood" is false; keep it short and friendly.
- Anything unrelated to jobs at Hunch is UNKNOWN with "understood": false."#;

/// Human-readable summary of carried-over context, empty when none.
pub fn context_summary(context: &ConversationContext) -> String {
    let mut lines = Vec::new();
    if let Some(client) = context.last_client() {
        lines.push(format!("Last discussed client: {client}."));
    }
    if let Some(job) = context.last_job() {
        lines.push(format!("Last discussed job: {job}."));
    }
    lines.join("\n")
}

fn client_list(clients: &[ClientRef]) -> String {
    if clients.is_empty() {
        return "(none supplied)".to_string();
    }
    clients
        .iter()
        .map(|c| {
            if c.name.is_empty() {
                format!("- {}", c.code)
            } else {
                format!("- {}: {}", c.code, c.name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt + the last `window` turns + the new question.
///
/// The Messages API wants the first message to come from the user, so a
/// window that starts on an assistant turn is shifted by one.
pub fn build_request(
    snapshot: &ConversationSnapshot,
    question: &str,
    clients: &[ClientRef],
    window: usize,
) -> ChatRequest {
    let mut system = format!(
        "{SYSTEM_PROMPT}\n\nClients:\n{}",
        client_list(clients)
    );
    let summary = context_summary(&snapshot.context);
    if !summary.is_empty() {
        system.push_str("\n\nContext:\n");
        system.push_str(&summary);
    }

    let mut recent = snapshot.recent_turns(window);
    if recent.first().is_some_and(|t| t.role == TurnRole::Assistant) {
        recent = &recent[1..];
    }

    let mut messages: Vec<ChatMessage> = recent
        .iter()
        .map(|t| match t.role {
            TurnRole::User => ChatMessage::user(t.text.clone()),
            TurnRole::Assistant => ChatMessage::assistant(t.text.clone()),
        })
        .collect();
    messages.push(ChatMessage::user(question));

    ChatRequest {
        system: Some(system),
        messages,
        ..Default::default()
    }
}
