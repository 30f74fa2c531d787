//! Conversation store.
//!
//! One coarse mutex guards the whole map.  Every operation first sweeps
//! conversations idle past the timeout, then performs its lookup or write,
//! all inside the same critical section, so a sweep can never race a
//! creation.  Callers must not hold a snapshot across I/O and expect it to
//! stay current; take a fresh one afterwards.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use hub_domain::config::ConversationsConfig;
use hub_domain::trace::TraceEvent;

use crate::context::ConversationContext;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Snapshot
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A copy of one conversation, detached from the store's lock.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub session_id: String,
    pub turns: Vec<Turn>,
    pub context: ConversationContext,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// True when this access created the conversation.
    pub is_new: bool,
}

impl ConversationSnapshot {
    /// The last `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
struct Conversation {
    turns: VecDeque<Turn>,
    context: ConversationContext,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
}

impl Conversation {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            turns: VecDeque::new(),
            context: ConversationContext::new(),
            created_at: now,
            last_active_at: now,
        }
    }

    fn push(&mut self, turn: Turn, max_turns: usize) {
        self.turns.push_back(turn);
        while self.turns.len() > max_turns {
            self.turns.pop_front();
        }
    }

    fn snapshot(&self, session_id: &str, is_new: bool) -> ConversationSnapshot {
        ConversationSnapshot {
            session_id: session_id.to_owned(),
            turns: self.turns.iter().cloned().collect(),
            context: self.context.clone(),
            created_at: self.created_at,
            last_active_at: self.last_active_at,
            is_new,
        }
    }
}

/// Process-wide conversation store, shared through `Arc`.
pub struct ConversationStore {
    idle_timeout: chrono::Duration,
    max_turns: usize,
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl ConversationStore {
    pub fn new(idle_timeout: Duration, max_turns: usize) -> Self {
        Self {
            idle_timeout: chrono::Duration::from_std(idle_timeout)
                .unwrap_or(chrono::Duration::MAX),
            max_turns: max_turns.max(1),
            conversations: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ConversationsConfig) -> Self {
        Self::new(config.idle_timeout(), config.max_turns)
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    // ── read ────────────────────────────────────────────────────────

    /// Fetch the conversation for `session_id`, creating it if missing or
    /// expired.  Counts as activity.
    pub fn get_or_create(&self, session_id: &str) -> ConversationSnapshot {
        self.get_or_create_at(session_id, Utc::now())
    }

    pub fn get_or_create_at(&self, session_id: &str, now: DateTime<Utc>) -> ConversationSnapshot {
        self.with_conversation(session_id, now, |conv, is_new| {
            conv.snapshot(session_id, is_new)
        })
    }

    /// Number of live conversations (after sweeping).
    pub fn len(&self) -> usize {
        self.len_at(Utc::now())
    }

    pub fn len_at(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.conversations.lock();
        self.sweep_locked(&mut map, now);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── write ───────────────────────────────────────────────────────

    /// Append one turn, dropping the oldest beyond `max_turns`.
    pub fn append_turn(&self, session_id: &str, role: TurnRole, text: impl Into<String>) {
        self.append_turn_at(session_id, role, text, Utc::now());
    }

    pub fn append_turn_at(
        &self,
        session_id: &str,
        role: TurnRole,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        let text = text.into();
        let max = self.max_turns;
        self.with_conversation(session_id, now, |conv, _| {
            conv.push(Turn { role, text }, max);
        });
    }

    /// Shallow key-wise overwrite of the conversation context.
    pub fn merge_context(&self, session_id: &str, partial: ConversationContext) {
        self.merge_context_at(session_id, partial, Utc::now());
    }

    pub fn merge_context_at(
        &self,
        session_id: &str,
        partial: ConversationContext,
        now: DateTime<Utc>,
    ) {
        self.with_conversation(session_id, now, |conv, _| {
            conv.context.merge(partial);
        });
    }

    /// Append a user turn, an assistant turn and merge context in one
    /// critical section.
    pub fn record_exchange(
        &self,
        session_id: &str,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        context: ConversationContext,
    ) {
        self.record_exchange_at(session_id, user_text, assistant_text, context, Utc::now());
    }

    pub fn record_exchange_at(
        &self,
        session_id: &str,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        context: ConversationContext,
        now: DateTime<Utc>,
    ) {
        let user = Turn::user(user_text);
        let assistant = Turn::assistant(assistant_text);
        let max = self.max_turns;
        self.with_conversation(session_id, now, |conv, _| {
            conv.push(user, max);
            conv.push(assistant, max);
            conv.context.merge(context);
        });
    }

    /// Remove a conversation.  Returns whether one existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.clear_at(session_id, Utc::now())
    }

    pub fn clear_at(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        let existed = {
            let mut map = self.conversations.lock();
            self.sweep_locked(&mut map, now);
            map.remove(session_id).is_some()
        };

        TraceEvent::ConversationCleared {
            session_id: session_id.to_owned(),
            existed,
        }
        .emit();

        existed
    }

    // ── internals ───────────────────────────────────────────────────

    /// Sweep, then run `f` on the (possibly new) conversation and mark it
    /// active.  `ConversationCreated` is emitted after the lock is released.
    fn with_conversation<R>(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Conversation, bool) -> R,
    ) -> R {
        let (result, is_new) = {
            let mut map = self.conversations.lock();
            self.sweep_locked(&mut map, now);

            let is_new = !map.contains_key(session_id);
            let conv = map
                .entry(session_id.to_owned())
                .or_insert_with(|| Conversation::new(now));
            conv.last_active_at = now;
            (f(conv, is_new), is_new)
        };

        if is_new {
            TraceEvent::ConversationCreated {
                session_id: session_id.to_owned(),
            }
            .emit();
        }

        result
    }

    fn sweep_locked(&self, map: &mut HashMap<String, Conversation>, now: DateTime<Utc>) {
        let before = map.len();
        let timeout = self.idle_timeout;
        map.retain(|_, conv| now.signed_duration_since(conv.last_active_at) <= timeout);
        let removed = before - map.len();
        if removed > 0 {
            TraceEvent::ConversationsSwept {
                removed,
                remaining: map.len(),
            }
            .emit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LAST_CLIENT, LAST_JOB};
    use std::sync::Arc;

    fn store() -> ConversationStore {
        ConversationStore::new(Duration::from_secs(30 * 60), 20)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn first_access_creates_empty_conversation() {
        let s = store();
        let snap = s.get_or_create_at("a", t0());
        assert!(snap.is_new);
        assert!(snap.turns.is_empty());
        assert!(snap.context.is_empty());
        assert_eq!(snap.created_at, t0());

        let again = s.get_or_create_at("a", t0());
        assert!(!again.is_new);
        assert_eq!(s.len_at(t0()), 1);
    }

    #[test]
    fn keeps_only_the_most_recent_turns() {
        let s = store();
        for i in 0..25 {
            s.append_turn_at("a", TurnRole::User, format!("turn {i}"), t0());
        }
        let snap = s.get_or_create_at("a", t0());
        assert_eq!(snap.turns.len(), 20);
        assert_eq!(snap.turns[0].text, "turn 5");
        assert_eq!(snap.turns[19].text, "turn 24");
    }

    #[test]
    fn recent_turns_returns_tail() {
        let s = store();
        for i in 0..6 {
            s.append_turn_at("a", TurnRole::User, format!("{i}"), t0());
        }
        let snap = s.get_or_create_at("a", t0());
        let tail: Vec<&str> = snap.recent_turns(3).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(tail, ["3", "4", "5"]);
        assert_eq!(snap.recent_turns(100).len(), 6);
    }

    #[test]
    fn idle_conversation_is_swept_on_next_access() {
        let s = store();
        s.append_turn_at("a", TurnRole::User, "hello", t0());
        s.merge_context_at("a", ConversationContext::new().with(LAST_CLIENT, "SKY"), t0());

        let later = t0() + chrono::Duration::minutes(31);
        assert_eq!(s.len_at(later), 0);

        let snap = s.get_or_create_at("a", later);
        assert!(snap.is_new);
        assert!(snap.turns.is_empty());
        assert_eq!(snap.context.last_client(), None);
    }

    #[test]
    fn activity_keeps_conversation_alive() {
        let s = store();
        s.append_turn_at("a", TurnRole::User, "one", t0());
        let t1 = t0() + chrono::Duration::minutes(20);
        s.append_turn_at("a", TurnRole::User, "two", t1);
        let t2 = t1 + chrono::Duration::minutes(20);
        let snap = s.get_or_create_at("a", t2);
        assert!(!snap.is_new);
        assert_eq!(snap.turns.len(), 2);
    }

    #[test]
    fn sweep_only_removes_idle_conversations() {
        let s = store();
        s.get_or_create_at("old", t0());
        let t1 = t0() + chrono::Duration::minutes(25);
        s.get_or_create_at("fresh", t1);
        let t2 = t0() + chrono::Duration::minutes(35);
        assert_eq!(s.len_at(t2), 1);
        assert!(!s.get_or_create_at("fresh", t2).is_new);
    }

    #[test]
    fn merge_context_overwrites_shallowly() {
        let s = store();
        s.merge_context_at(
            "a",
            ConversationContext::new()
                .with(LAST_CLIENT, "SKY")
                .with(LAST_JOB, "SKY 017"),
            t0(),
        );
        s.merge_context_at("a", ConversationContext::new().with(LAST_CLIENT, "TOW"), t0());
        let snap = s.get_or_create_at("a", t0());
        assert_eq!(snap.context.last_client(), Some("TOW"));
        assert_eq!(snap.context.last_job(), Some("SKY 017"));
    }

    #[test]
    fn record_exchange_appends_both_turns_and_context() {
        let s = store();
        s.record_exchange_at(
            "a",
            "what's due for sky?",
            "DUE client=SKY",
            ConversationContext::new().with(LAST_CLIENT, "SKY"),
            t0(),
        );
        let snap = s.get_or_create_at("a", t0());
        assert_eq!(snap.turns, vec![Turn::user("what's due for sky?"), Turn::assistant("DUE client=SKY")]);
        assert_eq!(snap.context.last_client(), Some("SKY"));
    }

    #[test]
    fn clear_reports_existence() {
        let s = store();
        s.get_or_create_at("a", t0());
        assert!(s.clear_at("a", t0()));
        assert!(!s.clear_at("a", t0()));
        assert!(!s.clear_at("never", t0()));
        assert_eq!(s.len_at(t0()), 0);
    }

    #[test]
    fn sessions_are_isolated() {
        let s = store();
        s.append_turn_at("a", TurnRole::User, "for a", t0());
        let b = s.get_or_create_at("b", t0());
        assert!(b.turns.is_empty());
    }

    #[test]
    fn concurrent_appends_are_all_recorded() {
        let s = Arc::new(ConversationStore::new(Duration::from_secs(1800), 1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        s.append_turn("shared", TurnRole::User, format!("{t}-{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(s.get_or_create("shared").turns.len(), 400);
    }

    #[test]
    fn from_config_uses_limits() {
        let cfg = ConversationsConfig {
            idle_timeout_minutes: 5,
            max_turns: 3,
            prompt_window: 2,
        };
        let s = ConversationStore::from_config(&cfg);
        assert_eq!(s.max_turns(), 3);
        s.append_turn_at("a", TurnRole::User, "x", t0());
        assert_eq!(s.len_at(t0() + chrono::Duration::minutes(6)), 0);
    }
}
