use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsConfig {
    /// Conversations idle longer than this are dropped on the next store
    /// access.
    #[serde(default = "d_30")]
    pub idle_timeout_minutes: u32,
    /// Maximum turns kept per conversation (oldest evicted first).
    #[serde(default = "d_20")]
    pub max_turns: usize,
    /// How many of the most recent turns are replayed to the classifier.
    #[serde(default = "d_10")]
    pub prompt_window: usize,
}

impl Default for ConversationsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 30,
            max_turns: 20,
            prompt_window: 10,
        }
    }
}

impl ConversationsConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.idle_timeout_minutes) * 60)
    }
}

fn d_30() -> u32 {
    30
}
fn d_20() -> usize {
    20
}
fn d_10() -> usize {
    10
}
