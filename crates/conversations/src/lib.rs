//! In-memory conversation state for the intent endpoint.
//!
//! Conversations are keyed by an opaque session id supplied by the caller,
//! keep a sliding window of recent turns plus a small context map, and are
//! swept once idle.  Nothing survives a restart.

pub mod context;
pub mod store;

pub use context::ConversationContext;
pub use store::{ConversationSnapshot, ConversationStore, Turn, TurnRole};
