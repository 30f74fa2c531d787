//! Hosted LLM adapters used by the intent classifier.

pub mod anthropic;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use anthropic::AnthropicProvider;
pub use traits::{ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmProvider, Usage};
pub use util::resolve_secret;
