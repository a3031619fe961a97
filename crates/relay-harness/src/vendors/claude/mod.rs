//! Claude agent CLI integration (`claude -p --output-format stream-json`).
mod adapter;
mod config;
mod messages;
mod provider;

pub use config::{ClaudeCli, ClaudeConfig};
pub use provider::{CLAUDE_MODELS, CLAUDE_PROVIDER, ClaudeProvider};
