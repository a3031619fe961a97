//! Codex CLI integration (`codex exec --json`).
mod adapter;
mod config;
mod messages;
mod provider;

pub use config::{CodexCli, CodexConfig};
pub use provider::{CODEX_MODELS, CODEX_PROVIDER, CodexProvider};
