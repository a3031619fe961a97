//! Vendor integrations.
//!
//! Each vendor pairs a CLI invocation with an adapter from its output
//! protocol to [`AgentEvent`](crate::AgentEvent)s. Vendor message types stay
//! private to their module.
pub mod claude;
mod cli;
pub mod codex;

pub use cli::{CliConfig, CliVendor};
