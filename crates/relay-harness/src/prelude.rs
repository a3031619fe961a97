//! Common imports for typical usage.
//!
//! Exports the types a front-end needs to pick a provider, run sessions and
//! render their events.
pub use crate::{
    AgentEvent, ContextItem, HarnessError, InteractiveSession, InteractiveSessionConfig,
    InterruptHandle, Provider, ProviderError, ProviderId, ProviderRegistry, RenderState,
    Renderer, Repl, ReplExit, SessionConfig, Sinks, TurnSummary, interrupt_channel,
};
