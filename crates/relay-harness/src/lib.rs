//! Provider abstraction layer for driving AI coding-agent CLIs from a
//! terminal.
//!
//! Every back-end emits the same [`AgentEvent`] vocabulary; the [`Renderer`]
//! turns those events into terminal output and the [`Repl`] drives
//! multi-turn conversations. Vendor-specific APIs are namespaced under
//! `vendors::*`.
//!
//! # One-shot usage
//!
//! ```no_run
//! use futures::StreamExt as _;
//! use relay_harness::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), HarnessError> {
//! let registry = ProviderRegistry::from_env()?;
//! let provider = registry.get("claude")?;
//!
//! let renderer = Renderer::new(true);
//! let mut state = RenderState::new();
//! let mut sinks = Sinks::stdio();
//! let mut events = provider.create_session(SessionConfig::new("Summarise README.md").model("sonnet"));
//! while let Some(event) = events.next().await {
//!     renderer.render(&event?, &mut state, &mut sinks);
//! }
//! # Ok(())
//! # }
//! ```

/// File-backed context blocks and prompt construction.
pub mod context;
/// Public error types.
pub mod errors;
/// Provider-neutral event contract.
pub mod event;
/// Vendor process boundary.
pub mod launcher;
/// Provider ids and model alias tables.
pub mod model;
/// Process-wide logging setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// The capability set every back-end implements.
pub mod provider;
/// Secret masking for displayed shell commands.
pub mod redact;
/// Name-based provider lookup.
pub mod registry;
/// Terminal rendering of events.
pub mod render;
/// Interactive turn-taking loop.
pub mod repl;
/// Session configuration and the interactive session contract.
pub mod session;
/// Turn protocol shared by every provider.
pub mod turn;
/// Vendor-specific integrations.
pub mod vendors;

pub use context::{ContextItem, build_prompt};
pub use errors::{HarnessError, ProviderError};
pub use event::{AgentEvent, EventStream, TurnSummary};
pub use launcher::{Invocation, Launcher, LineStream, ProcessLauncher};
pub use model::{ModelAliases, ProviderId};
pub use observability::init_observability;
pub use provider::Provider;
pub use redact::redact_secrets;
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
pub use render::{RenderState, Renderer, Sinks, format_summary};
pub use repl::{InterruptHandle, InterruptSignal, Repl, ReplExit, interrupt_channel};
pub use session::{InteractiveSession, InteractiveSessionConfig, SessionConfig};
pub use turn::{TurnAdapter, TurnDriver, TurnSession, TurnState};
