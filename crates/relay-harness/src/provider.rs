use crate::errors::ProviderError;
use crate::event::EventStream;
use crate::model::ProviderId;
use crate::session::{InteractiveSession, InteractiveSessionConfig, SessionConfig};

/// Capability set every back-end implements. Callers never see vendor types.
pub trait Provider: Send + Sync {
    /// Registry name (for example `claude`).
    fn id(&self) -> ProviderId;

    /// Whether the vendor binary is present. Never fails.
    fn is_available(&self) -> bool;

    /// Maps an alias to a full model id; `None` means the vendor default.
    fn resolve_model(&self, alias: Option<&str>) -> Option<String>;

    /// Alias names accepted by [`resolve_model`](Self::resolve_model).
    fn known_aliases(&self) -> Vec<&'static str>;

    /// Starts a one-shot session. The stream is lazy: nothing is launched
    /// until it is first polled, and launch failures arrive as its first item.
    fn create_session(&self, config: SessionConfig) -> EventStream<'static>;

    /// Starts a multi-turn session bound to one vendor conversation.
    fn create_interactive_session(
        &self,
        config: InteractiveSessionConfig,
    ) -> Result<Box<dyn InteractiveSession>, ProviderError>;
}
