use std::path::PathBuf;

use crate::context::ContextItem;
use crate::errors::ProviderError;
use crate::event::EventStream;

/// Configuration for a one-shot session: a single turn with a fixed prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub prompt: String,
    /// Model id or alias; `None` uses the vendor default.
    pub model: Option<String>,
    pub context: Vec<ContextItem>,
    /// Directory the vendor runs in; overrides the provider's configured one.
    pub working_dir: Option<PathBuf>,
}

impl SessionConfig {
    /// Creates a config for the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Sets the model id or alias.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Replaces the context items.
    pub fn context(mut self, context: Vec<ContextItem>) -> Self {
        self.context = context;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Configuration for a multi-turn session.
///
/// There is no prompt here; messages arrive through
/// [`InteractiveSession::send`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractiveSessionConfig {
    pub model: Option<String>,
    /// Prepended to the first message only.
    pub context: Vec<ContextItem>,
    pub working_dir: Option<PathBuf>,
}

impl InteractiveSessionConfig {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn context(mut self, context: Vec<ContextItem>) -> Self {
        self.context = context;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Stateful conversation held by a provider, driven one turn at a time.
///
/// Call [`send`](Self::send), then drain [`stream`](Self::stream) before the
/// next `send`. The stream borrows the session mutably, so two turns can never
/// be in flight at once.
#[async_trait::async_trait]
pub trait InteractiveSession: Send {
    /// Queues the next message. Fails if a turn is already queued or running.
    fn send(&mut self, message: &str) -> Result<(), ProviderError>;

    /// Runs the queued turn and yields its events, ending after the `Result`.
    ///
    /// With nothing queued the stream is empty and the session is unchanged.
    fn stream(&mut self) -> EventStream<'_>;

    /// Releases vendor resources. Safe to call in any state, repeatedly.
    async fn close(&mut self);
}
