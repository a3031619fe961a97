use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::errors::{HarnessError, ProviderError};
use crate::event::EventStream;
use crate::launcher::{Invocation, Launcher, LineStream, ProcessLauncher};
use crate::model::{ModelAliases, ProviderId};
use crate::provider::Provider;
use crate::session::{InteractiveSession, InteractiveSessionConfig, SessionConfig};
use crate::turn::{TurnDriver, TurnSession};

use super::adapter::ClaudeAdapter;
use super::config::ClaudeConfig;

/// Registry name of the Claude provider.
pub const CLAUDE_PROVIDER: &str = "claude";

/// Short model names accepted by the Claude provider.
pub const CLAUDE_MODELS: ModelAliases = ModelAliases::new(&[
    ("opus", "claude-opus-4-1"),
    ("sonnet", "claude-sonnet-4-5"),
    ("haiku", "claude-haiku-4-5"),
]);

/// Provider backed by the Claude agent CLI in `stream-json` mode.
#[derive(Clone)]
pub struct ClaudeProvider {
    config: ClaudeConfig,
    launcher: Arc<dyn Launcher>,
}

impl ClaudeProvider {
    pub fn new(config: ClaudeConfig) -> Self {
        Self {
            config,
            launcher: Arc::new(ProcessLauncher),
        }
    }

    /// Creates a provider configured from `RELAY_CLAUDE_BIN`,
    /// `RELAY_CLAUDE_ARGS` and `RELAY_CLAUDE_WORKDIR`.
    pub fn from_env() -> Result<Self, HarnessError> {
        Ok(Self::new(ClaudeConfig::from_env()?))
    }

    /// Replaces the process launcher (tests use a scripted one).
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    fn driver(
        &self,
        model: Option<&str>,
        working_dir: Option<PathBuf>,
        conversation: Option<Conversation>,
    ) -> ClaudeDriver {
        let mut config = self.config.clone();
        if working_dir.is_some() {
            config.working_dir = working_dir;
        }
        ClaudeDriver {
            config,
            launcher: self.launcher.clone(),
            model: self.resolve_model(model),
            conversation,
        }
    }
}

impl Provider for ClaudeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new(CLAUDE_PROVIDER)
    }

    fn is_available(&self) -> bool {
        which::which(&self.config.binary).is_ok()
    }

    fn resolve_model(&self, alias: Option<&str>) -> Option<String> {
        CLAUDE_MODELS.resolve(alias)
    }

    fn known_aliases(&self) -> Vec<&'static str> {
        CLAUDE_MODELS.names()
    }

    fn create_session(&self, config: SessionConfig) -> EventStream<'static> {
        let driver = self.driver(config.model.as_deref(), config.working_dir, None);
        TurnSession::one_shot(driver, config.context, &config.prompt)
    }

    fn create_interactive_session(
        &self,
        config: InteractiveSessionConfig,
    ) -> Result<Box<dyn InteractiveSession>, ProviderError> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            established: false,
        };
        debug!(provider = CLAUDE_PROVIDER, session_id = %conversation.id, "created claude session");
        let driver = self.driver(
            config.model.as_deref(),
            config.working_dir,
            Some(conversation),
        );
        Ok(Box::new(TurnSession::new(driver, config.context)))
    }
}

/// Vendor-side session id. The first call creates it, later calls resume it.
#[derive(Clone, Copy, Debug)]
struct Conversation {
    id: Uuid,
    established: bool,
}

struct ClaudeDriver {
    config: ClaudeConfig,
    launcher: Arc<dyn Launcher>,
    model: Option<String>,
    conversation: Option<Conversation>,
}

impl ClaudeDriver {
    fn invocation(&self, prompt: &str) -> Invocation {
        let mut invocation = Invocation::new(self.config.binary.clone()).args([
            "-p",
            "--output-format",
            "stream-json",
            "--verbose",
            "--include-partial-messages",
        ]);
        if let Some(model) = &self.model {
            invocation = invocation.arg("--model").arg(model.as_str());
        }
        if let Some(conversation) = &self.conversation {
            let flag = if conversation.established {
                "--resume"
            } else {
                "--session-id"
            };
            invocation = invocation.arg(flag).arg(conversation.id.to_string());
        }
        invocation.current_dir = self.config.working_dir.clone();
        invocation
            .args(self.config.extra_args.iter().cloned())
            .arg("--")
            .arg(prompt)
    }
}

#[async_trait::async_trait]
impl TurnDriver for ClaudeDriver {
    type Adapter = ClaudeAdapter;

    fn provider_id(&self) -> ProviderId {
        ProviderId::new(CLAUDE_PROVIDER)
    }

    fn new_adapter(&self) -> ClaudeAdapter {
        ClaudeAdapter::new()
    }

    async fn launch(&mut self, prompt: &str) -> Result<LineStream, ProviderError> {
        let invocation = self.invocation(prompt);
        let lines = self.launcher.launch(&self.provider_id(), invocation).await?;
        if let Some(conversation) = self.conversation.as_mut() {
            conversation.established = true;
        }
        Ok(lines)
    }

    fn release(&mut self) {
        self.conversation = None;
    }
}
