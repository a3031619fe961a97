use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{HarnessError, ProviderError};
use crate::event::EventStream;
use crate::launcher::{Invocation, Launcher, LineStream, ProcessLauncher};
use crate::model::{ModelAliases, ProviderId};
use crate::provider::Provider;
use crate::session::{InteractiveSession, InteractiveSessionConfig, SessionConfig};
use crate::turn::{TurnDriver, TurnSession};

use super::adapter::CodexAdapter;
use super::config::CodexConfig;
use super::messages::CodexEvent;

/// Registry name of the Codex provider.
pub const CODEX_PROVIDER: &str = "codex";

/// Short model names accepted by the Codex provider.
pub const CODEX_MODELS: ModelAliases = ModelAliases::new(&[
    ("codex", "gpt-5-codex"),
    ("gpt-5", "gpt-5"),
    ("mini", "gpt-5-codex-mini"),
]);

/// Provider backed by `codex exec --json`.
#[derive(Clone)]
pub struct CodexProvider {
    config: CodexConfig,
    launcher: Arc<dyn Launcher>,
}

impl CodexProvider {
    pub fn new(config: CodexConfig) -> Self {
        Self {
            config,
            launcher: Arc::new(ProcessLauncher),
        }
    }

    /// Creates a provider configured from `RELAY_CODEX_BIN`,
    /// `RELAY_CODEX_ARGS` and `RELAY_CODEX_WORKDIR`.
    pub fn from_env() -> Result<Self, HarnessError> {
        Ok(Self::new(CodexConfig::from_env()?))
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    fn driver(
        &self,
        model: Option<&str>,
        working_dir: Option<PathBuf>,
        thread: Option<ThreadSlot>,
    ) -> CodexDriver {
        let mut config = self.config.clone();
        if working_dir.is_some() {
            config.working_dir = working_dir;
        }
        CodexDriver {
            config,
            launcher: self.launcher.clone(),
            model: self.resolve_model(model),
            thread,
        }
    }
}

impl Provider for CodexProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new(CODEX_PROVIDER)
    }

    fn is_available(&self) -> bool {
        which::which(&self.config.binary).is_ok()
    }

    fn resolve_model(&self, alias: Option<&str>) -> Option<String> {
        CODEX_MODELS.resolve(alias)
    }

    fn known_aliases(&self) -> Vec<&'static str> {
        CODEX_MODELS.names()
    }

    fn create_session(&self, config: SessionConfig) -> EventStream<'static> {
        let driver = self.driver(config.model.as_deref(), config.working_dir, None);
        TurnSession::one_shot(driver, config.context, &config.prompt)
    }

    fn create_interactive_session(
        &self,
        config: InteractiveSessionConfig,
    ) -> Result<Box<dyn InteractiveSession>, ProviderError> {
        let driver = self.driver(
            config.model.as_deref(),
            config.working_dir,
            Some(ThreadSlot::default()),
        );
        Ok(Box::new(TurnSession::new(driver, config.context)))
    }
}

/// Codex thread of an interactive session, filled from the first
/// `thread.started` event.
#[derive(Clone, Debug, Default)]
struct ThreadSlot {
    id: Option<String>,
    launched: bool,
}

struct CodexDriver {
    config: CodexConfig,
    launcher: Arc<dyn Launcher>,
    model: Option<String>,
    thread: Option<ThreadSlot>,
}

impl CodexDriver {
    fn invocation(&self, prompt: &str) -> Invocation {
        let mut invocation = Invocation::new(self.config.binary.clone()).args([
            "exec",
            "--json",
            "--skip-git-repo-check",
        ]);
        if let Some(model) = &self.model {
            invocation = invocation.arg("-m").arg(model.as_str());
        }
        invocation = invocation.args(self.config.extra_args.iter().cloned());
        if let Some(thread_id) = self.thread.as_ref().and_then(|t| t.id.as_deref()) {
            invocation = invocation.arg("resume").arg(thread_id);
        }
        invocation.current_dir = self.config.working_dir.clone();
        invocation.arg("--").arg(prompt)
    }
}

#[async_trait::async_trait]
impl TurnDriver for CodexDriver {
    type Adapter = CodexAdapter;

    fn provider_id(&self) -> ProviderId {
        ProviderId::new(CODEX_PROVIDER)
    }

    fn new_adapter(&self) -> CodexAdapter {
        CodexAdapter::new()
    }

    async fn launch(&mut self, prompt: &str) -> Result<LineStream, ProviderError> {
        if let Some(thread) = &self.thread
            && thread.launched
            && thread.id.is_none()
        {
            warn!(
                provider = CODEX_PROVIDER,
                "previous turn reported no thread id; starting a new codex thread"
            );
        }
        let invocation = self.invocation(prompt);
        let lines = self.launcher.launch(&self.provider_id(), invocation).await?;
        if let Some(thread) = self.thread.as_mut() {
            thread.launched = true;
        }
        Ok(lines)
    }

    fn observe(&mut self, line: &str) {
        let Some(thread) = self.thread.as_mut() else {
            return;
        };
        if thread.id.is_some() || !line.contains("thread.started") {
            return;
        }
        if let Ok(CodexEvent::ThreadStarted {
            thread_id: Some(id),
        }) = serde_json::from_str::<CodexEvent>(line)
            && !id.is_empty()
        {
            debug!(provider = CODEX_PROVIDER, thread_id = %id, "captured codex thread");
            thread.id = Some(id);
        }
    }

    fn release(&mut self) {
        self.thread = None;
    }
}
