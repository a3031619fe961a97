use crate::model::ProviderId;

/// Errors raised by a provider before or while a turn streams.
///
/// Vendor-reported failures are not errors: they travel as
/// `AgentEvent::Result { success: false, .. }` or `AgentEvent::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Vendor binary or credentials are missing.
    #[error("provider unavailable ({provider}): {message}")]
    Unavailable {
        provider: ProviderId,
        message: String,
    },
    /// Reading from the vendor process failed.
    #[error("transport error ({provider}): {message}")]
    Transport {
        provider: ProviderId,
        message: String,
    },
    /// Vendor process exited unsuccessfully.
    #[error("{provider} exited with status {}: {stderr}", status_label(.code))]
    Process {
        provider: ProviderId,
        code: Option<i32>,
        stderr: String,
    },
    /// Session used out of order (for example `send` during a turn).
    #[error("protocol error ({provider}): {message}")]
    Protocol {
        provider: ProviderId,
        message: String,
    },
}

impl ProviderError {
    /// Creates an availability error.
    pub fn unavailable(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a transport-level error.
    pub fn transport(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a process exit error.
    pub fn process(
        provider: impl Into<ProviderId>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            provider: provider.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Protocol {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the provider associated with this error.
    pub fn provider_id(&self) -> &ProviderId {
        match self {
            Self::Unavailable { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Process { provider, .. }
            | Self::Protocol { provider, .. } => provider,
        }
    }
}

fn status_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// Top-level error type for the public harness API.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Invalid registry or provider configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Requested provider is not registered.
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: ProviderId },
    /// Provider failure outside the event stream.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Local I/O failed (context files, terminal input).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
