use std::pin::Pin;

use crate::errors::ProviderError;

/// Token and timing totals reported when a turn succeeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TurnSummary {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub num_turns: u32,
    pub duration_ms: u64,
}

impl TurnSummary {
    /// Returns input plus output tokens.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Provider-neutral event emitted by every vendor adapter.
///
/// A turn yields any number of non-terminal events followed by at most one
/// `Result`, which is always last.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Chunk of assistant prose. Never empty.
    TextDelta { text: String },
    /// A tool invocation began. Arguments are only surfaced on completion.
    ToolStart { name: String },
    /// A tool invocation completed, optionally with a one-line redacted detail.
    ToolEnd {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// Terminal turn outcome. Build with [`AgentEvent::success`] or
    /// [`AgentEvent::failure`] so `summary` is only ever set on success.
    Result {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<TurnSummary>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        errors: Option<Vec<String>>,
    },
    /// Out-of-band vendor error that is fatal to the turn.
    Error { message: String },
}

impl AgentEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    pub fn tool_start(name: impl Into<String>) -> Self {
        Self::ToolStart { name: name.into() }
    }

    pub fn tool_end(name: impl Into<String>, detail: Option<String>) -> Self {
        Self::ToolEnd {
            name: name.into(),
            detail,
        }
    }

    /// Successful terminal result.
    pub fn success(summary: TurnSummary) -> Self {
        Self::Result {
            success: true,
            summary: Some(summary),
            errors: None,
        }
    }

    /// Failed terminal result. Vendors report no usage on failure.
    pub fn failure(errors: Option<Vec<String>>) -> Self {
        Self::Result {
            success: false,
            summary: None,
            errors,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns true for the event that terminates a turn.
    pub fn is_result(&self) -> bool {
        matches!(self, Self::Result { .. })
    }
}

/// Lazy, one-shot sequence of events for a single turn.
///
/// `Err` items carry transport/availability failures that happened before or
/// while the vendor call produced output; they end the turn.
pub type EventStream<'a> =
    Pin<Box<dyn futures::Stream<Item = Result<AgentEvent, ProviderError>> + Send + 'a>>;
