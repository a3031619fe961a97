//! Subset of the Claude CLI `stream-json` output that the adapter reads.
//!
//! Every field is optional or defaulted and unknown tags collapse into
//! `Other`, so additive protocol changes never break a turn.

use serde::Deserialize;

use crate::vendors::cli::null_as_default;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClaudeMessage {
    /// Raw streaming envelope (`--include-partial-messages`).
    StreamEvent { event: StreamEvent },
    /// Terminal message of a turn.
    Result(ResultMessage),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum StreamEvent {
    ContentBlockStart {
        #[serde(default)]
        content_block: Option<ContentBlock>,
    },
    ContentBlockDelta {
        delta: BlockDelta,
    },
    ContentBlockStop {},
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    #[serde(alias = "server_tool_use")]
    ToolUse {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum BlockDelta {
    TextDelta {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },
    InputJsonDelta {
        #[serde(default, deserialize_with = "null_as_default")]
        partial_json: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct ResultMessage {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub is_error: Option<bool>,
    /// Final assistant text, repeated from the stream when it was streamed.
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ResultMessage {
    pub fn is_success(&self) -> bool {
        !self.is_error.unwrap_or(false)
            && self.subtype.as_deref().is_none_or(|subtype| subtype == "success")
    }

    /// Vendor error list as display strings.
    pub fn error_lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .map(|value| match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .filter(|line| !line.trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct Usage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_tokens: u64,
}
