//! Events printed by `codex exec --json`, one per line.

use serde::Deserialize;

use crate::vendors::cli::null_as_default;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum CodexEvent {
    #[serde(rename = "thread.started")]
    ThreadStarted {
        #[serde(default)]
        thread_id: Option<String>,
    },
    #[serde(rename = "turn.started")]
    TurnStarted {},
    #[serde(rename = "item.started")]
    ItemStarted { item: CodexItem },
    #[serde(rename = "item.updated")]
    ItemUpdated {},
    #[serde(rename = "item.completed")]
    ItemCompleted { item: CodexItem },
    #[serde(rename = "turn.completed")]
    TurnCompleted {
        #[serde(default)]
        usage: Option<CodexUsage>,
    },
    #[serde(rename = "turn.failed")]
    TurnFailed {
        #[serde(default)]
        error: Option<ErrorBody>,
    },
    /// Stream-level notice outside any item.
    #[serde(rename = "error")]
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CodexItem {
    CommandExecution {
        #[serde(default, deserialize_with = "null_as_default")]
        command: String,
        /// Absent until the command has finished.
        #[serde(default)]
        exit_code: Option<i64>,
    },
    FileChange {
        #[serde(default, deserialize_with = "null_as_default")]
        changes: Vec<FileUpdate>,
    },
    McpToolCall {
        #[serde(default, deserialize_with = "null_as_default")]
        tool: String,
    },
    WebSearch {
        #[serde(default, deserialize_with = "null_as_default")]
        query: String,
    },
    AgentMessage {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct FileUpdate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct CodexUsage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_tokens: u64,
}
