use std::time::Duration;

use tracing::debug;

use crate::event::{AgentEvent, TurnSummary};
use crate::redact::redact_secrets;
use crate::turn::TurnAdapter;

use super::messages::{CodexEvent, CodexItem};

const SHELL_TOOL: &str = "Bash";
const EDIT_TOOL: &str = "Edit";
const SEARCH_TOOL: &str = "WebSearch";

/// Translator from Codex `exec --json` lines to events. Holds no state; the
/// turn's elapsed time comes from the caller.
#[derive(Debug, Default)]
pub(crate) struct CodexAdapter;

impl CodexAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl TurnAdapter for CodexAdapter {
    fn on_line(&mut self, line: &str, elapsed: Duration) -> Vec<AgentEvent> {
        match serde_json::from_str::<CodexEvent>(line) {
            Ok(event) => map_event(event, elapsed),
            Err(e) => {
                debug!(error = %e, "ignoring unparsable codex line");
                Vec::new()
            }
        }
    }
}

fn map_event(event: CodexEvent, elapsed: Duration) -> Vec<AgentEvent> {
    match event {
        CodexEvent::ItemStarted { item } => item_started(item).into_iter().collect(),
        CodexEvent::ItemCompleted { item } => item_completed(item),
        CodexEvent::TurnCompleted { usage } => {
            let usage = usage.unwrap_or_default();
            vec![AgentEvent::success(TurnSummary {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                num_turns: 1,
                duration_ms: elapsed.as_millis() as u64,
            })]
        }
        CodexEvent::TurnFailed { error } => {
            let errors = error
                .map(|e| e.message)
                .filter(|m| !m.trim().is_empty())
                .map(|m| vec![m]);
            vec![AgentEvent::failure(errors)]
        }
        CodexEvent::Error { message } => vec![AgentEvent::error(message)],
        CodexEvent::ThreadStarted { .. }
        | CodexEvent::TurnStarted {}
        | CodexEvent::ItemUpdated {}
        | CodexEvent::Other => Vec::new(),
    }
}

fn item_started(item: CodexItem) -> Option<AgentEvent> {
    match item {
        CodexItem::CommandExecution { .. } => Some(AgentEvent::tool_start(SHELL_TOOL)),
        CodexItem::FileChange { .. } => Some(AgentEvent::tool_start(EDIT_TOOL)),
        CodexItem::McpToolCall { tool } => Some(AgentEvent::tool_start(tool)),
        _ => None,
    }
}

fn item_completed(item: CodexItem) -> Vec<AgentEvent> {
    match item {
        CodexItem::CommandExecution { exit_code: None, .. } => Vec::new(),
        CodexItem::CommandExecution { command, .. } => {
            let detail = single_line(&command).map(|l| redact_secrets(l).into_owned());
            vec![AgentEvent::tool_end(SHELL_TOOL, detail)]
        }
        CodexItem::FileChange { changes } => {
            let detail = changes
                .into_iter()
                .map(|c| c.path)
                .find(|p| !p.is_empty());
            vec![AgentEvent::tool_end(EDIT_TOOL, detail)]
        }
        CodexItem::McpToolCall { tool } => vec![AgentEvent::tool_end(tool, None)],
        CodexItem::WebSearch { query } => vec![
            AgentEvent::tool_start(SEARCH_TOOL),
            AgentEvent::tool_end(SEARCH_TOOL, single_line(&query).map(str::to_string)),
        ],
        CodexItem::AgentMessage { text } if !text.is_empty() => vec![AgentEvent::text(text)],
        CodexItem::Error { message } => vec![AgentEvent::error(message)],
        CodexItem::AgentMessage { .. } | CodexItem::Other => Vec::new(),
    }
}

fn single_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Vec<AgentEvent> {
        let mut adapter = CodexAdapter::new();
        lines
            .iter()
            .flat_map(|line| adapter.on_line(line, Duration::from_millis(2500)))
            .collect()
    }

    #[test]
    fn command_lifecycle_maps_to_bash_tool() {
        let events = run(&[
            r#"{"type":"item.started","item":{"id":"1","type":"command_execution","command":"bash -lc 'cargo test'","exit_code":null,"status":"in_progress"}}"#,
            r#"{"type":"item.completed","item":{"id":"1","type":"command_execution","command":"bash -lc 'cargo test'","exit_code":0,"status":"completed"}}"#,
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::tool_start("Bash"),
                AgentEvent::tool_end("Bash", Some("bash -lc 'cargo test'".into())),
            ]
        );
    }

    #[test]
    fn completed_command_without_exit_code_is_skipped() {
        let events = run(&[
            r#"{"type":"item.completed","item":{"id":"1","type":"command_execution","command":"sleep 100"}}"#,
        ]);
        assert!(events.is_empty());
    }

    #[test]
    fn failed_command_still_ends_and_is_redacted() {
        let events = run(&[
            r#"{"type":"item.completed","item":{"id":"1","type":"command_execution","command":"DEPLOY_TOKEN=abc ./ship","exit_code":1}}"#,
        ]);
        assert_eq!(
            events,
            vec![AgentEvent::tool_end("Bash", Some("DEPLOY_TOKEN=*** ./ship".into()))]
        );
    }

    #[test]
    fn file_change_uses_first_path() {
        let events = run(&[
            r#"{"type":"item.started","item":{"id":"2","type":"file_change","changes":[]}}"#,
            r#"{"type":"item.completed","item":{"id":"2","type":"file_change","changes":[{"path":"src/lib.rs","kind":"update"},{"path":"README.md","kind":"add"}],"status":"completed"}}"#,
            r#"{"type":"item.completed","item":{"id":"3","type":"file_change","changes":[]}}"#,
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::tool_start("Edit"),
                AgentEvent::tool_end("Edit", Some("src/lib.rs".into())),
                AgentEvent::tool_end("Edit", None),
            ]
        );
    }

    #[test]
    fn mcp_tool_uses_tool_name() {
        let events = run(&[
            r#"{"type":"item.started","item":{"id":"4","type":"mcp_tool_call","server":"docs","tool":"lookup"}}"#,
            r#"{"type":"item.completed","item":{"id":"4","type":"mcp_tool_call","server":"docs","tool":"lookup","status":"completed"}}"#,
        ]);
        assert_eq!(
            events,
            vec![AgentEvent::tool_start("lookup"), AgentEvent::tool_end("lookup", None)]
        );
    }

    #[test]
    fn web_search_emits_start_and_end_together() {
        let events = run(&[
            r#"{"type":"item.started","item":{"id":"5","type":"web_search","query":"tokio select"}}"#,
            r#"{"type":"item.completed","item":{"id":"5","type":"web_search","query":"tokio select"}}"#,
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::tool_start("WebSearch"),
                AgentEvent::tool_end("WebSearch", Some("tokio select".into())),
            ]
        );
    }

    #[test]
    fn agent_messages_and_error_items() {
        let events = run(&[
            r#"{"type":"item.completed","item":{"id":"6","type":"agent_message","text":""}}"#,
            r#"{"type":"item.completed","item":{"id":"7","type":"agent_message","text":"All green."}}"#,
            r#"{"type":"item.completed","item":{"id":"8","type":"error","message":"sandbox denied"}}"#,
        ]);
        assert_eq!(
            events,
            vec![AgentEvent::text("All green."), AgentEvent::error("sandbox denied")]
        );
    }

    #[test]
    fn turn_completion_uses_usage_and_wall_clock() {
        let events = run(&[
            r#"{"type":"thread.started","thread_id":"th"}"#,
            r#"{"type":"turn.started"}"#,
            r#"{"type":"item.updated","item":{"id":"9","type":"command_execution","command":"ls"}}"#,
            r#"{"type":"turn.completed","usage":{"input_tokens":1200,"cached_input_tokens":800,"output_tokens":300}}"#,
        ]);
        assert_eq!(
            events,
            vec![AgentEvent::success(TurnSummary {
                input_tokens: 1200,
                output_tokens: 300,
                num_turns: 1,
                duration_ms: 2500,
            })]
        );
    }

    #[test]
    fn null_usage_counts_still_end_the_turn() {
        let events = run(&[
            r#"{"type":"item.completed","item":{"id":"1","type":"agent_message","text":"ok"}}"#,
            r#"{"type":"turn.completed","usage":{"input_tokens":null,"output_tokens":12}}"#,
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::text("ok"),
                AgentEvent::success(TurnSummary {
                    input_tokens: 0,
                    output_tokens: 12,
                    num_turns: 1,
                    duration_ms: 2500,
                }),
            ]
        );
    }

    #[test]
    fn turn_failure_and_stream_errors() {
        let events = run(&[
            r#"{"type":"error","message":"stream disconnected; retrying"}"#,
            r#"{"type":"turn.failed","error":{"message":"usage limit reached"}}"#,
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::error("stream disconnected; retrying"),
                AgentEvent::failure(Some(vec!["usage limit reached".into()])),
            ]
        );
        assert_eq!(run(&[r#"{"type":"turn.failed"}"#]), vec![AgentEvent::failure(None)]);
    }

    #[test]
    fn reasoning_todo_and_garbage_are_ignored() {
        let events = run(&[
            r#"{"type":"item.started","item":{"id":"a","type":"reasoning","text":"thinking"}}"#,
            r#"{"type":"item.completed","item":{"id":"b","type":"todo_list","items":[]}}"#,
            r#"{"type":"session.configured"}"#,
            "not json",
        ]);
        assert!(events.is_empty());
    }
}
