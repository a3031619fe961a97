use std::time::Duration;

use tracing::debug;

use crate::event::{AgentEvent, TurnSummary};
use crate::redact::redact_secrets;
use crate::turn::TurnAdapter;

use super::messages::{BlockDelta, ClaudeMessage, ContentBlock, ResultMessage, StreamEvent};

/// Tool input fields tried, in order, for the one-line detail of a tool tag.
const DETAIL_FIELDS: &[&str] = &[
    "file_path",
    "notebook_path",
    "path",
    "command",
    "description",
    "pattern",
    "query",
    "url",
];

/// Tool call whose JSON input is still streaming in.
#[derive(Debug, Default)]
struct ToolAccumulator {
    name: String,
    json: String,
}

/// Turn-scoped translator from Claude `stream-json` lines to events.
#[derive(Debug, Default)]
pub(crate) struct ClaudeAdapter {
    open_tool: Option<ToolAccumulator>,
    emitted_text: bool,
}

impl ClaudeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_stream_event(&mut self, event: StreamEvent) -> Vec<AgentEvent> {
        match event {
            StreamEvent::ContentBlockStart {
                content_block: Some(ContentBlock::ToolUse { name }),
            } => {
                if let Some(abandoned) = self.open_tool.take() {
                    debug!(tool = %abandoned.name, "discarding unfinished tool input");
                }
                self.open_tool = Some(ToolAccumulator {
                    name,
                    json: String::new(),
                });
                Vec::new()
            }
            StreamEvent::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
            } => {
                if text.is_empty() {
                    return Vec::new();
                }
                self.emitted_text = true;
                vec![AgentEvent::text(text)]
            }
            StreamEvent::ContentBlockDelta {
                delta: BlockDelta::InputJsonDelta { partial_json },
            } => {
                if let Some(tool) = self.open_tool.as_mut() {
                    tool.json.push_str(&partial_json);
                }
                Vec::new()
            }
            StreamEvent::ContentBlockStop {} => match self.open_tool.take() {
                Some(tool) => {
                    let detail = tool_detail(&tool.json);
                    vec![AgentEvent::tool_end(tool.name, detail)]
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn on_result(&mut self, result: ResultMessage, elapsed: Duration) -> Vec<AgentEvent> {
        if !result.is_success() {
            return vec![AgentEvent::failure(failure_errors(&result))];
        }

        let mut events = Vec::with_capacity(2);
        if !self.emitted_text
            && let Some(text) = result.result.as_deref().filter(|t| !t.is_empty())
        {
            self.emitted_text = true;
            events.push(AgentEvent::text(text));
        }
        let usage = result.usage.unwrap_or_default();
        events.push(AgentEvent::success(TurnSummary {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            num_turns: result.num_turns.unwrap_or(1),
            duration_ms: result
                .duration_ms
                .unwrap_or_else(|| elapsed.as_millis() as u64),
        }));
        events
    }
}

impl TurnAdapter for ClaudeAdapter {
    fn on_line(&mut self, line: &str, elapsed: Duration) -> Vec<AgentEvent> {
        let message = match serde_json::from_str::<ClaudeMessage>(line) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "ignoring unparsable claude line");
                return Vec::new();
            }
        };
        match message {
            ClaudeMessage::StreamEvent { event } => self.on_stream_event(event),
            ClaudeMessage::Result(result) => self.on_result(result, elapsed),
            ClaudeMessage::Other => Vec::new(),
        }
    }
}

/// Errors reported for a failed turn. Falls back to the error text in
/// `result`, then to the subtype (for example `error_max_turns`).
fn failure_errors(result: &ResultMessage) -> Option<Vec<String>> {
    let errors = result.error_lines();
    if !errors.is_empty() {
        return Some(errors);
    }
    if result.is_error == Some(true)
        && let Some(text) = result.result.as_deref().map(str::trim).filter(|t| !t.is_empty())
    {
        return Some(vec![text.to_string()]);
    }
    result
        .subtype
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "success")
        .map(|s| vec![s.to_string()])
}

/// One-line summary of a tool's input. Never fails; unparsable input or no
/// usable field yields `None`.
pub(crate) fn tool_detail(input_json: &str) -> Option<String> {
    let input: serde_json::Value = serde_json::from_str(input_json).ok()?;
    let input = input.as_object()?;
    DETAIL_FIELDS.iter().find_map(|field| {
        let line = input
            .get(*field)?
            .as_str()?
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())?;
        Some(if *field == "command" {
            redact_secrets(line).into_owned()
        } else {
            line.to_string()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[serde_json::Value]) -> Vec<AgentEvent> {
        let mut adapter = ClaudeAdapter::new();
        lines
            .iter()
            .flat_map(|line| adapter.on_line(&line.to_string(), Duration::from_millis(4200)))
            .collect()
    }

    fn stream(event: serde_json::Value) -> serde_json::Value {
        serde_json::json!({"type": "stream_event", "event": event})
    }

    fn text(t: &str) -> serde_json::Value {
        stream(serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": t}
        }))
    }

    fn tool_start(name: &str) -> serde_json::Value {
        stream(serde_json::json!({
            "type": "content_block_start",
            "index": 1,
            "content_block": {"type": "tool_use", "id": "toolu_1", "name": name, "input": {}}
        }))
    }

    fn json_delta(partial: &str) -> serde_json::Value {
        stream(serde_json::json!({
            "type": "content_block_delta",
            "index": 1,
            "delta": {"type": "input_json_delta", "partial_json": partial}
        }))
    }

    fn stop() -> serde_json::Value {
        stream(serde_json::json!({"type": "content_block_stop", "index": 1}))
    }

    fn success(result: &str) -> serde_json::Value {
        serde_json::json!({
            "type": "result",
            "subtype": "success",
            "is_error": false,
            "result": result,
            "num_turns": 2,
            "duration_ms": 1500,
            "usage": {"input_tokens": 100, "output_tokens": 20, "cache_read_input_tokens": 7}
        })
    }

    #[test]
    fn zero_length_text_delta_is_dropped() {
        assert_eq!(run(&[text(""), text("hi")]), vec![AgentEvent::text("hi")]);
    }

    #[test]
    fn restarted_tool_discards_abandoned_input() {
        let events = run(&[
            tool_start("A"),
            json_delta("{\"a\""),
            tool_start("B"),
            json_delta("{}"),
            stop(),
        ]);
        assert_eq!(events, vec![AgentEvent::tool_end("B", None)]);
    }

    #[test]
    fn streamed_input_becomes_tool_detail() {
        let events = run(&[
            tool_start("Edit"),
            json_delta("{\"file_path\": \"src/"),
            json_delta("x.ts\", \"old_string\": \"a\"}"),
            stop(),
        ]);
        assert_eq!(events, vec![AgentEvent::tool_end("Edit", Some("src/x.ts".into()))]);
    }

    #[test]
    fn malformed_tool_input_omits_detail() {
        let events = run(&[tool_start("Bash"), json_delta("{\"command\": \"ls"), stop()]);
        assert_eq!(events, vec![AgentEvent::tool_end("Bash", None)]);
    }

    #[test]
    fn stop_without_open_tool_emits_nothing() {
        assert!(run(&[stop(), json_delta("{}")]).is_empty());
    }

    #[test]
    fn detail_chain_prefers_paths_and_redacts_commands() {
        assert_eq!(
            tool_detail(r#"{"description": "list", "path": "crates"}"#).as_deref(),
            Some("crates")
        );
        assert_eq!(
            tool_detail(r#"{"command": "\n  TOKEN=abc make deploy\nsecond line"}"#).as_deref(),
            Some("TOKEN=*** make deploy")
        );
        assert_eq!(
            tool_detail(r#"{"description": "API_KEY=plain"}"#).as_deref(),
            Some("API_KEY=plain")
        );
        assert_eq!(
            tool_detail(r#"{"pattern": 42, "url": "https://x"}"#).as_deref(),
            Some("https://x")
        );
        assert_eq!(tool_detail(r#"{"todos": []}"#), None);
        assert_eq!(tool_detail(""), None);
    }

    #[test]
    fn inline_result_text_is_used_when_nothing_streamed() {
        let events = run(&[success("done")]);
        assert_eq!(
            events,
            vec![
                AgentEvent::text("done"),
                AgentEvent::success(TurnSummary {
                    input_tokens: 100,
                    output_tokens: 20,
                    num_turns: 2,
                    duration_ms: 1500,
                }),
            ]
        );
    }

    #[test]
    fn inline_result_text_is_not_repeated_after_streaming() {
        let events = run(&[text("done"), success("done")]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], AgentEvent::text("done"));
        assert!(events[1].is_result());
    }

    #[test]
    fn missing_counts_fall_back_to_defaults() {
        let events = run(&[serde_json::json!({"type": "result", "subtype": "success"})]);
        assert_eq!(
            events,
            vec![AgentEvent::success(TurnSummary {
                input_tokens: 0,
                output_tokens: 0,
                num_turns: 1,
                duration_ms: 4200,
            })]
        );
    }

    #[test]
    fn null_usage_counts_still_end_the_turn() {
        let events = run(&[
            text("hi"),
            serde_json::json!({
                "type": "result",
                "subtype": "success",
                "num_turns": 1,
                "duration_ms": 10,
                "usage": {"input_tokens": 3, "output_tokens": null}
            }),
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::text("hi"),
                AgentEvent::success(TurnSummary {
                    input_tokens: 3,
                    output_tokens: 0,
                    num_turns: 1,
                    duration_ms: 10,
                }),
            ]
        );
    }

    #[test]
    fn failed_result_carries_vendor_errors() {
        let events = run(&[serde_json::json!({
            "type": "result",
            "subtype": "error_during_execution",
            "is_error": true,
            "errors": ["tool crashed"]
        })]);
        assert_eq!(events, vec![AgentEvent::failure(Some(vec!["tool crashed".into()]))]);
    }

    #[test]
    fn failed_result_without_error_list_uses_result_text_then_subtype() {
        let events = run(&[serde_json::json!({
            "type": "result",
            "subtype": "success",
            "is_error": true,
            "result": "API Error: overloaded"
        })]);
        assert_eq!(
            events,
            vec![AgentEvent::failure(Some(vec!["API Error: overloaded".into()]))]
        );

        let events = run(&[serde_json::json!({"type": "result", "subtype": "error_max_turns"})]);
        assert_eq!(events, vec![AgentEvent::failure(Some(vec!["error_max_turns".into()]))]);
    }

    #[test]
    fn unrelated_and_garbage_lines_are_ignored() {
        let events = run(&[
            serde_json::json!({"type": "system", "subtype": "init", "session_id": "x"}),
            serde_json::json!({"type": "assistant", "message": {"content": []}}),
            serde_json::json!({"type": "user", "message": {"content": []}}),
            serde_json::json!("not an object"),
            stream(serde_json::json!({"type": "message_delta", "usage": {}})),
        ]);
        assert!(events.is_empty());
        let mut adapter = ClaudeAdapter::new();
        assert!(adapter.on_line("{truncated", Duration::ZERO).is_empty());
    }
}
