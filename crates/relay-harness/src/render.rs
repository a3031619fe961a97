//! Terminal rendering of the provider-neutral event stream.
//!
//! The renderer is stateless apart from a [`RenderState`] the caller creates
//! once per turn. Tool activity is shown as dim `[Name] detail` tags on their
//! own lines, prose is written as it streams, and failures go to the error
//! sink when one is supplied.

use std::io::Write as _;

use colored::Colorize as _;

use crate::event::{AgentEvent, TurnSummary};

/// Cursor bookkeeping carried between events of one turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderState {
    pub last_char_was_newline: bool,
    /// Cleared the first time non-empty prose is actually written.
    pub is_first_text_output: bool,
}

impl RenderState {
    /// State for a fresh turn; the cursor is assumed to sit at a line start.
    pub fn new() -> Self {
        Self {
            last_char_was_newline: true,
            is_first_text_output: true,
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

type SinkFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Output sink plus optional error sink supplied by the caller.
pub struct Sinks<'a> {
    out: SinkFn<'a>,
    err: Option<SinkFn<'a>>,
}

impl<'a> Sinks<'a> {
    /// Sinks that send everything, failures included, to `out`.
    pub fn new(out: impl FnMut(&str) + Send + 'a) -> Self {
        Self {
            out: Box::new(out),
            err: None,
        }
    }

    /// Routes failures to `err` instead of the output sink.
    pub fn with_error(mut self, err: impl FnMut(&str) + Send + 'a) -> Self {
        self.err = Some(Box::new(err));
        self
    }

    pub fn write_out(&mut self, text: &str) {
        (self.out)(text);
    }

    /// Writes to the error sink. Returns true when it fell back to `out`.
    pub fn write_err(&mut self, text: &str) -> bool {
        match self.err.as_mut() {
            Some(err) => {
                err(text);
                false
            }
            None => {
                (self.out)(text);
                true
            }
        }
    }
}

impl Sinks<'static> {
    /// Process stdout and stderr, flushed after every write.
    pub fn stdio() -> Self {
        Self::new(|text| {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(text.as_bytes());
            let _ = stdout.flush();
        })
        .with_error(|text| {
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(text.as_bytes());
            let _ = stderr.flush();
        })
    }
}

/// Turns events into terminal writes.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renderer without ANSI styling.
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Renders one event, updating `state`.
    pub fn render(&self, event: &AgentEvent, state: &mut RenderState, sinks: &mut Sinks<'_>) {
        match event {
            AgentEvent::TextDelta { text } => self.render_text(text, state, sinks),
            // Only completions are shown; a started line for instant tools is noise.
            AgentEvent::ToolStart { .. } => {}
            AgentEvent::ToolEnd { name, detail } => {
                ensure_line_start(state, sinks);
                let tag = match detail.as_deref().filter(|d| !d.is_empty()) {
                    Some(detail) => format!("[{name}] {detail}"),
                    None => format!("[{name}]"),
                };
                sinks.write_out(&self.dim(&tag));
                sinks.write_out("\n");
                state.last_char_was_newline = true;
            }
            AgentEvent::Result {
                success: true,
                summary,
                ..
            } => {
                ensure_line_start(state, sinks);
                let line = format_summary(&summary.unwrap_or_default());
                sinks.write_out(&self.dim(&line));
                sinks.write_out("\n");
                state.last_char_was_newline = true;
            }
            AgentEvent::Result {
                success: false,
                errors,
                ..
            } => {
                ensure_line_start(state, sinks);
                let errors = errors.as_deref().unwrap_or_default();
                if errors.is_empty() {
                    self.write_error_line("turn failed", sinks);
                }
                for error in errors {
                    self.write_error_line(error, sinks);
                }
                state.last_char_was_newline = true;
            }
            AgentEvent::Error { message } => {
                if self.write_error_line(message, sinks) {
                    state.last_char_was_newline = true;
                }
            }
        }
    }

    fn render_text(&self, text: &str, state: &mut RenderState, sinks: &mut Sinks<'_>) {
        let text = if state.is_first_text_output {
            text.trim_start_matches('\n')
        } else {
            text
        };
        if text.is_empty() {
            return;
        }
        state.is_first_text_output = false;
        sinks.write_out(&self.assistant(text));
        state.last_char_was_newline = text.ends_with('\n');
    }

    fn write_error_line(&self, message: &str, sinks: &mut Sinks<'_>) -> bool {
        let line = format!("{}\n", self.attention(&format!("Error: {message}")));
        sinks.write_err(&line)
    }

    fn assistant(&self, text: &str) -> String {
        if self.color {
            text.bright_white().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn attention(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn ensure_line_start(state: &RenderState, sinks: &mut Sinks<'_>) {
    if !state.last_char_was_newline {
        sinks.write_out("\n");
    }
}

/// One-line success summary, e.g. `1500 tokens · 1 turn · 1.0s`.
pub fn format_summary(summary: &TurnSummary) -> String {
    let turns = if summary.num_turns == 1 { "turn" } else { "turns" };
    format!(
        "{} tokens · {} {turns} · {:.1}s",
        summary.total_tokens(),
        summary.num_turns,
        summary.duration_ms as f64 / 1000.0
    )
}
