//! Accumulation of streamed chat chunks.
//!
//! A streamed completion arrives as one JSON object per line. The accumulator
//! keeps text per role until a chunk with `done: true` arrives, at which point
//! the assistant text becomes final. Lines that do not parse are skipped.

use super::ollama::Message;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// One line of a streamed chat response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub done: bool,
}

/// Accumulation state.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamState {
    Collecting { by_role: BTreeMap<String, String> },
    Done { final_text: String },
}

/// Folds streamed chunks into the final assistant text.
#[derive(Debug)]
pub struct StreamAccumulator {
    state: StreamState,
    skipped: usize,
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            state: StreamState::Collecting {
                by_role: BTreeMap::new(),
            },
            skipped: 0,
        }
    }

    /// Feeds one raw line and returns the assistant text it added, if any.
    ///
    /// Input after the terminal chunk is ignored.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let by_role = match &mut self.state {
            StreamState::Collecting { by_role } => by_role,
            StreamState::Done { .. } => return None,
        };

        let chunk: ChatChunk = match serde_json::from_str(line.trim()) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Skipping malformed stream chunk: {}", e);
                self.skipped += 1;
                return None;
            }
        };

        let mut delta = None;
        if let Some(message) = chunk.message {
            if !message.content.is_empty() {
                by_role
                    .entry(message.role.clone())
                    .or_default()
                    .push_str(&message.content);
                if message.role == "assistant" {
                    delta = Some(message.content);
                }
            }
        }

        if chunk.done {
            let final_text = by_role.remove("assistant").unwrap_or_default();
            self.state = StreamState::Done { final_text };
        }

        delta
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, StreamState::Done { .. })
    }

    /// Number of lines skipped because they did not parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Consumes the accumulator and returns the assistant text collected so far.
    pub fn finish(self) -> String {
        match self.state {
            StreamState::Done { final_text } => final_text,
            StreamState::Collecting { mut by_role } => {
                by_role.remove("assistant").unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, done: bool) -> String {
        serde_json::json!({
            "message": {"role": "assistant", "content": content},
            "done": done
        })
        .to_string()
    }

    #[test]
    fn test_accumulates_until_done() {
        let mut acc = StreamAccumulator::new();

        assert_eq!(acc.push_line(&chunk("Hel", false)), Some("Hel".to_string()));
        assert_eq!(acc.push_line(&chunk("lo", false)), Some("lo".to_string()));
        assert!(!acc.is_done());
        assert_eq!(acc.push_line(&chunk("", true)), None);
        assert!(acc.is_done());

        assert_eq!(acc.finish(), "Hello");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut acc = StreamAccumulator::new();

        acc.push_line(&chunk("a", false));
        assert_eq!(acc.push_line("{not json"), None);
        acc.push_line(&chunk("b", true));

        assert_eq!(acc.skipped(), 1);
        assert_eq!(acc.finish(), "ab");
    }

    #[test]
    fn test_input_after_done_is_ignored() {
        let mut acc = StreamAccumulator::new();

        acc.push_line(&chunk("final", true));
        assert_eq!(acc.push_line(&chunk("late", false)), None);

        assert_eq!(
            acc.state(),
            &StreamState::Done {
                final_text: "final".to_string()
            }
        );
    }

    #[test]
    fn test_other_roles_do_not_leak_into_output() {
        let mut acc = StreamAccumulator::new();

        let system = serde_json::json!({"message": {"role": "system", "content": "x"}, "done": false});
        assert_eq!(acc.push_line(&system.to_string()), None);
        acc.push_line(&chunk("y", false));

        assert_eq!(acc.finish(), "y");
    }

    #[test]
    fn test_finish_without_done_returns_collected_text() {
        let mut acc = StreamAccumulator::new();
        acc.push_line(&chunk("cut ", false));
        acc.push_line(&chunk("off", false));

        assert!(!acc.is_done());
        assert_eq!(acc.finish(), "cut off");
    }
}
