//! Summary generation for journal entries.
//!
//! A summary is produced by rendering the entry into the scope's prompt
//! template, sending it to the LLM, and parsing the reply. Replies that do not
//! follow the JSON contract still produce a result, marked as degraded.
//! Transport failures are retried once and then returned to the caller.

pub use crate::ai::SummaryQuality;

use crate::ai::prompts::summary_messages;
use crate::ai::{parse_summary_response, LlmClient, Message, ParsedSummary, StreamAccumulator};
use crate::constants::UNKNOWN_MOOD;
use crate::db::entries::{get_entry, Entry};
use crate::db::Database;
use crate::errors::{AIError, AppResult};
use crate::ops::prompt_types::PromptTypeRegistry;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A generated summary. Not persisted unless saved as a favorite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub entry_id: String,
    pub prompt_type: String,
    pub summary: String,
    pub key_topics: Vec<String>,
    pub mood: String,
    pub quality: SummaryQuality,
}

impl SummaryResult {
    fn from_parsed(entry_id: &str, prompt_type: &str, parsed: ParsedSummary) -> Self {
        match parsed {
            ParsedSummary::WellFormed(fields) => Self {
                entry_id: entry_id.to_string(),
                prompt_type: prompt_type.to_string(),
                summary: fields.summary,
                key_topics: fields.key_topics,
                mood: fields.mood,
                quality: SummaryQuality::WellFormed,
            },
            ParsedSummary::Degraded(text) => Self {
                entry_id: entry_id.to_string(),
                prompt_type: prompt_type.to_string(),
                summary: text,
                key_topics: Vec::new(),
                mood: UNKNOWN_MOOD.to_string(),
                quality: SummaryQuality::Degraded,
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.quality == SummaryQuality::Degraded
    }
}

/// Generates entry summaries with the LLM.
pub struct SummarizationService {
    db: Database,
    prompt_types: PromptTypeRegistry,
    llm: Arc<dyn LlmClient>,
}

impl SummarizationService {
    pub fn new(db: Database, prompt_types: PromptTypeRegistry, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            db,
            prompt_types,
            llm,
        }
    }

    /// Summarizes a stored entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the entry or prompt type does not exist,
    /// and `AIError::LlmUnavailable` if the LLM is unreachable on both attempts.
    pub fn summarize(
        &self,
        entry_id: &str,
        prompt_type_id: &str,
        config_id: &str,
    ) -> AppResult<SummaryResult> {
        let entry = self.load_entry(entry_id)?;
        self.summarize_entry(&entry, prompt_type_id, config_id)
    }

    /// Summarizes an entry that is already in hand.
    pub fn summarize_entry(
        &self,
        entry: &Entry,
        prompt_type_id: &str,
        config_id: &str,
    ) -> AppResult<SummaryResult> {
        info!(
            "Summarizing entry {} with prompt type {} (scope {})",
            entry.id, prompt_type_id, config_id
        );
        let messages = self.messages_for(entry, prompt_type_id, config_id)?;

        let raw = with_retry_once(|| self.llm.complete(&messages))?;
        debug!("Received {} chars from LLM", raw.len());

        Ok(self.finish(entry, prompt_type_id, &raw))
    }

    /// Summarizes an entry from a streamed completion.
    ///
    /// `on_delta` receives assistant text as it arrives. Cancellation is checked
    /// before each chunk is pulled; once `cancel` fires no further chunks are
    /// read and the upstream stream is dropped.
    ///
    /// # Errors
    ///
    /// Returns `AIError::Cancelled` if `cancel` fired, plus the errors of
    /// [`SummarizationService::summarize`].
    pub fn summarize_stream<F>(
        &self,
        entry_id: &str,
        prompt_type_id: &str,
        config_id: &str,
        cancel: &CancellationToken,
        mut on_delta: F,
    ) -> AppResult<SummaryResult>
    where
        F: FnMut(&str),
    {
        let entry = self.load_entry(entry_id)?;
        info!(
            "Streaming summary for entry {} with prompt type {} (scope {})",
            entry.id, prompt_type_id, config_id
        );
        let messages = self.messages_for(&entry, prompt_type_id, config_id)?;

        let mut chunks = with_retry_once(|| self.llm.complete_stream(&messages))?;
        let mut accumulator = StreamAccumulator::new();

        loop {
            if cancel.is_cancelled() {
                info!("Summary stream for entry {} cancelled", entry.id);
                return Err(AIError::Cancelled.into());
            }
            let Some(line) = chunks.next() else {
                break;
            };
            if let Some(delta) = accumulator.push_line(&line?) {
                on_delta(&delta);
            }
            if accumulator.is_done() {
                break;
            }
        }
        drop(chunks);

        if accumulator.skipped() > 0 {
            warn!("Skipped {} malformed stream chunks", accumulator.skipped());
        }
        if !accumulator.is_done() {
            warn!("Summary stream ended without a terminal chunk");
        }

        let raw = accumulator.finish();
        Ok(self.finish(&entry, prompt_type_id, &raw))
    }

    fn load_entry(&self, entry_id: &str) -> AppResult<Entry> {
        let conn = self.db.get_conn()?;
        get_entry(&conn, entry_id)
    }

    fn messages_for(
        &self,
        entry: &Entry,
        prompt_type_id: &str,
        config_id: &str,
    ) -> AppResult<Vec<Message>> {
        let prompt_type = self.prompt_types.get(config_id, prompt_type_id)?;
        Ok(summary_messages(&prompt_type.prompt, entry))
    }

    fn finish(&self, entry: &Entry, prompt_type_id: &str, raw: &str) -> SummaryResult {
        let result = SummaryResult::from_parsed(&entry.id, prompt_type_id, parse_summary_response(raw));
        if result.is_degraded() {
            warn!(
                "LLM reply for entry {} was not well-formed JSON, returning degraded summary",
                entry.id
            );
        }
        result
    }
}

fn with_retry_once<T>(mut call: impl FnMut() -> AppResult<T>) -> AppResult<T> {
    match call() {
        Err(e) if e.is_retryable() => {
            warn!("LLM call failed ({}), retrying once", e);
            call()
        }
        other => other,
    }
}
