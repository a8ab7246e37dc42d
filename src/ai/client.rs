//! Capability traits for the model runtime.
//!
//! The search and summarization services only depend on these traits, so
//! tests can substitute deterministic implementations for the Ollama client.

use super::ollama::Message;
use crate::errors::AppResult;

/// Raw lines of a streamed chat completion, one JSON chunk per line.
///
/// Dropping the iterator stops reading from the upstream connection.
pub type ChunkStream<'a> = Box<dyn Iterator<Item = AppResult<String>> + Send + 'a>;

/// Converts text into a fixed-length embedding vector.
pub trait EmbeddingClient: Send + Sync {
    /// Embeds `text`.
    ///
    /// # Errors
    ///
    /// Fails with `AIError::EmbeddingUnavailable` on transport errors.
    fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Performs chat completions.
pub trait LlmClient: Send + Sync {
    /// Returns the full assistant reply.
    ///
    /// # Errors
    ///
    /// Fails with `AIError::LlmUnavailable` on transport errors.
    fn complete(&self, messages: &[Message]) -> AppResult<String>;

    /// Starts a streamed completion.
    ///
    /// Each item is one raw chunk shaped as `{"message": {"role", "content"}, "done": bool}`.
    /// Parsing is left to the caller so that a malformed chunk can be skipped
    /// without ending the stream.
    fn complete_stream(&self, messages: &[Message]) -> AppResult<ChunkStream<'_>>;
}
