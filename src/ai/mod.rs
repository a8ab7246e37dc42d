//! AI operations for journal summaries and semantic search.
//!
//! This module defines the two capabilities the core consumes, an
//! [`EmbeddingClient`] that turns text into a vector and an [`LlmClient`]
//! that completes chat prompts, together with the Ollama implementation of
//! both and the pure helpers that sit around an LLM call.
//!
//! # Module Structure
//!
//! - `client`: Capability traits
//! - `ollama`: HTTP client for Ollama API
//! - `prompts`: Seed prompt templates and prompt rendering
//! - `response`: Parsing of summary responses into well-formed or degraded results
//! - `stream`: Accumulator for streamed chat chunks
//!
//! # Example
//!
//! ```no_run
//! use quill::ai::{EmbeddingClient, OllamaClient};
//!
//! let client = OllamaClient::new("http://127.0.0.1:11434");
//! let embedding = client.embed("Hello world")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod ollama;
pub mod prompts;
pub mod response;
pub mod stream;

// Re-export commonly used types
pub use client::{ChunkStream, EmbeddingClient, LlmClient};
pub use ollama::{Message, OllamaClient};
pub use response::{parse_summary_response, ParsedSummary, SummaryFields, SummaryQuality};
pub use stream::{ChatChunk, StreamAccumulator, StreamState};
