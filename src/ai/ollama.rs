//! Ollama HTTP client for embeddings and chat completion.
//!
//! This module provides a simple client for interacting with the Ollama API
//! for generating embeddings and chat completions, both buffered and streamed.

use super::client::{ChunkStream, EmbeddingClient, LlmClient};
use crate::config::Config;
use crate::constants::{DEFAULT_CHAT_MODEL, DEFAULT_EMBED_MODEL};
use crate::errors::{AIError, AppError, AppResult};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use tracing::debug;

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender (system, user, assistant)
    pub role: String,
    /// The content of the message
    pub content: String,
}

impl Message {
    /// Creates a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for embedding generation.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from embedding generation.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Request body for chat completion.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// Response from chat completion.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Message,
}

/// Client for interacting with Ollama API.
pub struct OllamaClient {
    base_url: String,
    embed_model: String,
    chat_model: String,
    client: Client,
}

impl OllamaClient {
    /// Creates a new Ollama client using the default models.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the Ollama API (e.g., "http://127.0.0.1:11434")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            client: Client::new(),
        }
    }

    /// Creates a client from the application configuration, honouring its models and timeout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            embed_model: config.embed_model.clone(),
            chat_model: config.chat_model.clone(),
            client,
        })
    }

    /// Overrides the models used for embedding and chat.
    pub fn with_models(mut self, embed_model: impl Into<String>, chat_model: impl Into<String>) -> Self {
        self.embed_model = embed_model.into();
        self.chat_model = chat_model.into();
        self
    }

    /// Posts a chat request and checks the status code.
    fn post_chat(&self, messages: &[Message], stream: bool) -> AppResult<Response> {
        debug!(
            "Sending chat request with model: {} (stream: {})",
            self.chat_model, stream
        );

        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            stream,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| AIError::LlmUnavailable(e.to_string()))?;

        check_status(response, &self.chat_model)
    }
}

/// Maps non-success responses to the matching error.
fn check_status(response: Response, model: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().unwrap_or_default();

    if status.as_u16() == 404 {
        return Err(AIError::ModelNotFound(model.to_string()).into());
    }

    Err(AIError::InvalidResponse(format!("HTTP {}: {}", status, error_text)).into())
}

impl EmbeddingClient for OllamaClient {
    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Ollama API is not reachable (`EmbeddingUnavailable`)
    /// - Model is not found
    /// - API returns an error response or an empty vector
    fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        debug!("Generating embedding with model: {}", self.embed_model);

        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.embed_model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| AIError::EmbeddingUnavailable(e.to_string()))?;
        let response = check_status(response, &self.embed_model)?;

        let embed_response: EmbedResponse = response.json().map_err(|e| {
            AIError::InvalidResponse(format!("Failed to parse embedding response: {}", e))
        })?;

        if embed_response.embedding.is_empty() {
            return Err(AIError::InvalidResponse("Empty embedding returned".to_string()).into());
        }

        debug!(
            "Generated embedding with {} dimensions",
            embed_response.embedding.len()
        );
        Ok(embed_response.embedding)
    }
}

impl LlmClient for OllamaClient {
    fn complete(&self, messages: &[Message]) -> AppResult<String> {
        let response = self.post_chat(messages, false)?;

        let chat_response: ChatResponse = response.json().map_err(|e| {
            // A body cut off mid-read is a transport failure, not a bad payload
            if e.is_timeout() || e.is_body() {
                AppError::from(AIError::LlmUnavailable(e.to_string()))
            } else {
                AIError::InvalidResponse(format!("Failed to parse chat response: {}", e)).into()
            }
        })?;

        debug!("Received chat response");
        Ok(chat_response.message.content)
    }

    fn complete_stream(&self, messages: &[Message]) -> AppResult<ChunkStream<'_>> {
        let response = self.post_chat(messages, true)?;

        let lines = BufReader::new(response)
            .lines()
            .map(|line| -> AppResult<String> {
                line.map_err(|e| AIError::LlmUnavailable(e.to_string()).into())
            })
            .filter(|line| !matches!(line, Ok(text) if text.trim().is_empty()));

        Ok(Box::new(lines))
    }
}
