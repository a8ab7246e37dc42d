//! Deterministic stand-ins for the model runtime, used by unit tests.

use crate::ai::{ChunkStream, EmbeddingClient, LlmClient, Message};
use crate::db::Database;
use crate::errors::{AIError, AppResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

pub const STUB_DIMENSIONS: usize = 256;

/// Opens a schema-initialized database in a temporary directory.
pub fn test_db() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("test.db")).unwrap();
    db.initialize_schema().unwrap();
    (dir, db)
}

/// Bag-of-words embedder hashing each token into a fixed bucket.
///
/// Tokens registered through [`StubEmbedder::with_concept`] share one bucket,
/// which lets tests express "these words mean the same thing".
pub struct StubEmbedder {
    concepts: HashMap<String, String>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self {
            concepts: HashMap::new(),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_concept(mut self, concept: &str, words: &[&str]) -> Self {
        for word in words {
            self.concepts.insert(word.to_string(), concept.to_string());
        }
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(&self, token: &str) -> usize {
        let key = self.concepts.get(token).map_or(token, String::as_str);
        let hash = blake3::hash(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        (u64::from_le_bytes(prefix) % STUB_DIMENSIONS as u64) as usize
    }
}

impl EmbeddingClient for StubEmbedder {
    fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(AIError::EmbeddingUnavailable("stub is offline".to_string()).into());
        }

        let mut vector = vec![0.0f32; STUB_DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }
}

/// LLM client that replays scripted replies and records every request.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    streams: Mutex<VecDeque<Vec<AppResult<String>>>>,
    requests: Mutex<Vec<Vec<Message>>>,
    pulled: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn unavailable(self) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(AIError::LlmUnavailable("connection refused".to_string()).into()));
        self
    }

    pub fn stream(self, lines: Vec<AppResult<String>>) -> Self {
        self.streams.lock().unwrap().push_back(lines);
        self
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of stream lines handed to the consumer so far.
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

impl LlmClient for ScriptedLlm {
    fn complete(&self, messages: &[Message]) -> AppResult<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AIError::InvalidResponse("no scripted reply".to_string()).into()))
    }

    fn complete_stream(&self, messages: &[Message]) -> AppResult<ChunkStream<'_>> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let lines = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AIError::LlmUnavailable("no scripted stream".to_string()))?;

        let pulled = &self.pulled;
        Ok(Box::new(lines.into_iter().inspect(move |_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        })))
    }
}

/// One streamed chunk line for the given assistant text.
pub fn chunk_line(content: &str, done: bool) -> AppResult<String> {
    Ok(serde_json::json!({
        "message": {"role": "assistant", "content": content},
        "done": done
    })
    .to_string())
}
