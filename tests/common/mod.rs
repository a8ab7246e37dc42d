//! Shared fixtures for integration tests.
#![allow(dead_code)]

use quill::ai::{ChunkStream, EmbeddingClient, LlmClient, Message};
use quill::db::entries::{Entry, NewEntry};
use quill::errors::{AIError, AppResult};
use quill::{Database, Journal};
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const DIMENSIONS: usize = 256;

/// Deterministic bag-of-words embedder. Words mapped to a concept share a bucket.
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
}

impl EmbeddingClient for StubEmbedder {
    fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(AIError::EmbeddingUnavailable("connection refused".to_string()).into());
        }

        let mut vector = vec![0.0f32; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let key = self.concepts.get(&token).cloned().unwrap_or(token);
            let hash = blake3::hash(key.as_bytes());
            let bucket = hash.as_bytes()[..8]
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            vector[(bucket % DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(vector)
    }
}

/// LLM that replays scripted replies and stream lines.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    streams: Mutex<VecDeque<Vec<String>>>,
    requests: AtomicUsize,
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
            .push_back(Err(AIError::LlmUnavailable("timed out".to_string()).into()));
        self
    }

    pub fn stream(self, lines: &[&str]) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl LlmClient for ScriptedLlm {
    fn complete(&self, _messages: &[Message]) -> AppResult<String> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AIError::InvalidResponse("no scripted reply".to_string()).into()))
    }

    fn complete_stream(&self, _messages: &[Message]) -> AppResult<ChunkStream<'_>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let lines = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AIError::LlmUnavailable("no scripted stream".to_string()))?;
        Ok(Box::new(lines.into_iter().map(Ok)))
    }
}

pub struct TestJournal {
    pub _dir: TempDir,
    pub db: Database,
    pub journal: Journal,
    pub embedder: Arc<StubEmbedder>,
    pub llm: Arc<ScriptedLlm>,
}

pub fn journal_with(embedder: StubEmbedder, llm: ScriptedLlm) -> TestJournal {
    let dir = TempDir::new().expect("create temp dir");
    let db = Database::open(&dir.path().join("journal.db")).expect("open database");
    db.initialize_schema().expect("initialize schema");

    let embedder = Arc::new(embedder);
    let llm = Arc::new(llm);
    let journal = Journal::new(db.clone(), embedder.clone(), llm.clone());
    journal
        .ensure_default_prompt_types("default")
        .expect("seed prompt types");

    TestJournal {
        _dir: dir,
        db,
        journal,
        embedder,
        llm,
    }
}

pub fn outdoor_embedder() -> StubEmbedder {
    StubEmbedder::new().with_concept(
        "outdoors",
        &["hiking", "hike", "mountains", "outdoor", "activities", "trail", "camping"],
    )
}

pub fn add_entry(journal: &Journal, title: &str, content: &str, tags: &[&str], ymd: (i32, u32, u32)) -> Entry {
    journal
        .create_entry(&NewEntry {
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Some(Utc.with_ymd_and_hms(ymd.0, ymd.1, ymd.2, 10, 0, 0).unwrap()),
        })
        .expect("create entry")
}
