//! Embedding index over journal entries.
//!
//! Vectors are derived data: each one is stored with the hash of the text it
//! was computed from and is only trusted while that hash still matches the
//! entry. A process-local cache sits in front of the `embeddings` table so
//! repeated searches do not hit SQLite for every candidate.

use crate::ai::EmbeddingClient;
use crate::db::embeddings::{get_embedding, store_embedding};
use crate::db::entries::Entry;
use crate::db::Database;
use crate::errors::AppResult;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedVector {
    content_hash: String,
    vector: Arc<Vec<f32>>,
}

/// Computes, caches, and compares entry embeddings.
pub struct EmbeddingIndex {
    db: Database,
    client: Arc<dyn EmbeddingClient>,
    cache: RwLock<HashMap<String, CachedVector>>,
}

impl EmbeddingIndex {
    pub fn new(db: Database, client: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            db,
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the embedding for an entry, computing it if absent or stale.
    ///
    /// Lookup order is the in-memory cache, then the vector loaded with the
    /// entry (if its hash still matches), then the `embeddings` table. Only when none of them matches the
    /// entry's current content hash is the embedding client called.
    ///
    /// # Errors
    ///
    /// Returns `AIError::EmbeddingUnavailable` if the vector has to be
    /// computed and the client cannot be reached.
    pub fn vector_for(&self, entry: &Entry) -> AppResult<Arc<Vec<f32>>> {
        let hash = entry.content_hash();

        if let Some(vector) = self.cached(&entry.id, &hash) {
            return Ok(vector);
        }

        if let Some(vector) = entry.current_embedding() {
            return Ok(self.remember(&entry.id, &hash, vector.to_vec()));
        }

        let conn = self.db.get_conn()?;
        if let Some(stored) = get_embedding(&conn, &entry.id)? {
            if stored.content_hash == hash {
                return Ok(self.remember(&entry.id, &hash, stored.vector));
            }
        }
        drop(conn);

        self.compute(entry, hash)
    }

    /// Recomputes and stores the embedding for an entry regardless of any cached value.
    pub fn refresh(&self, entry: &Entry) -> AppResult<Arc<Vec<f32>>> {
        self.compute(entry, entry.content_hash())
    }

    /// Embeds free text such as a search query. Nothing is cached.
    pub fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        self.client.embed(text)
    }

    /// Drops the cached vector for an entry.
    pub fn invalidate(&self, entry_id: &str) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entry_id);
    }

    /// Number of vectors held in memory.
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Cosine similarity between two vectors, see [`cosine_similarity`].
    pub fn similarity(&self, query: &[f32], candidate: &[f32]) -> f32 {
        cosine_similarity(query, candidate)
    }

    /// Scores every candidate against `query` and orders them best first.
    ///
    /// Ties are broken by most recent `created_at`, then by id.
    ///
    /// # Errors
    ///
    /// Fails as soon as any candidate's vector cannot be obtained; the caller
    /// is expected to fall back to a non-semantic ordering.
    pub fn rank(&self, query: &[f32], candidates: Vec<Entry>) -> AppResult<Vec<(Entry, f32)>> {
        debug!("Ranking {} candidates", candidates.len());

        let mut scored = Vec::with_capacity(candidates.len());
        for entry in candidates {
            let vector = self.vector_for(&entry)?;
            let score = cosine_similarity(query, &vector);
            scored.push((entry, score));
        }

        sort_ranked(&mut scored);
        Ok(scored)
    }

    fn cached(&self, entry_id: &str, hash: &str) -> Option<Arc<Vec<f32>>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache
            .get(entry_id)
            .filter(|cached| cached.content_hash == hash)
            .map(|cached| Arc::clone(&cached.vector))
    }

    fn remember(&self, entry_id: &str, hash: &str, vector: Vec<f32>) -> Arc<Vec<f32>> {
        let vector = Arc::new(vector);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                entry_id.to_string(),
                CachedVector {
                    content_hash: hash.to_string(),
                    vector: Arc::clone(&vector),
                },
            );
        vector
    }

    // The lock is not held while the client runs. Two requests may compute
    // the same vector; the later write wins and both are identical.
    fn compute(&self, entry: &Entry, hash: String) -> AppResult<Arc<Vec<f32>>> {
        debug!("Computing embedding for entry {}", entry.id);
        let vector = self.client.embed(&entry.embedding_text())?;

        let conn = self.db.get_conn()?;
        store_embedding(&conn, &entry.id, &vector, &hash)?;

        Ok(self.remember(&entry.id, &hash, vector))
    }
}

/// Cosine similarity in `[-1, 1]`.
///
/// Returns 0.0 when the vectors differ in length or either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Orders scored entries by descending score, newest first on ties, then by id.
pub fn sort_ranked(scored: &mut [(Entry, f32)]) {
    scored.sort_by(|(a, score_a), (b, score_b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
