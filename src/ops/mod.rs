//! High-level operations for journaling with search and AI summaries.
//!
//! This module holds the services that sit between the database and the
//! model runtime, and the [`Journal`] facade that wires them together and
//! exposes the operations front ends call.

pub mod favorites;
pub mod index;
pub mod prompt_types;
pub mod reindex;
pub mod search;
pub mod summarize;

#[cfg(test)]
pub(crate) mod test_support;

pub use favorites::FavoriteSummaryStore;
pub use index::{cosine_similarity, EmbeddingIndex};
pub use prompt_types::PromptTypeRegistry;
pub use reindex::{reindex_entries, ReindexReport};
pub use search::{HybridSearchEngine, SearchHit, SearchMode, SearchQuery, SearchResults};
pub use summarize::{SummarizationService, SummaryQuality, SummaryResult};

use crate::ai::{EmbeddingClient, LlmClient};
use crate::db::entries::{self, Entry, EntryUpdate, NewEntry};
use crate::db::favorites::FavoriteSummary;
use crate::db::prompt_types::PromptType;
use crate::db::{settings, Database};
use crate::errors::AppResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The journal core: entries, search, summaries, and favorites over one database.
pub struct Journal {
    db: Database,
    index: Arc<EmbeddingIndex>,
    search: HybridSearchEngine,
    prompt_types: PromptTypeRegistry,
    summarizer: SummarizationService,
    favorites: FavoriteSummaryStore,
}

impl Journal {
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingClient>, llm: Arc<dyn LlmClient>) -> Self {
        let index = Arc::new(EmbeddingIndex::new(db.clone(), embedder));
        let prompt_types = PromptTypeRegistry::new(db.clone());

        Self {
            search: HybridSearchEngine::new(db.clone(), Arc::clone(&index)),
            summarizer: SummarizationService::new(db.clone(), prompt_types.clone(), llm),
            favorites: FavoriteSummaryStore::new(db.clone()),
            prompt_types,
            index,
            db,
        }
    }

    pub fn create_entry(&self, new_entry: &NewEntry) -> AppResult<Entry> {
        let conn = self.db.get_conn()?;
        let entry = entries::create_entry(&conn, new_entry)?;
        info!("Created entry {}", entry.id);
        Ok(entry)
    }

    pub fn update_entry(&self, id: &str, update: &EntryUpdate) -> AppResult<Entry> {
        let conn = self.db.get_conn()?;
        let entry = entries::update_entry(&conn, id, update)?;
        if entry.current_embedding().is_none() {
            self.index.invalidate(id);
        }
        info!("Updated entry {}", id);
        Ok(entry)
    }

    pub fn get_entry(&self, id: &str) -> AppResult<Entry> {
        let conn = self.db.get_conn()?;
        entries::get_entry(&conn, id)
    }

    /// Deletes an entry together with its embedding and favorites.
    pub fn delete_entry(&self, id: &str) -> AppResult<()> {
        let conn = self.db.get_conn()?;
        entries::delete_entry(&conn, id)?;
        self.index.invalidate(id);
        info!("Deleted entry {}", id);
        Ok(())
    }

    pub fn search(&self, query: &SearchQuery, config_id: &str) -> AppResult<SearchResults> {
        self.search.search(query, config_id)
    }

    pub fn summarize(
        &self,
        entry_id: &str,
        prompt_type_id: &str,
        config_id: &str,
    ) -> AppResult<SummaryResult> {
        self.summarizer.summarize(entry_id, prompt_type_id, config_id)
    }

    /// Streams a summary, see [`SummarizationService::summarize_stream`].
    pub fn summarize_stream<F>(
        &self,
        entry_id: &str,
        prompt_type_id: &str,
        config_id: &str,
        cancel: &CancellationToken,
        on_delta: F,
    ) -> AppResult<SummaryResult>
    where
        F: FnMut(&str),
    {
        self.summarizer
            .summarize_stream(entry_id, prompt_type_id, config_id, cancel, on_delta)
    }

    pub fn save_favorite(
        &self,
        entry_id: &str,
        prompt_type_id: &str,
        result: &SummaryResult,
    ) -> AppResult<FavoriteSummary> {
        self.favorites.save(entry_id, prompt_type_id, result)
    }

    pub fn list_favorites(&self, entry_id: &str) -> AppResult<Vec<FavoriteSummary>> {
        self.favorites.list(entry_id)
    }

    pub fn ensure_default_prompt_types(&self, config_id: &str) -> AppResult<()> {
        self.prompt_types.ensure_defaults(config_id)
    }

    pub fn prompt_types(&self) -> &PromptTypeRegistry {
        &self.prompt_types
    }

    pub fn save_prompt_type(&self, prompt_type: &PromptType) -> AppResult<()> {
        self.prompt_types.save(prompt_type)
    }

    pub fn favorites(&self) -> &FavoriteSummaryStore {
        &self.favorites
    }

    pub fn min_similarity(&self, config_id: &str) -> AppResult<f32> {
        let conn = self.db.get_conn()?;
        settings::get_min_similarity(&conn, config_id)
    }

    pub fn set_min_similarity(&self, config_id: &str, value: f32) -> AppResult<()> {
        crate::config::validate_config_id(config_id)?;
        let conn = self.db.get_conn()?;
        settings::set_min_similarity(&conn, config_id, value)?;
        info!("Set min_similarity for scope {} to {}", config_id, value);
        Ok(())
    }

    pub fn reindex(&self, force: bool) -> AppResult<ReindexReport> {
        reindex_entries(&self.db, &self.index, force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::{test_db, ScriptedLlm, StubEmbedder};

    fn journal() -> (tempfile::TempDir, Journal) {
        let (dir, db) = test_db();
        let journal = Journal::new(
            db,
            Arc::new(StubEmbedder::new()),
            Arc::new(ScriptedLlm::new().reply(
                r#"{"summary": "Short.", "key_topics": ["x"], "mood": "ok"}"#,
            )),
        );
        journal.ensure_default_prompt_types("default").unwrap();
        (dir, journal)
    }

    #[test]
    fn test_summarize_then_favorite() {
        let (_dir, journal) = journal();
        let entry = journal
            .create_entry(&NewEntry {
                title: "Day".to_string(),
                content: "Long day".to_string(),
                ..Default::default()
            })
            .unwrap();

        let result = journal.summarize(&entry.id, "default", "default").unwrap();
        journal.save_favorite(&entry.id, "default", &result).unwrap();

        let favorites = journal.list_favorites(&entry.id).unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].summary, "Short.");
    }

    #[test]
    fn test_threshold_round_trip() {
        let (_dir, journal) = journal();
        assert_eq!(journal.min_similarity("default").unwrap(), 0.5);
        journal.set_min_similarity("default", 0.25).unwrap();
        assert!((journal.min_similarity("default").unwrap() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_delete_entry_removes_favorites() {
        let (_dir, journal) = journal();
        let entry = journal
            .create_entry(&NewEntry {
                title: "Gone".to_string(),
                content: "soon".to_string(),
                ..Default::default()
            })
            .unwrap();

        journal.delete_entry(&entry.id).unwrap();

        assert!(journal.get_entry(&entry.id).unwrap_err().is_not_found());
        assert!(journal.list_favorites(&entry.id).unwrap_err().is_not_found());
    }
}
