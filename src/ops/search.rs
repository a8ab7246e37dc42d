//! Hybrid search over journal entries.
//!
//! A search always starts from the same candidate set (date range plus tag
//! filter). The query then selects one of three orderings: none (filter-only,
//! newest first), lexical substring matching (newest first), or semantic
//! ranking by embedding similarity.

use crate::db::entries::{list_entries, Entry};
use crate::db::settings::get_min_similarity;
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::ops::index::EmbeddingIndex;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parameters of a search request.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub semantic: bool,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Entries must carry at least one of these tags. Empty means no constraint.
    pub tags: BTreeSet<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn semantic(mut self, semantic: bool) -> Self {
        self.semantic = semantic;
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> AppResult<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(AppError::Validation(format!(
                    "date_from ({}) is after date_to ({})",
                    from, to
                )));
            }
        }
        Ok(())
    }
}

/// How the results were ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Empty query: candidates only, newest first.
    FilterOnly,
    Lexical,
    Semantic,
    /// Semantic search was requested but embeddings were unavailable.
    LexicalFallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub entry: Entry,
    /// Similarity score, only present in semantic mode.
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub mode: SearchMode,
}

impl SearchResults {
    fn unscored(entries: Vec<Entry>, mode: SearchMode) -> Self {
        let hits = entries
            .into_iter()
            .map(|entry| SearchHit { entry, score: None })
            .collect();
        Self { hits, mode }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.hits.into_iter().map(|hit| hit.entry).collect()
    }
}

/// Combines metadata filters, lexical matching, and semantic ranking.
pub struct HybridSearchEngine {
    db: Database,
    index: Arc<EmbeddingIndex>,
}

impl HybridSearchEngine {
    pub fn new(db: Database, index: Arc<EmbeddingIndex>) -> Self {
        Self { db, index }
    }

    /// Runs a search in the given configuration scope.
    ///
    /// The scope supplies the `min_similarity` threshold for semantic mode.
    /// An unreachable embedding service never fails the search: results fall
    /// back to lexical matching and the mode says so.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `date_from` is after `date_to`, or a
    /// database error if the candidate set cannot be read.
    pub fn search(&self, request: &SearchQuery, config_id: &str) -> AppResult<SearchResults> {
        request.validate()?;
        // Whitespace-only means no query; otherwise the text is matched as given
        let query = request.query.as_str();
        let has_query = !query.trim().is_empty();
        info!(
            "Searching (semantic: {}, query: {} chars, tags: {})",
            request.semantic,
            query.len(),
            request.tags.len()
        );

        let (candidates, min_similarity) = {
            let conn = self.db.get_conn()?;
            let entries = list_entries(&conn, request.date_from, request.date_to)?;
            let threshold = if request.semantic && has_query {
                Some(get_min_similarity(&conn, config_id)?)
            } else {
                None
            };
            (filter_by_tags(entries, &request.tags), threshold)
        };
        debug!("{} candidates after metadata filters", candidates.len());

        if !has_query {
            return Ok(SearchResults::unscored(candidates, SearchMode::FilterOnly));
        }

        let Some(min_similarity) = min_similarity else {
            let matches = lexical_filter(candidates, query);
            return Ok(SearchResults::unscored(matches, SearchMode::Lexical));
        };

        if candidates.is_empty() {
            return Ok(SearchResults {
                hits: Vec::new(),
                mode: SearchMode::Semantic,
            });
        }

        match self.semantic_rank(query, candidates.clone(), min_similarity) {
            Ok(hits) => {
                info!("Semantic search returned {} hits", hits.len());
                Ok(SearchResults {
                    hits,
                    mode: SearchMode::Semantic,
                })
            }
            Err(AppError::AI(e)) => {
                warn!("Semantic ranking unavailable, falling back to lexical: {}", e);
                let matches = lexical_filter(candidates, query);
                Ok(SearchResults::unscored(matches, SearchMode::LexicalFallback))
            }
            Err(e) => Err(e),
        }
    }

    fn semantic_rank(
        &self,
        query: &str,
        candidates: Vec<Entry>,
        min_similarity: f32,
    ) -> AppResult<Vec<SearchHit>> {
        let query_vector = self.index.embed_query(query)?;
        let ranked = self.index.rank(&query_vector, candidates)?;

        Ok(ranked
            .into_iter()
            .filter(|(_, score)| *score >= min_similarity)
            .map(|(entry, score)| SearchHit {
                entry,
                score: Some(score),
            })
            .collect())
    }
}

/// Keeps entries that carry at least one requested tag. Matching is exact.
fn filter_by_tags(entries: Vec<Entry>, tags: &BTreeSet<String>) -> Vec<Entry> {
    if tags.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| !entry.tags.is_disjoint(tags))
        .collect()
}

/// Case-insensitive substring match on title or content. Input order is kept.
fn lexical_filter(entries: Vec<Entry>, query: &str) -> Vec<Entry> {
    let needle = query.to_lowercase();
    entries
        .into_iter()
        .filter(|entry| {
            entry.title.to_lowercase().contains(&needle)
                || entry.content.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entries::{create_entry, NewEntry};
    use crate::db::settings::set_min_similarity;
    use crate::ops::test_support::{test_db, StubEmbedder};
    use chrono::TimeZone;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Database,
        embedder: Arc<StubEmbedder>,
        engine: HybridSearchEngine,
    }

    fn fixture() -> Fixture {
        let (dir, db) = test_db();
        let embedder = Arc::new(
            StubEmbedder::new().with_concept("outdoors", &["hiking", "mountains", "outdoor", "activities"]),
        );
        let index = Arc::new(EmbeddingIndex::new(db.clone(), embedder.clone()));
        let engine = HybridSearchEngine::new(db.clone(), index);
        Fixture {
            _dir: dir,
            db,
            embedder,
            engine,
        }
    }

    fn add(db: &Database, content: &str, tags: &[&str], day: (i32, u32, u32)) -> Entry {
        create_entry(
            &db.get_conn().unwrap(),
            &NewEntry {
                title: String::new(),
                content: content.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                created_at: Some(Utc.with_ymd_and_hms(day.0, day.1, day.2, 12, 0, 0).unwrap()),
            },
        )
        .unwrap()
    }

    fn ids(results: &SearchResults) -> Vec<String> {
        results.hits.iter().map(|h| h.entry.id.clone()).collect()
    }

    #[test]
    fn test_empty_query_is_filter_only_newest_first() {
        let f = fixture();
        let a = add(&f.db, "one", &[], (2024, 1, 1));
        let b = add(&f.db, "two", &[], (2024, 1, 2));

        let results = f.engine.search(&SearchQuery::new("   ").semantic(true), "default").unwrap();

        assert_eq!(results.mode, SearchMode::FilterOnly);
        assert_eq!(ids(&results), vec![b.id, a.id]);
        assert_eq!(f.embedder.calls(), 0);
    }

    #[test]
    fn test_lexical_is_case_insensitive() {
        let f = fixture();
        let hit = add(&f.db, "I love my Work", &[], (2024, 1, 1));
        add(&f.db, "Lazy sunday", &[], (2024, 1, 2));

        let results = f.engine.search(&SearchQuery::new("work"), "default").unwrap();

        assert_eq!(results.mode, SearchMode::Lexical);
        assert_eq!(ids(&results), vec![hit.id]);
        assert!(results.hits[0].score.is_none());
    }

    #[test]
    fn test_lexical_keeps_surrounding_whitespace() {
        let f = fixture();
        let spaced = add(&f.db, "long work day", &[], (2024, 1, 1));
        add(&f.db, "workday blues", &[], (2024, 1, 2));

        let results = f.engine.search(&SearchQuery::new("work "), "default").unwrap();

        assert_eq!(results.mode, SearchMode::Lexical);
        assert_eq!(ids(&results), vec![spaced.id]);
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let f = fixture();
        let tagged = add(&f.db, "standup", &["work"], (2024, 1, 1));
        add(&f.db, "standup", &["home"], (2024, 1, 2));

        let exact = f
            .engine
            .search(&SearchQuery::new("").with_tags(["work"]), "default")
            .unwrap();
        assert_eq!(ids(&exact), vec![tagged.id]);

        let wrong_case = f
            .engine
            .search(&SearchQuery::new("").with_tags(["Work"]), "default")
            .unwrap();
        assert!(wrong_case.is_empty());
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let f = fixture();
        let from = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let err = f
            .engine
            .search(&SearchQuery::new("x").between(Some(from), Some(to)), "default")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_semantic_on_empty_corpus() {
        let f = fixture();
        let results = f
            .engine
            .search(&SearchQuery::new("anything").semantic(true), "default")
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(results.mode, SearchMode::Semantic);
    }

    #[test]
    fn test_semantic_respects_threshold() {
        let f = fixture();
        let hike = add(&f.db, "Went hiking in the mountains, felt peaceful.", &["nature"], (2024, 6, 1));
        add(&f.db, "Filed quarterly taxes", &[], (2024, 6, 2));
        set_min_similarity(&f.db.get_conn().unwrap(), "default", 0.3).unwrap();

        let results = f
            .engine
            .search(&SearchQuery::new("outdoor activities").semantic(true), "default")
            .unwrap();

        assert_eq!(results.mode, SearchMode::Semantic);
        assert_eq!(ids(&results), vec![hike.id]);
        assert!(results.hits.iter().all(|h| h.score.unwrap() >= 0.3));
    }

    #[test]
    fn test_semantic_falls_back_when_offline() {
        let f = fixture();
        let hit = add(&f.db, "Went hiking", &[], (2024, 6, 1));
        f.embedder.set_offline(true);

        let results = f
            .engine
            .search(&SearchQuery::new("HIKING").semantic(true), "default")
            .unwrap();

        assert_eq!(results.mode, SearchMode::LexicalFallback);
        assert_eq!(ids(&results), vec![hit.id]);
    }
}
