//! Saved favorite summaries.

use crate::db::entries::entry_exists;
use crate::db::favorites::{insert_favorite, list_favorites, FavoriteSummary};
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::ops::summarize::SummaryResult;
use tracing::info;

/// Persists summaries the user chose to keep.
#[derive(Clone)]
pub struct FavoriteSummaryStore {
    db: Database,
}

impl FavoriteSummaryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Appends a favorite. Saving the same entry and prompt type again adds another row.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `result` belongs to a different entry
    /// or prompt type, and `AppError::NotFound` if the entry does not exist.
    pub fn save(
        &self,
        entry_id: &str,
        prompt_type_id: &str,
        result: &SummaryResult,
    ) -> AppResult<FavoriteSummary> {
        if result.entry_id != entry_id {
            return Err(AppError::Validation(format!(
                "summary belongs to entry {}, not {}",
                result.entry_id, entry_id
            )));
        }
        if result.prompt_type != prompt_type_id {
            return Err(AppError::Validation(format!(
                "summary was generated with prompt type {}, not {}",
                result.prompt_type, prompt_type_id
            )));
        }

        let conn = self.db.get_conn()?;
        if !entry_exists(&conn, entry_id)? {
            return Err(AppError::NotFound(format!("entry {}", entry_id)));
        }

        let favorite = insert_favorite(
            &conn,
            entry_id,
            prompt_type_id,
            &result.summary,
            &result.key_topics,
            &result.mood,
            result.quality,
        )?;
        info!(
            "Saved favorite {} for entry {} ({})",
            favorite.id, entry_id, prompt_type_id
        );
        Ok(favorite)
    }

    /// Lists an entry's favorites, oldest first.
    pub fn list(&self, entry_id: &str) -> AppResult<Vec<FavoriteSummary>> {
        let conn = self.db.get_conn()?;
        if !entry_exists(&conn, entry_id)? {
            return Err(AppError::NotFound(format!("entry {}", entry_id)));
        }
        list_favorites(&conn, entry_id)
    }
}
