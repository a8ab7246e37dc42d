//! Reindex operation for regenerating embeddings.
//!
//! This module eagerly computes embeddings for entries whose stored vector is
//! missing or no longer matches their text, or for every entry after a change
//! of embedding model.

use crate::db::entries::list_entries;
use crate::db::Database;
use crate::errors::AppResult;
use crate::ops::index::EmbeddingIndex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Report of a completed reindex operation.
#[derive(Debug, Clone, Serialize)]
pub struct ReindexReport {
    /// Total number of entries examined
    pub total: usize,
    /// Entries whose embedding was computed
    pub refreshed: usize,
    /// Entries whose embedding was already current
    pub skipped: usize,
    /// Entries that could not be embedded
    pub failed: usize,
    /// Duration of reindex operation
    pub duration: Duration,
}

/// Regenerates embeddings for entries missing a current one.
///
/// With `force`, every entry is re-embedded.
///
/// # Errors
///
/// Does not fail on individual entry errors - counts them and continues.
/// Only fails if the entry listing cannot be read.
pub fn reindex_entries(
    db: &Database,
    index: &EmbeddingIndex,
    force: bool,
) -> AppResult<ReindexReport> {
    info!("Starting reindex operation (force: {})", force);
    let start_time = Instant::now();

    let entries = {
        let conn = db.get_conn()?;
        list_entries(&conn, None, None)?
    };

    let mut refreshed = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for entry in &entries {
        if !force && entry.current_embedding().is_some() {
            skipped += 1;
            continue;
        }

        match index.refresh(entry) {
            Ok(vector) => {
                refreshed += 1;
                debug!("Reindexed entry {} ({} dimensions)", entry.id, vector.len());
            }
            Err(e) => {
                failed += 1;
                warn!("Failed to reindex entry {}: {}", entry.id, e);
            }
        }
    }

    let duration = start_time.elapsed();
    info!(
        "Reindex complete: {} refreshed, {} skipped, {} failed of {} in {:?}",
        refreshed,
        skipped,
        failed,
        entries.len(),
        duration
    );

    Ok(ReindexReport {
        total: entries.len(),
        refreshed,
        skipped,
        failed,
        duration,
    })
}
