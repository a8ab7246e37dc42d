//! Favorite summary rows.
//!
//! Favorites are append-only: every save produces a new row, even when the
//! same entry and prompt type were saved before.

use crate::ai::SummaryQuality;
use crate::db::entries::format_timestamp;
use crate::errors::{AppResult, DatabaseError};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::debug;

/// A summary the user chose to keep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteSummary {
    pub id: i64,
    pub entry_id: String,
    pub prompt_type: String,
    pub summary: String,
    pub key_topics: Vec<String>,
    pub mood: String,
    /// Whether the saved summary was parsed or salvaged from unstructured output.
    pub quality: SummaryQuality,
    pub saved_at: DateTime<Utc>,
}

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<FavoriteSummary> {
    let topics_json: String = row.get(4)?;
    let key_topics: Vec<String> = serde_json::from_str(&topics_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let saved_raw: String = row.get(6)?;
    let saved_at = DateTime::parse_from_rfc3339(&saved_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let quality_raw: String = row.get(7)?;
    let quality = SummaryQuality::from_stored(&quality_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unknown summary quality '{}'", quality_raw).into(),
        )
    })?;

    Ok(FavoriteSummary {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        prompt_type: row.get(2)?,
        summary: row.get(3)?,
        key_topics,
        mood: row.get(5)?,
        quality,
        saved_at,
    })
}

/// Appends a favorite summary and returns the stored row.
///
/// # Errors
///
/// Returns an error if the entry does not exist (foreign key) or the insert fails.
pub fn insert_favorite(
    conn: &Connection,
    entry_id: &str,
    prompt_type: &str,
    summary: &str,
    key_topics: &[String],
    mood: &str,
    quality: SummaryQuality,
) -> AppResult<FavoriteSummary> {
    let saved_at = Utc::now().trunc_subsecs(6);
    let topics_json = serde_json::to_string(key_topics)
        .map_err(|e| DatabaseError::Custom(format!("Failed to serialize topics: {}", e)))?;

    conn.execute(
        r#"
        INSERT INTO favorite_summaries
            (entry_id, prompt_type, summary, key_topics, mood, quality, saved_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            entry_id,
            prompt_type,
            summary,
            topics_json,
            mood,
            quality.as_str(),
            format_timestamp(&saved_at)
        ],
    )
    .map_err(DatabaseError::Sqlite)?;

    let id = conn.last_insert_rowid();
    debug!("Favorite {} saved for entry {} ({})", id, entry_id, prompt_type);

    Ok(FavoriteSummary {
        id,
        entry_id: entry_id.to_string(),
        prompt_type: prompt_type.to_string(),
        summary: summary.to_string(),
        key_topics: key_topics.to_vec(),
        mood: mood.to_string(),
        quality,
        saved_at,
    })
}

/// Lists the favorites of an entry, oldest save first.
pub fn list_favorites(conn: &Connection, entry_id: &str) -> AppResult<Vec<FavoriteSummary>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT id, entry_id, prompt_type, summary, key_topics, mood, saved_at, quality
            FROM favorite_summaries
            WHERE entry_id = ?1
            ORDER BY saved_at ASC, id ASC
            "#,
        )
        .map_err(DatabaseError::Sqlite)?;

    let rows = stmt
        .query_map(params![entry_id], favorite_from_row)
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;

    Ok(rows)
}
