//! Entry CRUD operations.
//!
//! This module provides functions for creating, reading, updating, and querying
//! journal entries in the database. Tags are normalized here, at write time,
//! so that query-time tag matching can stay an exact comparison.

use crate::db::embeddings::{decode_vector, delete_embedding, StoredEmbedding};
use crate::errors::{AppError, AppResult, DatabaseError};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

/// Represents a journal entry in the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Embedding loaded with the entry, with the hash of the text it was computed from.
    #[serde(skip)]
    pub embedding: Option<StoredEmbedding>,
}

impl Entry {
    /// Text that gets embedded for this entry.
    pub fn embedding_text(&self) -> String {
        embedding_text(&self.title, &self.content)
    }

    /// Hash identifying the text the embedding must be computed from.
    pub fn content_hash(&self) -> String {
        content_hash(&self.title, &self.content)
    }

    /// The loaded embedding, if it was computed from the entry's current title and content.
    pub fn current_embedding(&self) -> Option<&[f32]> {
        self.embedding
            .as_ref()
            .filter(|stored| stored.content_hash == self.content_hash())
            .map(|stored| stored.vector.as_slice())
    }
}

/// Fields for a new entry.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Creation time; defaults to now. Set explicitly when importing older entries.
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update of an entry. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Builds the text sent to the embedding model.
pub fn embedding_text(title: &str, content: &str) -> String {
    if title.is_empty() {
        content.to_string()
    } else {
        format!("{}\n\n{}", title, content)
    }
}

/// blake3 hex digest of the embedding text.
pub fn content_hash(title: &str, content: &str) -> String {
    blake3::hash(embedding_text(title, content).as_bytes())
        .to_hex()
        .to_string()
}

/// Normalizes tags: trims, lower-cases, drops empties, deduplicates.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Formats a timestamp the way it is stored, so stored values sort lexically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

const SELECT_ENTRY: &str = r#"
    SELECT e.id, e.title, e.content, e.tags, e.created_at, e.updated_at,
           emb.embedding, emb.content_hash
    FROM entries e
    LEFT JOIN embeddings emb ON emb.entry_id = e.id
"#;

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let tags_json: String = row.get(3)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let mut entry = Entry {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        tags: tags.into_iter().collect(),
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
        updated_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
        embedding: None,
    };

    let blob: Option<Vec<u8>> = row.get(6)?;
    let stored_hash: Option<String> = row.get(7)?;
    if let (Some(blob), Some(hash)) = (blob, stored_hash) {
        if hash == entry.content_hash() {
            entry.embedding = decode_vector(&blob).map(|vector| StoredEmbedding {
                vector,
                content_hash: hash,
            });
        }
    }

    Ok(entry)
}

fn tags_to_json(tags: &BTreeSet<String>) -> AppResult<String> {
    serde_json::to_string(tags)
        .map_err(|e| DatabaseError::Custom(format!("Failed to serialize tags: {}", e)).into())
}

/// Creates a new entry with a freshly generated id.
///
/// # Errors
///
/// Returns a database error if the insert fails. Untitled entries are allowed.
pub fn create_entry(conn: &Connection, new_entry: &NewEntry) -> AppResult<Entry> {
    let title = new_entry.title.trim();

    let now = Utc::now().trunc_subsecs(6);
    let entry = Entry {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        content: new_entry.content.clone(),
        tags: normalize_tags(&new_entry.tags),
        created_at: new_entry.created_at.map_or(now, |ts| ts.trunc_subsecs(6)),
        updated_at: now,
        embedding: None,
    };

    debug!("Creating entry {} with {} tags", entry.id, entry.tags.len());

    conn.execute(
        r#"
        INSERT INTO entries (id, title, content, tags, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            entry.id,
            entry.title,
            entry.content,
            tags_to_json(&entry.tags)?,
            format_timestamp(&entry.created_at),
            format_timestamp(&entry.updated_at),
        ],
    )
    .map_err(DatabaseError::Sqlite)?;

    Ok(entry)
}

/// Retrieves an entry by id.
///
/// # Errors
///
/// Returns `AppError::NotFound` if no entry has this id.
pub fn get_entry(conn: &Connection, id: &str) -> AppResult<Entry> {
    find_entry(conn, id)?.ok_or_else(|| AppError::NotFound(format!("Entry with id {}", id)))
}

/// Retrieves an entry by id, returning `Ok(None)` if it does not exist.
pub fn find_entry(conn: &Connection, id: &str) -> AppResult<Option<Entry>> {
    debug!("Getting entry {}", id);

    conn.query_row(
        &format!("{} WHERE e.id = ?1", SELECT_ENTRY),
        params![id],
        entry_from_row,
    )
    .optional()
    .map_err(|e| DatabaseError::Sqlite(e).into())
}

/// Applies a partial update and returns the updated entry.
///
/// When the title or content changes, the cached embedding row is dropped in
/// the same transaction so no reader can pair the new text with the old vector.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown id, or a database error.
pub fn update_entry(conn: &Connection, id: &str, update: &EntryUpdate) -> AppResult<Entry> {
    let tx = conn
        .unchecked_transaction()
        .map_err(DatabaseError::Sqlite)?;

    let mut entry = get_entry(&tx, id)?;
    let previous_hash = entry.content_hash();

    if let Some(title) = &update.title {
        entry.title = title.trim().to_string();
    }
    if let Some(content) = &update.content {
        entry.content = content.clone();
    }
    if let Some(tags) = &update.tags {
        entry.tags = normalize_tags(tags);
    }
    entry.updated_at = Utc::now().trunc_subsecs(6);

    tx.execute(
        r#"
        UPDATE entries
        SET title = ?2, content = ?3, tags = ?4, updated_at = ?5
        WHERE id = ?1
        "#,
        params![
            entry.id,
            entry.title,
            entry.content,
            tags_to_json(&entry.tags)?,
            format_timestamp(&entry.updated_at),
        ],
    )
    .map_err(DatabaseError::Sqlite)?;

    if entry.content_hash() != previous_hash {
        debug!("Text of entry {} changed, dropping cached embedding", id);
        delete_embedding(&tx, id)?;
        entry.embedding = None;
    }

    tx.commit().map_err(DatabaseError::Sqlite)?;
    Ok(entry)
}

/// Deletes an entry along with its embedding and favorites.
///
/// # Errors
///
/// Returns `AppError::NotFound` if no entry has this id.
pub fn delete_entry(conn: &Connection, id: &str) -> AppResult<()> {
    debug!("Deleting entry {}", id);

    let rows = conn
        .execute("DELETE FROM entries WHERE id = ?1", params![id])
        .map_err(DatabaseError::Sqlite)?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Entry with id {}", id)));
    }
    Ok(())
}

/// Returns whether an entry with this id exists.
pub fn entry_exists(conn: &Connection, id: &str) -> AppResult<bool> {
    let found: Option<i32> = conn
        .query_row("SELECT 1 FROM entries WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()
        .map_err(DatabaseError::Sqlite)?;
    Ok(found.is_some())
}

/// Lists entries created within `[from, to]`, most recent first.
///
/// Either bound may be omitted. Ties on `created_at` are ordered by id so the
/// listing is deterministic.
pub fn list_entries(
    conn: &Connection,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> AppResult<Vec<Entry>> {
    debug!("Listing entries between {:?} and {:?}", from, to);

    let from = from.map(|ts| format_timestamp(&ts));
    let to = to.map(|ts| format_timestamp(&ts));

    let mut stmt = conn
        .prepare(&format!(
            r#"{}
            WHERE (?1 IS NULL OR e.created_at >= ?1)
              AND (?2 IS NULL OR e.created_at <= ?2)
            ORDER BY e.created_at DESC, e.id ASC
            "#,
            SELECT_ENTRY
        ))
        .map_err(DatabaseError::Sqlite)?;

    let entries = stmt
        .query_map(params![from, to], entry_from_row)
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;

    Ok(entries)
}
