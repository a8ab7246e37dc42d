//! Vector embedding storage.
//!
//! Each entry has at most one cached embedding, stored next to the blake3 hash
//! of the text it was computed from. Readers compare that hash against the
//! entry's current text; a mismatch means the vector is stale and must not be
//! used for ranking.

use crate::db::entries::format_timestamp;
use crate::errors::{AppError, AppResult, DatabaseError};
use bytemuck::{cast_slice, cast_slice_mut};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// A stored embedding and the hash of the text it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    pub vector: Vec<f32>,
    pub content_hash: String,
}

/// Converts a vector to its BLOB representation.
pub fn encode_vector(vector: &[f32]) -> &[u8] {
    cast_slice::<f32, u8>(vector)
}

/// Converts a BLOB back into a vector.
///
/// Returns `None` if the byte length is not a whole number of `f32`s.
pub fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % std::mem::size_of::<f32>() != 0 {
        return None;
    }

    // Copy into an f32 buffer so the source alignment does not matter
    let mut values = vec![0.0f32; bytes.len() / std::mem::size_of::<f32>()];
    cast_slice_mut::<f32, u8>(&mut values).copy_from_slice(bytes);
    Some(values)
}

/// Inserts or replaces the embedding for an entry.
///
/// Concurrent writers for the same entry are resolved last-write-wins; both
/// computed the vector from the same text, so either result is correct.
///
/// # Errors
///
/// Returns an error if the vector is empty or the database operation fails.
pub fn store_embedding(
    conn: &Connection,
    entry_id: &str,
    vector: &[f32],
    content_hash: &str,
) -> AppResult<()> {
    if vector.is_empty() {
        return Err(AppError::Validation(
            "Refusing to store an empty embedding".to_string(),
        ));
    }

    debug!(
        "Storing {}-dimensional embedding for entry {}",
        vector.len(),
        entry_id
    );

    conn.execute(
        r#"
        INSERT INTO embeddings (entry_id, embedding, dimensions, content_hash, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(entry_id) DO UPDATE SET
            embedding = excluded.embedding,
            dimensions = excluded.dimensions,
            content_hash = excluded.content_hash,
            created_at = excluded.created_at
        "#,
        params![
            entry_id,
            encode_vector(vector),
            vector.len() as i64,
            content_hash,
            format_timestamp(&Utc::now()),
        ],
    )
    .map_err(DatabaseError::Sqlite)?;

    Ok(())
}

/// Retrieves the stored embedding for an entry, if any.
///
/// The caller decides whether the returned hash still matches.
pub fn get_embedding(conn: &Connection, entry_id: &str) -> AppResult<Option<StoredEmbedding>> {
    let row: Option<(Vec<u8>, String)> = conn
        .query_row(
            "SELECT embedding, content_hash FROM embeddings WHERE entry_id = ?1",
            params![entry_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(DatabaseError::Sqlite)?;

    match row {
        Some((bytes, content_hash)) => {
            let vector = decode_vector(&bytes).ok_or_else(|| {
                DatabaseError::Custom(format!(
                    "Corrupt embedding for entry {}: {} bytes",
                    entry_id,
                    bytes.len()
                ))
            })?;
            Ok(Some(StoredEmbedding {
                vector,
                content_hash,
            }))
        }
        None => Ok(None),
    }
}

/// Removes the cached embedding for an entry. Missing rows are not an error.
pub fn delete_embedding(conn: &Connection, entry_id: &str) -> AppResult<()> {
    debug!("Deleting embedding for entry {}", entry_id);
    conn.execute(
        "DELETE FROM embeddings WHERE entry_id = ?1",
        params![entry_id],
    )
    .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Gets the total number of stored embeddings.
pub fn count_embeddings(conn: &Connection) -> AppResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))
        .map_err(DatabaseError::Sqlite)?;
    Ok(count as usize)
}
