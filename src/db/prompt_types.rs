//! Prompt type rows.
//!
//! Prompt types are keyed by `(id, config_id)`. The `position` column keeps
//! listing order stable: seeded types occupy the low positions and custom
//! types are appended after everything already present in the scope.

use crate::errors::{AppResult, DatabaseError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

/// A named summarization prompt template within a configuration scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptType {
    pub id: String,
    pub config_id: String,
    pub name: String,
    pub prompt: String,
}

fn prompt_type_from_row(row: &Row<'_>) -> rusqlite::Result<PromptType> {
    Ok(PromptType {
        id: row.get(0)?,
        config_id: row.get(1)?,
        name: row.get(2)?,
        prompt: row.get(3)?,
    })
}

/// Inserts a prompt type unless a row with the same key already exists.
///
/// Returns `true` if a row was inserted. An existing row is left untouched,
/// including any customized prompt text.
pub fn insert_if_missing(conn: &Connection, prompt_type: &PromptType, position: i64) -> AppResult<bool> {
    let rows = conn
        .execute(
            r#"
            INSERT OR IGNORE INTO prompt_types (id, config_id, name, prompt, position)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                prompt_type.id,
                prompt_type.config_id,
                prompt_type.name,
                prompt_type.prompt,
                position
            ],
        )
        .map_err(DatabaseError::Sqlite)?;
    Ok(rows == 1)
}

/// Inserts a prompt type or overwrites its name, text, and position.
pub fn overwrite(conn: &Connection, prompt_type: &PromptType, position: i64) -> AppResult<()> {
    debug!(
        "Overwriting prompt type {} in scope {}",
        prompt_type.id, prompt_type.config_id
    );
    conn.execute(
        r#"
        INSERT INTO prompt_types (id, config_id, name, prompt, position)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id, config_id) DO UPDATE SET
            name = excluded.name,
            prompt = excluded.prompt,
            position = excluded.position
        "#,
        params![
            prompt_type.id,
            prompt_type.config_id,
            prompt_type.name,
            prompt_type.prompt,
            position
        ],
    )
    .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Creates or updates a prompt type, keeping the position of an existing row.
///
/// New rows are placed after every row already in the scope, but never before
/// `min_position`, so custom types always list after the seeded ones.
pub fn upsert(conn: &Connection, prompt_type: &PromptType, min_position: i64) -> AppResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(DatabaseError::Sqlite)?;

    let updated = tx
        .execute(
            "UPDATE prompt_types SET name = ?3, prompt = ?4 WHERE id = ?1 AND config_id = ?2",
            params![
                prompt_type.id,
                prompt_type.config_id,
                prompt_type.name,
                prompt_type.prompt
            ],
        )
        .map_err(DatabaseError::Sqlite)?;

    if updated == 0 {
        let max_position: Option<i64> = tx
            .query_row(
                "SELECT MAX(position) FROM prompt_types WHERE config_id = ?1",
                params![prompt_type.config_id],
                |row| row.get(0),
            )
            .map_err(DatabaseError::Sqlite)?;
        let position = max_position.map_or(0, |p| p + 1).max(min_position);
        debug!(
            "Adding prompt type {} to scope {} at position {}",
            prompt_type.id, prompt_type.config_id, position
        );
        insert_if_missing(&tx, prompt_type, position)?;
    }

    tx.commit().map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Retrieves a prompt type by key.
pub fn get_prompt_type(
    conn: &Connection,
    config_id: &str,
    id: &str,
) -> AppResult<Option<PromptType>> {
    conn.query_row(
        r#"
        SELECT id, config_id, name, prompt
        FROM prompt_types
        WHERE config_id = ?1 AND id = ?2
        "#,
        params![config_id, id],
        prompt_type_from_row,
    )
    .optional()
    .map_err(|e| DatabaseError::Sqlite(e).into())
}

/// Lists the prompt types of a scope in position order.
pub fn list_prompt_types(conn: &Connection, config_id: &str) -> AppResult<Vec<PromptType>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT id, config_id, name, prompt
            FROM prompt_types
            WHERE config_id = ?1
            ORDER BY position ASC, rowid ASC
            "#,
        )
        .map_err(DatabaseError::Sqlite)?;

    let rows = stmt
        .query_map(params![config_id], prompt_type_from_row)
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;

    Ok(rows)
}
