//! Database schema definitions, initialization, and migrations.
//!
//! This module defines the SQLite schema for journal entries, cached
//! embeddings, prompt types, favorite summaries, and configuration scopes.
//! `create_tables` lays down the base (version 1) schema; `migrate` walks an
//! existing database forward without losing rows.

use crate::errors::{AppResult, DatabaseError};
use rusqlite::Connection;
use tracing::{debug, info};

/// Version written by `create_tables` on a fresh database.
const BASE_SCHEMA_VERSION: i32 = 1;

/// Current schema version.
///
/// Increment this whenever a migration step is added to `migrate`.
pub const SCHEMA_VERSION: i32 = 3;

/// Creates all database tables and indexes.
///
/// This function is idempotent - it uses `CREATE TABLE IF NOT EXISTS`
/// so it's safe to call multiple times.
///
/// # Tables
///
/// - `entries`: Journal entries with title, content, and tags
/// - `embeddings`: One cached vector per entry, tagged with the content hash it was computed from
/// - `configurations`: Configuration scopes
/// - `prompt_types`: Summarization prompt templates per scope
/// - `favorite_summaries`: Saved summaries, append-only
/// - `schema_version`: Applied schema versions
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    debug!("Creating database tables");

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(DatabaseError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entries_created_at ON entries(created_at DESC);
        "#,
    )
    .map_err(DatabaseError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS embeddings (
            entry_id TEXT PRIMARY KEY,
            embedding BLOB NOT NULL,
            dimensions INTEGER NOT NULL,
            content_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (entry_id) REFERENCES entries(id) ON DELETE CASCADE
        );
        "#,
    )
    .map_err(DatabaseError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS configurations (
            config_id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .map_err(DatabaseError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS prompt_types (
            id TEXT NOT NULL,
            config_id TEXT NOT NULL,
            name TEXT NOT NULL,
            prompt TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (id, config_id)
        );

        CREATE INDEX IF NOT EXISTS idx_prompt_types_config ON prompt_types(config_id, position);
        "#,
    )
    .map_err(DatabaseError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_summaries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id TEXT NOT NULL,
            prompt_type TEXT NOT NULL,
            summary TEXT NOT NULL,
            key_topics TEXT NOT NULL DEFAULT '[]',
            mood TEXT NOT NULL,
            saved_at TEXT NOT NULL,
            FOREIGN KEY (entry_id) REFERENCES entries(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_favorite_summaries_entry ON favorite_summaries(entry_id, saved_at);
        "#,
    )
    .map_err(DatabaseError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL,
            applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .map_err(DatabaseError::Sqlite)?;

    let current_version = get_schema_version(conn)?;
    if current_version.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?)",
            [BASE_SCHEMA_VERSION],
        )
        .map_err(DatabaseError::Sqlite)?;
        info!("Initialized database schema version {}", BASE_SCHEMA_VERSION);
    } else {
        debug!("Schema version already recorded: {:?}", current_version);
    }

    debug!("Database tables created successfully");
    Ok(())
}

/// Applies pending migrations up to `SCHEMA_VERSION`.
///
/// Version 2 adds `configurations.min_similarity`; version 3 adds
/// `favorite_summaries.quality`. Each column is only added when
/// `PRAGMA table_info` shows it missing, so a database that was patched by
/// hand is left alone and existing rows keep their data.
///
/// # Errors
///
/// Returns an error if a migration statement fails; the pending steps are
/// rolled back together.
pub fn migrate(conn: &Connection) -> AppResult<()> {
    let current = get_schema_version(conn)?.unwrap_or(BASE_SCHEMA_VERSION);
    if current >= SCHEMA_VERSION {
        debug!("Schema is current at version {}", current);
        return Ok(());
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(DatabaseError::Sqlite)?;

    if current < 2 {
        add_column_if_missing(
            &tx,
            "configurations",
            "min_similarity",
            "REAL NOT NULL DEFAULT 0.5",
        )?;
    }
    if current < 3 {
        // Rows saved before this column existed were never marked degraded
        add_column_if_missing(
            &tx,
            "favorite_summaries",
            "quality",
            "TEXT NOT NULL DEFAULT 'well_formed'",
        )?;
    }

    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?)",
        [SCHEMA_VERSION],
    )
    .map_err(DatabaseError::Sqlite)?;

    tx.commit().map_err(DatabaseError::Sqlite)?;
    info!("Migrated database schema from version {} to {}", current, SCHEMA_VERSION);
    Ok(())
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> AppResult<()> {
    if has_column(conn, table, column)? {
        debug!("Column {}.{} already present", table, column);
        return Ok(());
    }

    info!("Adding {} column to {}", column, table);
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {};",
        table, column, definition
    ))
    .map_err(|e| DatabaseError::Sqlite(e).into())
}

/// Returns whether `table` has a column named `column`.
pub fn has_column(conn: &Connection, table: &str, column: &str) -> AppResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(DatabaseError::Sqlite)?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;

    Ok(names.iter().any(|name| name == column))
}

/// Gets the current schema version from the database.
///
/// Returns `None` if the schema_version table doesn't exist or is empty.
///
/// # Errors
///
/// Returns an error if the query fails for reasons other than missing table.
pub fn get_schema_version(conn: &Connection) -> AppResult<Option<i32>> {
    let result = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, Option<i32>>(0),
    );

    match result {
        Ok(version) => Ok(version),
        Err(e) if e.to_string().contains("no such table") => Ok(None),
        Err(e) => Err(DatabaseError::Sqlite(e).into()),
    }
}
