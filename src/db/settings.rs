//! Per-configuration settings.
//!
//! A configuration scope is a row in `configurations`. Scopes are created on
//! demand; settings read from a scope without a row fall back to defaults.

use crate::constants::DEFAULT_MIN_SIMILARITY;
use crate::errors::{AppError, AppResult, DatabaseError};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// Creates the configuration row for a scope if it does not exist.
pub fn ensure_configuration(conn: &Connection, config_id: &str) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO configurations (config_id) VALUES (?1)",
        params![config_id],
    )
    .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Reads the semantic search threshold for a scope.
pub fn get_min_similarity(conn: &Connection, config_id: &str) -> AppResult<f32> {
    let value: Option<f64> = conn
        .query_row(
            "SELECT min_similarity FROM configurations WHERE config_id = ?1",
            params![config_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(DatabaseError::Sqlite)?;

    Ok(value.map_or(DEFAULT_MIN_SIMILARITY, |v| v as f32))
}

/// Persists the semantic search threshold for a scope.
///
/// # Errors
///
/// Returns `AppError::Validation` unless `value` is a finite number in `[-1, 1]`.
pub fn set_min_similarity(conn: &Connection, config_id: &str, value: f32) -> AppResult<()> {
    if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
        return Err(AppError::Validation(format!(
            "min_similarity must be between -1 and 1, got {}",
            value
        )));
    }

    debug!("Setting min_similarity for scope {} to {}", config_id, value);
    conn.execute(
        r#"
        INSERT INTO configurations (config_id, min_similarity) VALUES (?1, ?2)
        ON CONFLICT(config_id) DO UPDATE SET min_similarity = excluded.min_similarity
        "#,
        params![config_id, value as f64],
    )
    .map_err(DatabaseError::Sqlite)?;
    Ok(())
}
