//! Integration tests for schema migrations.
//!
//! A version-1 database has a `configurations` table without the
//! `min_similarity` column. Opening it with the current code must add the
//! column without losing any rows.

use quill::db::schema::{get_schema_version, has_column, SCHEMA_VERSION};
use quill::db::settings::{get_min_similarity, set_min_similarity};
use quill::errors::AppResult;
use quill::Database;
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

/// Writes a version-1 database by hand, with one scope and one entry.
fn create_v1_database(path: &Path) -> rusqlite::Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        r#"
        CREATE TABLE entries (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE configurations (
            config_id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE schema_version (
            version INTEGER NOT NULL,
            applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        INSERT INTO schema_version (version) VALUES (1);
        INSERT INTO configurations (config_id, created_at) VALUES ('work', '2023-05-01 08:00:00');
        INSERT INTO entries (id, title, content, tags, created_at, updated_at)
        VALUES ('legacy-1', 'Old entry', 'Written before thresholds existed', '["archive"]',
                '2023-05-01T08:00:00.000000Z', '2023-05-01T08:00:00.000000Z');
        "#,
    )
}

#[test]
fn test_v1_database_gains_min_similarity() -> AppResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("v1.db");
    create_v1_database(&path)?;

    let db = Database::open(&path)?;
    db.initialize_schema()?;
    let conn = db.get_conn()?;

    assert!(has_column(&conn, "configurations", "min_similarity")?);
    assert!(has_column(&conn, "favorite_summaries", "quality")?);
    assert_eq!(get_schema_version(&conn)?, Some(SCHEMA_VERSION));

    let created_at: String = conn.query_row(
        "SELECT created_at FROM configurations WHERE config_id = 'work'",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(created_at, "2023-05-01 08:00:00");
    assert_eq!(get_min_similarity(&conn, "work")?, 0.5);

    let entry = quill::db::entries::get_entry(&conn, "legacy-1")?;
    assert_eq!(entry.title, "Old entry");
    assert!(entry.tags.contains("archive"));
    Ok(())
}

#[test]
fn test_migration_is_idempotent() -> AppResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("v1.db");
    create_v1_database(&path)?;

    let db = Database::open(&path)?;
    db.initialize_schema()?;
    set_min_similarity(&*db.get_conn()?, "work", 0.7)?;

    // Reopen as a later invocation would
    let db = Database::open(&path)?;
    db.initialize_schema()?;
    let conn = db.get_conn()?;

    let versions: i64 = conn.query_row(
        "SELECT COUNT(*) FROM schema_version WHERE version = ?1",
        [SCHEMA_VERSION],
        |row| row.get(0),
    )?;
    assert_eq!(versions, 1);
    assert!((get_min_similarity(&conn, "work")? - 0.7).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_hand_patched_column_is_left_alone() -> AppResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("patched.db");
    create_v1_database(&path)?;
    {
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "ALTER TABLE configurations ADD COLUMN min_similarity REAL NOT NULL DEFAULT 0.5;
             UPDATE configurations SET min_similarity = 0.2 WHERE config_id = 'work';",
        )?;
    }

    let db = Database::open(&path)?;
    db.initialize_schema()?;
    let conn = db.get_conn()?;

    assert!((get_min_similarity(&conn, "work")? - 0.2).abs() < 1e-6);
    assert_eq!(get_schema_version(&conn)?, Some(SCHEMA_VERSION));
    Ok(())
}

#[test]
fn test_fresh_database_is_current() -> AppResult<()> {
    let dir = TempDir::new()?;
    let db = Database::open(&dir.path().join("nested").join("fresh.db"))?;
    db.initialize_schema()?;
    let conn = db.get_conn()?;

    assert_eq!(get_schema_version(&conn)?, Some(SCHEMA_VERSION));
    assert!(has_column(&conn, "configurations", "min_similarity")?);
    Ok(())
}
