//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Name of the creation-order counter row.
pub const CREATED_ORDER_COUNTER: &str = "created_order";

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Feature requests
        CREATE TABLE features (
            feature_id BLOB PRIMARY KEY,          -- 16 random bytes
            title TEXT NOT NULL,
            score INTEGER NOT NULL DEFAULT 0,     -- always COUNT of feature_voters rows
            released INTEGER NOT NULL DEFAULT 0,
            created_order INTEGER NOT NULL UNIQUE,
            created_at INTEGER NOT NULL           -- Unix ms
        );

        -- One row per (feature, voter identity); the key makes voting idempotent
        CREATE TABLE feature_voters (
            feature_id BLOB NOT NULL REFERENCES features(feature_id),
            voter TEXT NOT NULL,
            voted_at INTEGER NOT NULL,
            PRIMARY KEY (feature_id, voter)
        );

        -- Process-wide counters, reset only by a full flush
        CREATE TABLE counters (
            name TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );

        CREATE INDEX idx_features_rank ON features(score DESC, created_order ASC);
        "#,
    )?;

    conn.execute(
        "INSERT INTO counters (name, value) VALUES (?1, 0)",
        rusqlite::params![CREATED_ORDER_COUNTER],
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
