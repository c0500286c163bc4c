//! SQLite schema for the key-value record.
//!
//! The schema version lives in `PRAGMA user_version`. Each entry in
//! [`STEPS`] upgrades the database by one version and runs at most once.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// SQL that brings a database from version `index` to `index + 1`.
const STEPS: &[&str] = &["CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );"];

pub fn current_version() -> u32 {
    STEPS.len() as u32
}

pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("Failed to read schema version")?;
    Ok(version)
}

/// Upgrade `conn` to [`current_version`].
///
/// A database written by a newer build is left alone and reported as an
/// error rather than downgraded.
pub fn upgrade(conn: &Connection) -> Result<()> {
    let found = schema_version(conn)?;
    let target = current_version();

    if found > target {
        anyhow::bail!(
            "Database schema version {} is newer than supported version {}",
            found,
            target
        );
    }

    for (index, sql) in STEPS.iter().enumerate().skip(found as usize) {
        let next = index as u32 + 1;
        conn.execute_batch(&format!(
            "BEGIN; {} PRAGMA user_version = {}; COMMIT;",
            sql, next
        ))
        .with_context(|| format!("Failed to upgrade schema to version {}", next))?;
        tracing::info!(version = next, "Upgraded database schema");
    }

    Ok(())
}
