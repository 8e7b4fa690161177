//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use helpvault_core::now_millis;
use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

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
            "database is at version {current}, newer than {CURRENT_VERSION}"
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
        tracing::info!(version = CURRENT_VERSION, "schema migrated");
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
        -- Accounts
        CREATE TABLE users (
            username TEXT PRIMARY KEY,
            credential TEXT NOT NULL,          -- stored verbatim
            roles TEXT NOT NULL,               -- comma-joined role labels
            email TEXT,
            first_name TEXT,
            middle_name TEXT,
            last_name TEXT,
            preferred_first_name TEXT,
            created_at INTEGER NOT NULL
        );

        -- Outstanding invitation codes; a row exists until it is consumed
        CREATE TABLE invitations (
            code TEXT PRIMARY KEY,
            role TEXT NOT NULL,
            issued_at INTEGER NOT NULL
        );

        -- Special-access groups (ids are never reused)
        CREATE TABLE access_groups (
            group_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            creator TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Permission matrix
        CREATE TABLE group_permissions (
            group_id INTEGER NOT NULL REFERENCES access_groups(group_id),
            username TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('ADMIN', 'VIEW')),
            granted_at INTEGER NOT NULL,
            PRIMARY KEY (group_id, username, kind)
        );

        -- Encrypted group articles, stored as base64(iv):base64(ciphertext)
        CREATE TABLE encrypted_articles (
            group_id INTEGER NOT NULL REFERENCES access_groups(group_id),
            article_id INTEGER NOT NULL,
            sealed TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (group_id, article_id)
        );

        -- Plaintext help items
        CREATE TABLE help_articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            short_description TEXT NOT NULL,
            authors BLOB NOT NULL,             -- CBOR array of strings
            keywords BLOB NOT NULL,            -- CBOR array of strings
            refs BLOB NOT NULL,                -- CBOR array of strings
            level TEXT NOT NULL,
            group_name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Indexes for common queries
        CREATE INDEX idx_permissions_user ON group_permissions(username, kind);
        "#,
    )?;

    Ok(())
}
