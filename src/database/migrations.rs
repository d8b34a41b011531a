//! Schema migrations for the local backend's SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::{params, Connection};

use super::cipher::SecretCipher;
use super::connection::VAULT_MARKER;
use crate::types::errors::StorageError;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
/// `cipher` seals secrets that older schemas stored as plaintext.
///
/// # Errors
/// Returns `StorageError` if any SQL statement or seal fails.
pub fn run_all(conn: &Connection, cipher: &SecretCipher) -> Result<(), StorageError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: folders and accounts")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Index accounts by geo for geo selection")?;
    }

    if current < 3 {
        migration_v3(conn, cipher)?;
        record_version(conn, 3, "Seal account secrets; add key check")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: folders and accounts. Timestamps are UTC milliseconds.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS folders (
            folder_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cooldown_hours INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accounts (
            account_id TEXT PRIMARY KEY,
            folder_id TEXT NOT NULL,
            email TEXT NOT NULL,
            email_password TEXT NOT NULL,
            login TEXT NOT NULL,
            account_password TEXT NOT NULL,
            geo TEXT,
            client_id TEXT,
            key TEXT,
            format_type INTEGER NOT NULL,
            uploaded_at INTEGER NOT NULL,
            FOREIGN KEY (folder_id) REFERENCES folders(folder_id)
        );

        CREATE INDEX IF NOT EXISTS idx_accounts_folder ON accounts(folder_id);
        "
    )
}

/// V2: geo lookups within a folder.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_accounts_folder_geo ON accounts(folder_id, geo);"
    )
}

/// V3: key check row, and secrets stored as BLOBs sealed by the database key.
fn migration_v3(conn: &Connection, cipher: &SecretCipher) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS vault (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            marker BLOB NOT NULL
        );"
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO vault (id, marker) VALUES (1, ?1)",
        params![cipher.seal(VAULT_MARKER)?],
    )?;

    let tx = conn.unchecked_transaction()?;
    for column in ["email_password", "account_password", "key"] {
        let plaintext: Vec<(String, String)> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT account_id, {col} FROM accounts WHERE typeof({col}) = 'text'",
                col = column
            ))?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<Vec<(String, String)>, rusqlite::Error>>()?
        };
        for (account_id, mut value) in plaintext {
            tx.execute(
                &format!("UPDATE accounts SET {} = ?1 WHERE account_id = ?2", column),
                params![cipher.seal(&value)?, account_id],
            )?;
            zeroize::Zeroize::zeroize(&mut value);
        }
    }
    tx.commit()?;
    Ok(())
}
