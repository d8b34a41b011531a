//! Opening the local store: the SQLite file, its key file, and the check
//! that the two belong together.
//!
//! Account secrets are sealed with a 32-byte key kept in `<db>.key` beside
//! the database. The key file is created on first open (mode 0600 on Unix).
//! The `vault` table holds a sealed marker; a key that cannot open it is
//! rejected before any secret is read or written.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use zeroize::Zeroizing;

use super::cipher::SecretCipher;
use super::migrations;
use crate::types::errors::StorageError;

/// Plaintext sealed into the `vault` table.
pub(crate) const VAULT_MARKER: &str = "acctpanel-vault-v1";

/// An open store: a migrated SQLite connection plus the cipher for its secrets.
pub struct Database {
    conn: Connection,
    cipher: SecretCipher,
}

/// Key file used for the database at `db_path`.
pub fn key_path_for(db_path: &Path) -> PathBuf {
    db_path.with_extension("key")
}

fn load_or_create_key(path: &Path) -> Result<SecretCipher, StorageError> {
    if path.exists() {
        let bytes = Zeroizing::new(fs::read(path)?);
        return Ok(SecretCipher::from_key(&bytes)?);
    }

    let cipher = SecretCipher::generate()?;
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(cipher.key_bytes())?;
    file.sync_all()?;
    tracing::info!(path = %path.display(), "created database key file");
    Ok(cipher)
}

impl Database {
    /// Opens (or creates) the database at `path` with the key file beside it.
    ///
    /// # Errors
    /// `StorageError::KeyMismatch` when the key file belongs to another
    /// database; I/O, SQLite and crypto failures otherwise.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let cipher = load_or_create_key(&key_path_for(path))?;
        Self::open_with_cipher(path, cipher)
    }

    /// Opens the database at `path` with caller-supplied key material.
    pub fn open_with_cipher<P: AsRef<Path>>(path: P, cipher: SecretCipher) -> Result<Self, StorageError> {
        Self::prepare(Connection::open(path)?, cipher)
    }

    /// Opens a throwaway in-memory database sealed with a random key.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::prepare(Connection::open_in_memory()?, SecretCipher::generate()?)
    }

    fn prepare(conn: Connection, cipher: SecretCipher) -> Result<Self, StorageError> {
        migrations::run_all(&conn, &cipher)?;
        let db = Self { conn, cipher };
        db.verify_key()?;
        Ok(db)
    }

    fn verify_key(&self) -> Result<(), StorageError> {
        let marker: Option<Vec<u8>> = self
            .conn
            .query_row("SELECT marker FROM vault WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        match marker {
            Some(blob) => match self.cipher.open(&blob) {
                Ok(text) if text == VAULT_MARKER => Ok(()),
                _ => Err(StorageError::KeyMismatch),
            },
            None => Err(StorageError::KeyMismatch),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn cipher(&self) -> &SecretCipher {
        &self.cipher
    }
}
