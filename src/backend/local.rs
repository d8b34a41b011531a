//! Embedded backend backed by SQLite via `rusqlite`.
//!
//! Mirrors the remote API's semantics for a single user: a "Main" folder is
//! created on demand, uploads without a folder land in "Main", and deleting a
//! folder reassigns its accounts to "Main" inside one transaction.
//! Passwords and client keys are sealed by the database cipher on the way in
//! and opened only for export.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::Backend;
use crate::database::connection::Database;
use crate::types::account::{format_elapsed, Account, AccountFormat, AccountLine};
use crate::types::errors::BackendError;
use crate::types::export::ExportFile;
use crate::types::folder::{
    validate_cooldown_hours, validate_folder_name, Folder, DEFAULT_COOLDOWN_HOURS, MAIN_FOLDER_NAME,
};
use crate::types::selection::SelectCriterion;

const FOLDER_COLUMNS: &str = "folder_id, name, cooldown_hours, created_at";
const LISTING_COLUMNS: &str = "account_id, folder_id, email, login, geo, format_type, uploaded_at";
const EXPORT_COLUMNS: &str =
    "email, email_password, login, account_password, geo, client_id, key, format_type";

/// Export columns as stored, secrets still sealed.
struct SealedRow {
    email: String,
    email_password: Vec<u8>,
    login: String,
    account_password: Vec<u8>,
    geo: Option<String>,
    client_id: Option<String>,
    key: Option<Vec<u8>>,
    format_code: i64,
}

/// SQLite-backed inventory store.
pub struct LocalBackend {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl LocalBackend {
    /// Creates a backend over `db` reading wall-clock time.
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self, BackendError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    fn from_millis(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap_or_default()
    }

    fn row_to_folder(row: &rusqlite::Row) -> rusqlite::Result<Folder> {
        let hours: i64 = row.get(2)?;
        Ok(Folder {
            folder_id: row.get(0)?,
            name: row.get(1)?,
            cooldown_hours: hours.max(0) as u32,
            created_at: Self::from_millis(row.get(3)?),
        })
    }

    fn format_from_row(code: i64, geo: &Option<String>) -> AccountFormat {
        u8::try_from(code)
            .ok()
            .and_then(AccountFormat::from_code)
            .unwrap_or(if geo.is_some() { AccountFormat::Geo } else { AccountFormat::ClientKey })
    }

    fn find_folder(&self, folder_id: &str) -> Result<Option<Folder>, BackendError> {
        let folder = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM folders WHERE folder_id = ?1", FOLDER_COLUMNS),
                params![folder_id],
                Self::row_to_folder,
            )
            .optional()?;
        Ok(folder)
    }

    fn require_folder(&self, folder_id: &str) -> Result<Folder, BackendError> {
        self.find_folder(folder_id)?
            .ok_or_else(|| BackendError::NotFound(format!("folder {}", folder_id)))
    }

    /// Returns the "Main" folder, creating it when missing.
    fn ensure_main(&self) -> Result<Folder, BackendError> {
        let existing = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {} FROM folders WHERE name = ?1 ORDER BY rowid LIMIT 1",
                    FOLDER_COLUMNS
                ),
                params![MAIN_FOLDER_NAME],
                Self::row_to_folder,
            )
            .optional()?;
        if let Some(main) = existing {
            return Ok(main);
        }
        tracing::debug!("creating missing {} folder", MAIN_FOLDER_NAME);
        self.insert_folder(MAIN_FOLDER_NAME)
    }

    fn insert_folder(&self, name: &str) -> Result<Folder, BackendError> {
        let folder = Folder {
            folder_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            cooldown_hours: DEFAULT_COOLDOWN_HOURS,
            created_at: self.clock.now(),
        };
        self.conn().execute(
            "INSERT INTO folders (folder_id, name, cooldown_hours, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                folder.folder_id,
                folder.name,
                folder.cooldown_hours,
                folder.created_at.timestamp_millis()
            ],
        )?;
        Ok(folder)
    }

    fn placeholders(n: usize) -> String {
        vec!["?"; n].join(", ")
    }
}

impl Backend for LocalBackend {
    fn list_folders(&self) -> Result<Vec<Folder>, BackendError> {
        self.ensure_main()?;
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM folders ORDER BY created_at, rowid",
            FOLDER_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_folder)?;

        let mut folders = Vec::new();
        for row in rows {
            folders.push(row?);
        }
        Ok(folders)
    }

    fn list_accounts(&self, folder_id: &str) -> Result<Vec<Account>, BackendError> {
        let folder = self.require_folder(folder_id)?;
        let cooldown = Duration::hours(folder.cooldown_hours as i64);
        let now = self.clock.now();

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM accounts WHERE folder_id = ?1 ORDER BY rowid",
            LISTING_COLUMNS
        ))?;
        let rows = stmt.query_map(params![folder_id], |row| {
            let geo: Option<String> = row.get(4)?;
            let uploaded_at = Self::from_millis(row.get(6)?);
            let elapsed = now - uploaded_at;
            Ok(Account {
                account_id: row.get(0)?,
                folder_id: row.get(1)?,
                email: row.get(2)?,
                login: row.get(3)?,
                format: Self::format_from_row(row.get(5)?, &geo),
                geo,
                uploaded_at,
                time_since_upload: format_elapsed(elapsed),
                cooldown_completed: elapsed >= cooldown,
            })
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    fn create_folder(&self, name: &str) -> Result<Folder, BackendError> {
        let name = validate_folder_name(name).map_err(|e| BackendError::Rejected(e.to_string()))?;
        let folder = self.insert_folder(&name)?;
        tracing::info!(folder_id = %folder.folder_id, name = %folder.name, "folder created");
        Ok(folder)
    }

    fn delete_folder(&self, folder_id: &str) -> Result<(), BackendError> {
        let folder = self.require_folder(folder_id)?;
        if folder.is_main() {
            return Err(BackendError::Rejected("Cannot delete Main folder".to_string()));
        }
        let main = self.ensure_main()?;

        let tx = self.conn().unchecked_transaction()?;
        let moved = tx.execute(
            "UPDATE accounts SET folder_id = ?1 WHERE folder_id = ?2",
            params![main.folder_id, folder_id],
        )?;
        tx.execute("DELETE FROM folders WHERE folder_id = ?1", params![folder_id])?;
        tx.commit()?;

        tracing::info!(folder_id, moved, "folder deleted, accounts reassigned to Main");
        Ok(())
    }

    fn set_cooldown(&self, folder_id: &str, hours: u32) -> Result<(), BackendError> {
        let hours = validate_cooldown_hours(hours as i64)
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        let affected = self.conn().execute(
            "UPDATE folders SET cooldown_hours = ?1 WHERE folder_id = ?2",
            params![hours, folder_id],
        )?;
        if affected == 0 {
            return Err(BackendError::NotFound(format!("folder {}", folder_id)));
        }
        Ok(())
    }

    fn upload_accounts(&self, folder_id: Option<&str>, raw_text: &str) -> Result<usize, BackendError> {
        if raw_text.trim().is_empty() {
            return Err(BackendError::Rejected("No account data provided".to_string()));
        }
        let target = match folder_id {
            Some(id) => self.require_folder(id)?,
            None => self.ensure_main()?,
        };

        let (lines, skipped) = AccountLine::parse_batch(raw_text);
        let uploaded_at = self.clock.now().timestamp_millis();

        let cipher = self.db.cipher();
        let tx = self.conn().unchecked_transaction()?;
        for line in &lines {
            let sealed_key = line.key.as_deref().map(|k| cipher.seal(k)).transpose()?;
            tx.execute(
                "INSERT INTO accounts (account_id, folder_id, email, email_password, login, account_password, geo, client_id, key, format_type, uploaded_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    Uuid::new_v4().to_string(),
                    target.folder_id,
                    line.email,
                    cipher.seal(&line.email_password)?,
                    line.login,
                    cipher.seal(&line.account_password)?,
                    line.geo,
                    line.client_id,
                    sealed_key,
                    line.format.code(),
                    uploaded_at
                ],
            )?;
        }
        tx.commit()?;

        if skipped > 0 {
            tracing::warn!(skipped, "skipped upload lines with an unsupported format");
        }
        Ok(lines.len())
    }

    fn download_accounts(&self, account_ids: &[String]) -> Result<ExportFile, BackendError> {
        let mut lines = Vec::new();
        if !account_ids.is_empty() {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT {} FROM accounts WHERE account_id IN ({}) ORDER BY rowid",
                EXPORT_COLUMNS,
                Self::placeholders(account_ids.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(account_ids.iter()), |row| {
                Ok(SealedRow {
                    email: row.get(0)?,
                    email_password: row.get(1)?,
                    login: row.get(2)?,
                    account_password: row.get(3)?,
                    geo: row.get(4)?,
                    client_id: row.get(5)?,
                    key: row.get(6)?,
                    format_code: row.get(7)?,
                })
            })?;
            let cipher = self.db.cipher();
            for row in rows {
                let row = row?;
                let line = AccountLine {
                    format: Self::format_from_row(row.format_code, &row.geo),
                    email_password: cipher.open(&row.email_password)?,
                    account_password: cipher.open(&row.account_password)?,
                    key: row.key.as_deref().map(|k| cipher.open(k)).transpose()?,
                    email: row.email,
                    login: row.login,
                    geo: row.geo,
                    client_id: row.client_id,
                };
                lines.push(line.render());
            }
        }

        Ok(ExportFile {
            content: lines.join("\n"),
            filename: format!("accounts_{}.txt", self.clock.now().format("%Y%m%d_%H%M%S")),
        })
    }

    fn delete_accounts(&self, account_ids: &[String]) -> Result<usize, BackendError> {
        if account_ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.conn().execute(
            &format!(
                "DELETE FROM accounts WHERE account_id IN ({})",
                Self::placeholders(account_ids.len())
            ),
            params_from_iter(account_ids.iter()),
        )?;
        Ok(deleted)
    }

    fn move_accounts(&self, account_ids: &[String], target_folder_id: &str) -> Result<usize, BackendError> {
        self.require_folder(target_folder_id)?;
        if account_ids.is_empty() {
            return Ok(0);
        }
        let values = std::iter::once(target_folder_id).chain(account_ids.iter().map(String::as_str));
        let moved = self.conn().execute(
            &format!(
                "UPDATE accounts SET folder_id = ? WHERE account_id IN ({})",
                Self::placeholders(account_ids.len())
            ),
            params_from_iter(values),
        )?;
        Ok(moved)
    }

    fn select_accounts(&self, folder_id: &str, criterion: &SelectCriterion) -> Result<Vec<String>, BackendError> {
        self.require_folder(folder_id)?;
        let ids = match criterion {
            SelectCriterion::Cooldown => self
                .list_accounts(folder_id)?
                .into_iter()
                .filter(|a| a.cooldown_completed)
                .map(|a| a.account_id)
                .collect(),
            SelectCriterion::All => {
                let mut stmt = self
                    .conn()
                    .prepare("SELECT account_id FROM accounts WHERE folder_id = ?1 ORDER BY rowid")?;
                let rows = stmt.query_map(params![folder_id], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()?
            }
            SelectCriterion::Geo(geo) => {
                let mut stmt = self.conn().prepare(
                    "SELECT account_id FROM accounts WHERE folder_id = ?1 AND geo = ?2 ORDER BY rowid",
                )?;
                let rows = stmt.query_map(params![folder_id, geo], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()?
            }
        };
        Ok(ids)
    }
}
