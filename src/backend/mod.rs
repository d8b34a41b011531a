//! The external collaborator: where folders and accounts actually live.
//!
//! The session never mutates inventory on its own. Every change goes through
//! a [`Backend`] call and is followed by a re-fetch. Two implementations ship
//! with the crate: [`http::HttpBackend`] for the remote REST API and
//! [`local::LocalBackend`] for an embedded SQLite store.

pub mod clock;
pub mod http;
pub mod local;

use crate::types::account::Account;
use crate::types::errors::BackendError;
use crate::types::export::ExportFile;
use crate::types::folder::Folder;
use crate::types::selection::SelectCriterion;

pub use clock::{Clock, ManualClock, SystemClock};
pub use http::HttpBackend;
pub use local::LocalBackend;

/// Request/response contract with the inventory backend.
pub trait Backend: Send {
    fn list_folders(&self) -> Result<Vec<Folder>, BackendError>;
    fn list_accounts(&self, folder_id: &str) -> Result<Vec<Account>, BackendError>;
    fn create_folder(&self, name: &str) -> Result<Folder, BackendError>;
    /// Deletes a folder after reassigning its accounts to "Main".
    fn delete_folder(&self, folder_id: &str) -> Result<(), BackendError>;
    fn set_cooldown(&self, folder_id: &str, hours: u32) -> Result<(), BackendError>;
    /// Stores one account per parseable line. `None` targets "Main".
    /// Returns the number of accounts stored.
    fn upload_accounts(&self, folder_id: Option<&str>, raw_text: &str) -> Result<usize, BackendError>;
    fn download_accounts(&self, account_ids: &[String]) -> Result<ExportFile, BackendError>;
    fn delete_accounts(&self, account_ids: &[String]) -> Result<usize, BackendError>;
    fn move_accounts(&self, account_ids: &[String], target_folder_id: &str) -> Result<usize, BackendError>;
    /// Backend-side equivalent of the local selection engine.
    fn select_accounts(&self, folder_id: &str, criterion: &SelectCriterion) -> Result<Vec<String>, BackendError>;
}
