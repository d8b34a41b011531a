//! Inventory session for the panel.
//!
//! [`Session`] holds everything one logged-in user sees: the folder list, the
//! active folder, that folder's accounts, the selection and the input drafts.
//! All of it is replaced wholesale from the backend; nothing derived is
//! recomputed locally.

use crate::backend::Backend;
use crate::types::account::Account;
use crate::types::errors::{SessionError, ValidationError};
use crate::types::folder::Folder;
use crate::types::selection::SelectionSet;

/// Text the user is editing before submitting it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drafts {
    /// Pasted account lines awaiting upload.
    pub upload_text: String,
    /// Name for the folder about to be created.
    pub folder_name: String,
}

/// Session-scoped inventory state, created at login and dropped at logout.
pub struct Session {
    backend: Box<dyn Backend>,
    folders: Vec<Folder>,
    active_folder_id: Option<String>,
    accounts: Vec<Account>,
    selection: SelectionSet,
    pub drafts: Drafts,
}

impl Session {
    /// Creates an empty session. Call [`Session::load`] to fetch state.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            folders: Vec::new(),
            active_folder_id: None,
            accounts: Vec::new(),
            selection: SelectionSet::new(),
            drafts: Drafts::default(),
        }
    }

    /// Creates a session and performs the initial fetch.
    pub fn open(backend: Box<dyn Backend>) -> Result<Self, SessionError> {
        let mut session = Self::new(backend);
        session.load()?;
        Ok(session)
    }

    /// Fetches folders (activating "Main" if nothing is active) and then the
    /// active folder's accounts.
    pub fn load(&mut self) -> Result<(), SessionError> {
        self.refresh_folders()?;
        self.refresh_accounts()
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, folder_id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.folder_id == folder_id)
    }

    pub fn main_folder(&self) -> Option<&Folder> {
        self.folders.iter().find(|f| f.is_main())
    }

    pub fn active_folder_id(&self) -> Option<&str> {
        self.active_folder_id.as_deref()
    }

    pub fn active_folder(&self) -> Option<&Folder> {
        self.active_folder_id.as_deref().and_then(|id| self.folder(id))
    }

    pub fn require_active_folder(&self) -> Result<&Folder, ValidationError> {
        self.active_folder().ok_or(ValidationError::NoActiveFolder)
    }

    /// Accounts of the active folder in backend order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Number of accounts whose cooldown has completed.
    pub fn ready_count(&self) -> usize {
        self.accounts.iter().filter(|a| a.cooldown_completed).count()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub(crate) fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Replaces the account list of the active folder.
    ///
    /// Selected IDs that are no longer listed are dropped.
    pub fn set_accounts(&mut self, accounts: Vec<Account>) {
        self.accounts = accounts;
        let accounts = &self.accounts;
        self.selection.retain(|id| accounts.iter().any(|a| a.account_id == id));
    }

    /// Replaces the folder list. With no active folder, "Main" becomes active.
    /// An active folder that is no longer listed counts as none.
    ///
    /// # Errors
    /// `SessionError::MainFolderMissing` when nothing is active and the list
    /// has no "Main" folder. The list is stored regardless.
    pub fn set_folders(&mut self, folders: Vec<Folder>) -> Result<(), SessionError> {
        self.folders = folders;
        if let Some(id) = self.active_folder_id.as_deref() {
            if self.folder(id).is_some() {
                return Ok(());
            }
            tracing::warn!(folder_id = id, "active folder vanished from folder list");
            self.active_folder_id = None;
            self.selection.clear();
        }
        match self.main_folder() {
            Some(main) => {
                tracing::debug!(folder_id = %main.folder_id, "activating Main folder");
                self.active_folder_id = Some(main.folder_id.clone());
                Ok(())
            }
            None => {
                tracing::warn!(folders = self.folders.len(), "folder list has no Main folder");
                Err(SessionError::MainFolderMissing)
            }
        }
    }

    pub fn refresh_folders(&mut self) -> Result<(), SessionError> {
        let folders = self.backend.list_folders()?;
        tracing::debug!(count = folders.len(), "fetched folders");
        self.set_folders(folders)
    }

    /// Reloads the active folder's accounts. Without an active folder the list is emptied.
    pub fn refresh_accounts(&mut self) -> Result<(), SessionError> {
        let accounts = match self.active_folder_id.as_deref() {
            Some(folder_id) => self.backend.list_accounts(folder_id)?,
            None => Vec::new(),
        };
        tracing::debug!(count = accounts.len(), "fetched accounts");
        self.set_accounts(accounts);
        Ok(())
    }

    /// Switches the active folder, clears the selection and loads its accounts.
    ///
    /// Nothing changes if the folder is unknown or the fetch fails.
    pub fn select_folder(&mut self, folder_id: &str) -> Result<(), SessionError> {
        if self.folder(folder_id).is_none() {
            return Err(ValidationError::UnknownFolder(folder_id.to_string()).into());
        }
        let accounts = self.backend.list_accounts(folder_id)?;
        self.active_folder_id = Some(folder_id.to_string());
        self.selection.clear();
        self.accounts = accounts;
        Ok(())
    }

    /// Makes "Main" the active folder.
    pub fn activate_main(&mut self) -> Result<(), SessionError> {
        let main_id = self
            .main_folder()
            .map(|f| f.folder_id.clone())
            .ok_or(SessionError::MainFolderMissing)?;
        self.select_folder(&main_id)
    }

    /// Drops all session state. The backend handle is kept so the same
    /// session can be loaded again after the next login.
    pub fn logout(&mut self) {
        self.folders.clear();
        self.active_folder_id = None;
        self.accounts.clear();
        self.selection.clear();
        self.drafts = Drafts::default();
        tracing::info!("session cleared");
    }
}
