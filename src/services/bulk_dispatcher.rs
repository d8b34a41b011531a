// acctpanel Bulk Action Dispatcher
// Runs one user-triggered action against the backend: validate locally,
// submit exactly once, then reconcile the session by re-fetching.
// Local state is only touched after the backend confirms.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::managers::inventory_manager::Session;
use crate::types::errors::{BackendError, DispatchError, ValidationError};
use crate::types::folder::{validate_cooldown_hours, validate_folder_name, Folder};

/// The bulk actions the panel offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Upload,
    Take,
    Delete,
    SetCooldown,
    Move,
    CreateFolder,
    DeleteFolder,
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BulkAction::Upload => "upload",
            BulkAction::Take => "take",
            BulkAction::Delete => "delete",
            BulkAction::SetCooldown => "set_cooldown",
            BulkAction::Move => "move",
            BulkAction::CreateFolder => "create_folder",
            BulkAction::DeleteFolder => "delete_folder",
        };
        f.write_str(name)
    }
}

/// Where the current action is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Settled,
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Set while a request is outstanding. Clones share the flag, so a shell can
/// grey out its triggers or several dispatchers can guard each other.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Claims the flag. Returns false if it was already held.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Releases the busy flag on every exit path of a submission.
struct SubmitGuard<'a>(&'a BusyFlag);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Dispatches bulk actions against a [`Session`].
pub struct BulkDispatcher {
    export_dir: PathBuf,
    busy: BusyFlag,
    phase: ActionPhase,
}

impl BulkDispatcher {
    /// Creates a dispatcher writing taken accounts into `export_dir`.
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self::with_busy_flag(export_dir, BusyFlag::default())
    }

    pub fn with_busy_flag(export_dir: impl Into<PathBuf>, busy: BusyFlag) -> Self {
        Self {
            export_dir: export_dir.into(),
            busy,
            phase: ActionPhase::Idle,
        }
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn phase(&self) -> ActionPhase {
        self.phase
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Runs `body` as `action`, returning to `Idle` whatever the outcome.
    fn run<T>(
        &mut self,
        action: BulkAction,
        session: &mut Session,
        body: impl FnOnce(&mut Self, &mut Session) -> Result<T, DispatchError>,
    ) -> Result<T, DispatchError> {
        if self.busy.is_busy() {
            tracing::warn!(%action, "rejected: another action is in flight");
            return Err(DispatchError::Busy);
        }
        self.phase = ActionPhase::Validating;
        let outcome = body(self, session);
        self.phase = ActionPhase::Idle;
        match &outcome {
            Ok(_) => tracing::info!(%action, "action settled"),
            Err(e) => tracing::warn!(%action, error = %e, "action failed"),
        }
        outcome
    }

    /// Issues the single backend call of an action.
    fn submit<T>(&mut self, call: impl FnOnce() -> Result<T, BackendError>) -> Result<T, DispatchError> {
        if !self.busy.try_acquire() {
            return Err(DispatchError::Busy);
        }
        let guard = SubmitGuard(&self.busy);
        self.phase = ActionPhase::Submitting;
        let result = call();
        drop(guard);
        self.phase = ActionPhase::Settled;
        Ok(result?)
    }

    fn require_selection(session: &Session) -> Result<Vec<String>, ValidationError> {
        if session.selection().is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(session.selection().to_vec())
    }

    fn active_folder_id(session: &Session) -> Result<String, ValidationError> {
        Ok(session.require_active_folder()?.folder_id.clone())
    }

    /// Uploads the upload draft into the active folder. Returns the stored count.
    pub fn upload(&mut self, session: &mut Session) -> Result<usize, DispatchError> {
        self.run(BulkAction::Upload, session, |d, session| {
            let folder_id = Self::active_folder_id(session)?;
            if session.drafts.upload_text.trim().is_empty() {
                return Err(ValidationError::EmptyUpload.into());
            }
            let text = session.drafts.upload_text.clone();
            let count = d.submit(|| session.backend().upload_accounts(Some(&folder_id), &text))?;
            session.drafts.upload_text.clear();
            session.refresh_accounts()?;
            Ok(count)
        })
    }

    /// Downloads the selected accounts into the export directory.
    /// Returns the path of the written file.
    pub fn take(&mut self, session: &mut Session) -> Result<PathBuf, DispatchError> {
        self.run(BulkAction::Take, session, |d, session| {
            let ids = Self::require_selection(session)?;
            let export = d.submit(|| session.backend().download_accounts(&ids))?;
            let path = export.write_to(&d.export_dir)?;
            session.clear_selection();
            tracing::info!(count = ids.len(), path = %path.display(), "accounts exported");
            Ok(path)
        })
    }

    /// Deletes the selected accounts after confirmation. Returns the deleted count.
    pub fn delete(&mut self, session: &mut Session, confirm: &dyn Confirm) -> Result<usize, DispatchError> {
        self.run(BulkAction::Delete, session, |d, session| {
            let ids = Self::require_selection(session)?;
            let prompt = format!("Delete {} selected accounts?", ids.len());
            if !confirm.confirm(&prompt) {
                return Err(DispatchError::Cancelled);
            }
            let deleted = d.submit(|| session.backend().delete_accounts(&ids))?;
            session.clear_selection();
            session.refresh_accounts()?;
            Ok(deleted)
        })
    }

    /// Sets the active folder's cooldown and reloads folders and accounts.
    pub fn set_cooldown(&mut self, session: &mut Session, hours: i64) -> Result<(), DispatchError> {
        self.run(BulkAction::SetCooldown, session, |d, session| {
            let folder_id = Self::active_folder_id(session)?;
            let hours = validate_cooldown_hours(hours)?;
            d.submit(|| session.backend().set_cooldown(&folder_id, hours))?;
            session.refresh_folders()?;
            session.refresh_accounts()?;
            Ok(())
        })
    }

    /// Moves the selected accounts to `target_folder_id`. Returns the moved count.
    pub fn move_accounts(&mut self, session: &mut Session, target_folder_id: &str) -> Result<usize, DispatchError> {
        self.run(BulkAction::Move, session, |d, session| {
            let ids = Self::require_selection(session)?;
            if session.folder(target_folder_id).is_none() {
                return Err(ValidationError::UnknownFolder(target_folder_id.to_string()).into());
            }
            let moved = d.submit(|| session.backend().move_accounts(&ids, target_folder_id))?;
            session.clear_selection();
            session.refresh_accounts()?;
            Ok(moved)
        })
    }

    /// Creates a folder named after the folder-name draft.
    pub fn create_folder(&mut self, session: &mut Session) -> Result<Folder, DispatchError> {
        self.run(BulkAction::CreateFolder, session, |d, session| {
            let name = validate_folder_name(&session.drafts.folder_name)?;
            let folder = d.submit(|| session.backend().create_folder(&name))?;
            session.drafts.folder_name.clear();
            session.refresh_folders()?;
            Ok(folder)
        })
    }

    /// Deletes a folder after confirmation. Its accounts end up in "Main",
    /// which also becomes active if the deleted folder was. Otherwise the
    /// active folder's accounts are re-fetched, since "Main" may have grown.
    pub fn delete_folder(
        &mut self,
        session: &mut Session,
        folder_id: &str,
        confirm: &dyn Confirm,
    ) -> Result<(), DispatchError> {
        self.run(BulkAction::DeleteFolder, session, |d, session| {
            let folder = session
                .folder(folder_id)
                .ok_or_else(|| ValidationError::UnknownFolder(folder_id.to_string()))?;
            if folder.is_main() {
                return Err(ValidationError::MainFolderProtected.into());
            }
            let prompt = format!(
                "Delete folder '{}'? Its accounts will be moved to Main.",
                folder.name
            );
            if !confirm.confirm(&prompt) {
                return Err(DispatchError::Cancelled);
            }
            let was_active = session.active_folder_id() == Some(folder_id);
            d.submit(|| session.backend().delete_folder(folder_id))?;
            session.refresh_folders()?;
            if was_active {
                session.activate_main()?;
            } else {
                session.refresh_accounts()?;
            }
            Ok(())
        })
    }
}
