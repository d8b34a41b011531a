//! Selection Manager.
//!
//! Builds the selection of the active folder: criterion-based selection
//! replaces it, checkbox toggles add or remove single IDs. The pure helpers
//! work on any account slice; [`SelectionManager`] applies them to a session.

use std::collections::HashSet;

use crate::managers::inventory_manager::Session;
use crate::types::account::Account;
use crate::types::errors::SessionError;
use crate::types::selection::{SelectCriterion, SelectionSet};

/// Returns the IDs of `accounts` matching `criterion`.
pub fn select(accounts: &[Account], criterion: &SelectCriterion) -> SelectionSet {
    accounts
        .iter()
        .filter(|a| match criterion {
            SelectCriterion::All => true,
            SelectCriterion::Cooldown => a.cooldown_completed,
            SelectCriterion::Geo(geo) => a.geo.as_deref() == Some(geo.as_str()),
        })
        .map(|a| a.account_id.as_str())
        .collect()
}

/// Distinct non-empty geo tags, in order of first appearance.
pub fn available_geos(accounts: &[Account]) -> Vec<String> {
    let mut seen = HashSet::new();
    accounts
        .iter()
        .filter_map(|a| a.geo.as_deref())
        .filter(|g| !g.is_empty() && seen.insert(*g))
        .map(str::to_string)
        .collect()
}

/// State of the select-all checkbox: checked iff everything visible is
/// selected and there is something visible.
pub fn all_checked(selection: &SelectionSet, visible: usize) -> bool {
    visible > 0 && selection.len() == visible
}

/// Trait defining selection operations on the active folder.
pub trait SelectionManagerTrait {
    /// Replaces the selection with the accounts matching `criterion`. Returns the new size.
    fn select(&mut self, criterion: &SelectCriterion) -> usize;
    /// Like `select`, but the matching IDs come from the backend.
    fn select_remote(&mut self, criterion: &SelectCriterion) -> Result<usize, SessionError>;
    /// Checks or unchecks one row. Returns false if the ID is not visible.
    fn toggle(&mut self, account_id: &str, checked: bool) -> bool;
    /// The select-all checkbox.
    fn toggle_all(&mut self, checked: bool);
    fn all_checked(&self) -> bool;
    fn available_geos(&self) -> Vec<String>;
}

/// Selection manager operating on a borrowed session.
pub struct SelectionManager<'a> {
    session: &'a mut Session,
}

impl<'a> SelectionManager<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    fn is_visible(&self, account_id: &str) -> bool {
        self.session.accounts().iter().any(|a| a.account_id == account_id)
    }
}

impl<'a> SelectionManagerTrait for SelectionManager<'a> {
    fn select(&mut self, criterion: &SelectCriterion) -> usize {
        let selected = select(self.session.accounts(), criterion);
        let size = selected.len();
        *self.session.selection_mut() = selected;
        tracing::debug!(criteria = criterion.name(), size, "selection replaced");
        size
    }

    fn select_remote(&mut self, criterion: &SelectCriterion) -> Result<usize, SessionError> {
        let folder_id = self.session.require_active_folder()?.folder_id.clone();
        let ids = self.session.backend().select_accounts(&folder_id, criterion)?;
        let selected: SelectionSet = ids.into_iter().filter(|id| self.is_visible(id)).collect();
        let size = selected.len();
        *self.session.selection_mut() = selected;
        tracing::debug!(criteria = criterion.name(), size, "selection replaced from backend");
        Ok(size)
    }

    fn toggle(&mut self, account_id: &str, checked: bool) -> bool {
        if !self.is_visible(account_id) {
            return false;
        }
        if checked {
            self.session.selection_mut().insert(account_id);
        } else {
            self.session.selection_mut().remove(account_id);
        }
        true
    }

    fn toggle_all(&mut self, checked: bool) {
        if checked {
            let all = select(self.session.accounts(), &SelectCriterion::All);
            *self.session.selection_mut() = all;
        } else {
            self.session.clear_selection();
        }
    }

    fn all_checked(&self) -> bool {
        all_checked(self.session.selection(), self.session.accounts().len())
    }

    fn available_geos(&self) -> Vec<String> {
        available_geos(self.session.accounts())
    }
}
