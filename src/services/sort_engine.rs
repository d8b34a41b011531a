// acctpanel Sort Engine
// Orders the visible account list for display. Never touches the session's
// own list, which stays in backend order for selection purposes.

use std::cmp::Ordering;

use crate::types::account::Account;
use crate::types::sort::{SortColumn, SortDirection, SortState};

fn compare(a: &Account, b: &Account, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Geo => a
            .geo
            .as_deref()
            .unwrap_or_default()
            .cmp(b.geo.as_deref().unwrap_or_default()),
        SortColumn::Time => a.uploaded_at.cmp(&b.uploaded_at),
    }
}

/// Returns `accounts` ordered by `column`.
///
/// Ascending is a stable sort, so ties keep backend order. Descending is the
/// exact reverse of ascending, ties included. `None` keeps backend order.
pub fn sort<'a>(
    accounts: &'a [Account],
    column: Option<SortColumn>,
    direction: SortDirection,
) -> Vec<&'a Account> {
    let mut ordered: Vec<&Account> = accounts.iter().collect();
    let Some(column) = column else {
        return ordered;
    };
    ordered.sort_by(|a, b| compare(a, b, column));
    if direction == SortDirection::Desc {
        ordered.reverse();
    }
    ordered
}

/// Trait defining the sort engine interface.
pub trait SortEngineTrait {
    fn state(&self) -> SortState;
    /// Header click on `column`.
    fn toggle(&mut self, column: SortColumn) -> SortState;
    fn set_state(&mut self, state: SortState);
    fn apply<'a>(&self, accounts: &'a [Account]) -> Vec<&'a Account>;
}

/// Holds the table's current ordering.
#[derive(Debug, Clone, Default)]
pub struct SortEngine {
    state: SortState,
}

impl SortEngine {
    pub fn new(state: SortState) -> Self {
        Self { state }
    }
}

impl SortEngineTrait for SortEngine {
    fn state(&self) -> SortState {
        self.state
    }

    fn toggle(&mut self, column: SortColumn) -> SortState {
        self.state.toggle(column);
        self.state
    }

    fn set_state(&mut self, state: SortState) {
        self.state = state;
    }

    fn apply<'a>(&self, accounts: &'a [Account]) -> Vec<&'a Account> {
        sort(accounts, self.state.column, self.state.direction)
    }
}
