// acctpanel state managers
// Managers own the session-scoped inventory state and the selection built on top of it.

pub mod inventory_manager;
pub mod selection_manager;
