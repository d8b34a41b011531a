// acctpanel shared type definitions
// Each submodule defines types used across the crate.

pub mod account;
pub mod errors;
pub mod export;
pub mod folder;
pub mod selection;
pub mod settings;
pub mod sort;
