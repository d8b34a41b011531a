//! Storage for the local backend.
//!
//! Provides SQLite connection management, schema migrations, and sealing of
//! account secrets at rest.
//!
//! # Usage
//!
//! ```no_run
//! use acctpanel::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("acctpanel.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! let conn = db.connection();
//! ```

pub mod cipher;
pub mod connection;
pub mod migrations;

pub use cipher::SecretCipher;
pub use connection::{key_path_for, Database};
