use thiserror::Error;

// === ValidationError ===

/// Local precondition failures. Raised before any request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The action needs at least one selected account.
    #[error("No accounts selected")]
    EmptySelection,
    /// The pasted upload text is empty after trimming.
    #[error("No account data provided")]
    EmptyUpload,
    /// The folder name is empty after trimming.
    #[error("Folder name cannot be empty")]
    EmptyFolderName,
    /// The folder name is reserved for the default folder.
    #[error("Folder name is reserved: {0}")]
    ReservedFolderName(String),
    /// Cooldown hours outside the accepted range.
    #[error("Cooldown hours must be between {min} and {max}, got {value}")]
    CooldownOutOfRange { value: i64, min: u32, max: u32 },
    /// No folder with the given ID is known to the session.
    #[error("Unknown folder: {0}")]
    UnknownFolder(String),
    /// The default folder cannot be deleted.
    #[error("Cannot delete Main folder")]
    MainFolderProtected,
    /// No folder is active, so folder-scoped actions have no target.
    #[error("No active folder")]
    NoActiveFolder,
    /// A geo selection was requested without a geo value.
    #[error("Geo selection requires a value")]
    MissingGeoValue,
    /// The selection criterion name is not recognised.
    #[error("Unknown selection criterion: {0}")]
    UnknownCriterion(String),
    /// The sort column name is not recognised.
    #[error("Unknown sort column: {0}")]
    UnknownSortColumn(String),
}

// === BackendError ===

/// Failures reported by the external collaborator (remote API or local store).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request could not be delivered or the response not read.
    #[error("Backend network error: {0}")]
    Network(String),
    /// The collaborator answered with a non-success status.
    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
    /// The referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The collaborator refused the operation.
    #[error("Rejected: {0}")]
    Rejected(String),
    /// Local store failure.
    #[error("Backend database error: {0}")]
    Database(String),
    /// The response body could not be decoded.
    #[error("Backend decode error: {0}")]
    Decode(String),
}

impl From<rusqlite::Error> for BackendError {
    fn from(e: rusqlite::Error) -> Self {
        BackendError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

impl From<StorageError> for BackendError {
    fn from(e: StorageError) -> Self {
        BackendError::Database(e.to_string())
    }
}

impl From<CryptoError> for BackendError {
    fn from(e: CryptoError) -> Self {
        BackendError::Database(e.to_string())
    }
}

// === CryptoError ===

/// Errors from sealing and opening stored secrets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The key has the wrong length.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Encryption failed: {0}")]
    Encryption(String),
    /// Wrong key, truncated blob, or tampered data.
    #[error("Decryption failed: {0}")]
    Decryption(String),
    #[error("Random generation failed: {0}")]
    RandomGeneration(String),
}

// === StorageError ===

/// Errors raised while opening the local store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// The key file next to the database could not be read or written.
    #[error("Storage key file error: {0}")]
    KeyFile(#[from] std::io::Error),
    /// The key file does not belong to this database.
    #[error("Storage key does not match this database")]
    KeyMismatch,
}

// === SessionError ===

/// Errors raised while loading or reconciling session state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The folder list has no folder named "Main".
    #[error("Folder list has no Main folder")]
    MainFolderMissing,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// === DispatchError ===

/// Errors returned by bulk actions.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The user declined the confirmation prompt.
    #[error("Action cancelled")]
    Cancelled,
    /// Another action is still being submitted.
    #[error("Another action is in progress")]
    Busy,
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The mutation succeeded but reloading state afterwards failed.
    #[error("Reload failed: {0}")]
    Session(#[from] SessionError),
    /// Writing the exported file failed.
    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
