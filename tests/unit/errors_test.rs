//! Unit tests for the error enums: user-facing messages and `From` conversions.

use acctpanel::types::errors::{
    BackendError, CryptoError, DispatchError, SessionError, SettingsError, StorageError,
    ValidationError,
};
use rstest::rstest;

#[rstest]
#[case(ValidationError::EmptySelection, "No accounts selected")]
#[case(ValidationError::EmptyUpload, "No account data provided")]
#[case(ValidationError::EmptyFolderName, "Folder name cannot be empty")]
#[case(ValidationError::ReservedFolderName("Main".into()), "Folder name is reserved: Main")]
#[case(ValidationError::MainFolderProtected, "Cannot delete Main folder")]
#[case(ValidationError::NoActiveFolder, "No active folder")]
#[case(ValidationError::MissingGeoValue, "Geo selection requires a value")]
#[case(ValidationError::UnknownCriterion("vip".into()), "Unknown selection criterion: vip")]
#[case(ValidationError::UnknownSortColumn("login".into()), "Unknown sort column: login")]
fn validation_messages(#[case] err: ValidationError, #[case] expected: &str) {
    assert_eq!(err.to_string(), expected);
}

#[test]
fn cooldown_out_of_range_names_bounds_and_value() {
    let err = ValidationError::CooldownOutOfRange { value: 40, min: 1, max: 36 };
    assert_eq!(err.to_string(), "Cooldown hours must be between 1 and 36, got 40");
}

#[test]
fn backend_status_carries_detail() {
    let err = BackendError::Status { status: 404, detail: "Folder not found".into() };
    assert_eq!(err.to_string(), "Backend returned 404: Folder not found");
}

#[test]
fn rusqlite_errors_become_database_errors() {
    let err: BackendError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, BackendError::Database(_)));
}

#[test]
fn session_error_is_transparent_over_sources() {
    let err: SessionError = ValidationError::NoActiveFolder.into();
    assert_eq!(err.to_string(), "No active folder");

    let err: SessionError = BackendError::NotFound("folder f1".into()).into();
    assert_eq!(err.to_string(), "Not found: folder f1");
}

#[test]
fn dispatch_error_wraps_each_layer() {
    let err: DispatchError = ValidationError::EmptySelection.into();
    assert!(matches!(err, DispatchError::Validation(ValidationError::EmptySelection)));

    let err: DispatchError = BackendError::Rejected("nope".into()).into();
    assert!(matches!(err, DispatchError::Backend(_)));

    let err: DispatchError = SessionError::MainFolderMissing.into();
    assert_eq!(err.to_string(), "Reload failed: Folder list has no Main folder");

    let err: DispatchError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
    assert!(err.to_string().starts_with("Export failed:"));
}

#[test]
fn simple_dispatch_messages() {
    assert_eq!(DispatchError::Cancelled.to_string(), "Action cancelled");
    assert_eq!(DispatchError::Busy.to_string(), "Another action is in progress");
}

#[test]
fn settings_error_messages() {
    assert_eq!(
        SettingsError::InvalidKey("x.y".into()).to_string(),
        "Invalid settings key: x.y"
    );
    assert!(SettingsError::IoError("boom".into()).to_string().contains("boom"));
}

#[test]
fn storage_errors_become_database_errors() {
    let err: StorageError = CryptoError::InvalidKey("key must be 32 bytes, got 8".into()).into();
    assert_eq!(err.to_string(), "Invalid key: key must be 32 bytes, got 8");

    let err: BackendError = StorageError::KeyMismatch.into();
    assert_eq!(err.to_string(), "Backend database error: Storage key does not match this database");

    let err: BackendError = CryptoError::Decryption("invalid key or corrupted data".into()).into();
    assert!(matches!(err, BackendError::Database(_)));
}
