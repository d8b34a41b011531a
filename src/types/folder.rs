use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Name of the default folder. It receives the accounts of deleted folders
/// and can never be deleted itself.
pub const MAIN_FOLDER_NAME: &str = "Main";

/// Smallest accepted cooldown, in hours.
pub const MIN_COOLDOWN_HOURS: u32 = 1;

/// Largest accepted cooldown, in hours.
pub const MAX_COOLDOWN_HOURS: u32 = 36;

/// Cooldown assigned to newly created folders.
pub const DEFAULT_COOLDOWN_HOURS: u32 = 1;

/// A named bucket of accounts carrying a cooldown policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub folder_id: String,
    pub name: String,
    pub cooldown_hours: u32,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Returns true for the distinguished default folder.
    pub fn is_main(&self) -> bool {
        self.name == MAIN_FOLDER_NAME
    }
}

/// Clamps a raw user-entered value into the accepted cooldown range.
pub fn clamp_cooldown_hours(raw: i64) -> u32 {
    raw.clamp(MIN_COOLDOWN_HOURS as i64, MAX_COOLDOWN_HOURS as i64) as u32
}

/// Checks that `hours` lies within the accepted cooldown range.
pub fn validate_cooldown_hours(hours: i64) -> Result<u32, ValidationError> {
    if hours < MIN_COOLDOWN_HOURS as i64 || hours > MAX_COOLDOWN_HOURS as i64 {
        return Err(ValidationError::CooldownOutOfRange {
            value: hours,
            min: MIN_COOLDOWN_HOURS,
            max: MAX_COOLDOWN_HOURS,
        });
    }
    Ok(hours as u32)
}

/// Trims a proposed folder name and rejects empty or reserved names.
pub fn validate_folder_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyFolderName);
    }
    if name == MAIN_FOLDER_NAME {
        return Err(ValidationError::ReservedFolderName(name.to_string()));
    }
    Ok(name.to_string())
}
