use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Exported account lines together with the file name the backend suggests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFile {
    pub content: String,
    pub filename: String,
}

impl ExportFile {
    /// The suggested name reduced to its last path component.
    ///
    /// Falls back to `accounts.txt` when nothing usable remains.
    pub fn safe_filename(&self) -> String {
        let name = self
            .filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if name.is_empty() || name == "." || name == ".." {
            "accounts.txt".to_string()
        } else {
            name.to_string()
        }
    }

    /// Writes the content into `dir`, creating it if needed. Returns the file path.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.safe_filename());
        fs::write(&path, &self.content)?;
        Ok(path)
    }
}
