use serde::{Deserialize, Serialize};

use super::sort::{SortColumn, SortDirection};

/// Top-level panel settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelSettings {
    pub backend: BackendSettings,
    pub export: ExportSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
}

/// Which collaborator the panel talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// Remote REST API.
    #[default]
    Http,
    /// Embedded SQLite store.
    Local,
}

/// Connection settings for the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendSettings {
    pub mode: BackendMode,
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// SQLite file used in `local` mode. `None` means the platform data dir.
    pub database_path: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            mode: BackendMode::Http,
            base_url: "http://localhost:8001".to_string(),
            token: None,
            timeout_secs: 30,
            database_path: None,
        }
    }
}

/// Where taken accounts are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    /// `None` means the platform download dir, or the working directory.
    pub directory: Option<String>,
}

/// Initial ordering of the account table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    pub default_sort_column: Option<SortColumn>,
    pub default_sort_direction: SortDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { filter: "info".to_string() }
    }
}
