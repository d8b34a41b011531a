//! App Core for acctpanel.
//!
//! Central struct holding the session, the dispatcher and the services, managing application lifecycle.

use std::path::PathBuf;

use crate::backend::{Backend, HttpBackend, LocalBackend};
use crate::database::connection::Database;
use crate::managers::inventory_manager::Session;
use crate::services::bulk_dispatcher::BulkDispatcher;
use crate::services::settings_engine::{
    resolve_database_path, resolve_export_dir, SettingsEngine, SettingsEngineTrait,
};
use crate::services::sort_engine::SortEngine;
use crate::types::errors::{BackendError, SessionError};
use crate::types::settings::{BackendMode, PanelSettings};
use crate::types::sort::SortState;

/// Central application struct holding the session and the services acting on it.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub session: Session,
    pub dispatcher: BulkDispatcher,
    pub sort_engine: SortEngine,
}

/// Builds the collaborator selected by `settings.backend.mode`.
pub fn build_backend(settings: &PanelSettings) -> Result<Box<dyn Backend>, BackendError> {
    match settings.backend.mode {
        BackendMode::Http => {
            tracing::info!(base_url = %settings.backend.base_url, "using HTTP backend");
            Ok(Box::new(HttpBackend::from_settings(&settings.backend)?))
        }
        BackendMode::Local => {
            let path = resolve_database_path(settings);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BackendError::Database(format!("cannot create {}: {}", parent.display(), e)))?;
            }
            tracing::info!(path = %path.display(), "using local backend");
            Ok(Box::new(LocalBackend::new(Database::open(&path)?)))
        }
    }
}

impl App {
    /// Creates a new App from the settings file at `config_path` (or the default location).
    ///
    /// A settings file that cannot be read is reported and replaced by defaults.
    /// The session is created empty; call [`App::startup`] to fetch it.
    pub fn new(config_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(config_path);
        if let Err(e) = settings_engine.load() {
            tracing::warn!(error = %e, path = settings_engine.get_config_path(), "using default settings");
        }
        Self::from_settings_engine(settings_engine)
    }

    /// Creates an App from an already-loaded settings engine.
    pub fn from_settings_engine(settings_engine: SettingsEngine) -> Result<Self, Box<dyn std::error::Error>> {
        let settings = settings_engine.get_settings();
        let backend = build_backend(settings)?;
        let export_dir = resolve_export_dir(settings);
        Ok(Self::with_backend(settings_engine, backend, export_dir))
    }

    /// Creates an App over an already-built collaborator.
    pub fn with_backend(
        settings_engine: SettingsEngine,
        backend: Box<dyn Backend>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        let display = &settings_engine.get_settings().display;
        let sort_engine = SortEngine::new(SortState::new(
            display.default_sort_column,
            display.default_sort_direction,
        ));

        Self {
            session: Session::new(backend),
            dispatcher: BulkDispatcher::new(export_dir),
            sort_engine,
            settings_engine,
        }
    }

    /// Startup sequence: fetch folders, activate "Main", fetch its accounts.
    pub fn startup(&mut self) -> Result<(), SessionError> {
        self.session.load()?;
        tracing::info!(
            folders = self.session.folders().len(),
            accounts = self.session.accounts().len(),
            "session loaded"
        );
        Ok(())
    }

    /// Logs in against the configured HTTP API, keeps the token in settings,
    /// and reopens the session over the authenticated client.
    ///
    /// Nothing changes when the login request fails.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
        let settings = self.settings_engine.get_settings();
        if settings.backend.mode != BackendMode::Http {
            return Err(BackendError::Rejected("login requires the http backend".to_string()).into());
        }
        let mut backend = HttpBackend::from_settings(&settings.backend)?;
        backend.login(username, password)?;

        let token = backend.token().map(str::to_string);
        self.settings_engine
            .set_value("backend.token", serde_json::json!(token))?;
        self.session = Session::new(Box::new(backend));
        self.startup()?;
        Ok(())
    }

    /// Shutdown sequence: drop all session state.
    pub fn shutdown(&mut self) {
        self.session.logout();
    }
}
