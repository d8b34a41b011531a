//! Property-based tests for PanelSettings serialization round-trip.
//!
//! These tests verify that PanelSettings can be serialized to JSON, written
//! through the settings engine, and read back without data loss.

use acctpanel::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use acctpanel::types::settings::{
    BackendMode, BackendSettings, DisplaySettings, ExportSettings, LoggingSettings, PanelSettings,
};
use acctpanel::types::sort::{SortColumn, SortDirection};
use proptest::prelude::*;
use tempfile::TempDir;

fn arb_backend_settings() -> impl Strategy<Value = BackendSettings> {
    (
        prop_oneof![Just(BackendMode::Http), Just(BackendMode::Local)],
        "https?://[a-z]{3,12}(\\.[a-z]{2,5})?(:[0-9]{2,5})?",
        prop::option::of("[A-Za-z0-9._-]{8,40}"),
        1u64..600,
        prop::option::of("/[a-z]{1,10}/[a-z]{1,10}\\.db"),
    )
        .prop_map(|(mode, base_url, token, timeout_secs, database_path)| BackendSettings {
            mode,
            base_url,
            token,
            timeout_secs,
            database_path,
        })
}

fn arb_display_settings() -> impl Strategy<Value = DisplaySettings> {
    (
        prop::option::of(prop_oneof![Just(SortColumn::Geo), Just(SortColumn::Time)]),
        prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)],
    )
        .prop_map(|(default_sort_column, default_sort_direction)| DisplaySettings {
            default_sort_column,
            default_sort_direction,
        })
}

fn arb_settings() -> impl Strategy<Value = PanelSettings> {
    (
        arb_backend_settings(),
        prop::option::of("/[a-z]{1,10}(/[a-z]{1,10})?"),
        arb_display_settings(),
        prop_oneof![Just("info"), Just("debug"), Just("acctpanel=trace,warn")],
    )
        .prop_map(|(backend, directory, display, filter)| PanelSettings {
            backend,
            export: ExportSettings { directory },
            display,
            logging: LoggingSettings { filter: filter.to_string() },
        })
}

proptest! {
    #[test]
    fn json_roundtrip(settings in arb_settings()) {
        let json = serde_json::to_string(&settings).unwrap();
        let back: PanelSettings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn engine_roundtrip_through_disk(settings in arb_settings()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json").to_string_lossy().to_string();
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

        let mut engine = SettingsEngine::new(Some(path.clone()));
        let loaded = engine.load().unwrap();
        prop_assert_eq!(&loaded, &settings);

        engine.save().unwrap();
        let mut again = SettingsEngine::new(Some(path));
        prop_assert_eq!(again.load().unwrap(), settings);
    }
}
