//! Property-based tests for cooldown semantics over the local backend.
//!
//! After a folder's cooldown is set to `h` hours, every account in it must
//! report `cooldown_completed == (now - uploaded_at >= h hours)`, and
//! user-entered hours must always clamp into the accepted range.

use std::sync::Arc;

use acctpanel::backend::{Backend, LocalBackend, ManualClock};
use acctpanel::database::Database;
use acctpanel::types::folder::{
    clamp_cooldown_hours, validate_cooldown_hours, MAX_COOLDOWN_HOURS, MIN_COOLDOWN_HOURS,
};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn completion_matches_elapsed_time(
        ages_minutes in prop::collection::vec(0i64..(48 * 60), 1..12),
        hours in MIN_COOLDOWN_HOURS..=MAX_COOLDOWN_HOURS,
    ) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(now);
        let backend = LocalBackend::with_clock(Database::open_in_memory().unwrap(), Arc::new(clock.clone()));
        let main = backend.list_folders().unwrap().remove(0);

        for (i, age) in ages_minutes.iter().enumerate() {
            clock.set(now - Duration::minutes(*age));
            backend.upload_accounts(None, &format!("u{i}@x|p|user{i}|p|RU")).unwrap();
        }
        clock.set(now);
        backend.set_cooldown(&main.folder_id, hours).unwrap();

        let accounts = backend.list_accounts(&main.folder_id).unwrap();
        prop_assert_eq!(accounts.len(), ages_minutes.len());
        for account in &accounts {
            let expected = now - account.uploaded_at >= Duration::hours(hours as i64);
            prop_assert_eq!(account.cooldown_completed, expected);
        }
    }

    #[test]
    fn clamped_hours_are_always_accepted(raw in any::<i64>()) {
        let hours = clamp_cooldown_hours(raw);
        prop_assert!((MIN_COOLDOWN_HOURS..=MAX_COOLDOWN_HOURS).contains(&hours));
        prop_assert_eq!(validate_cooldown_hours(hours as i64), Ok(hours));
    }

    #[test]
    fn in_range_hours_are_unchanged_by_clamping(hours in MIN_COOLDOWN_HOURS..=MAX_COOLDOWN_HOURS) {
        prop_assert_eq!(clamp_cooldown_hours(hours as i64), hours);
    }
}
