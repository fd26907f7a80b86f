use super::domain::TurnoverCase;
use chrono::{DateTime, Duration, Utc};

pub const ARCHIVE_AFTER_DAYS: i64 = 30;

/// Terminal-stage cases drop out of the active view once the threshold has elapsed.
///
/// The reference point is `completed_at`, falling back to `last_activity` for
/// records written before completion timestamps were stored.
pub fn should_archive(case: &TurnoverCase, now: DateTime<Utc>) -> bool {
    if !case.status.is_terminal() {
        return false;
    }

    let reference = case.completed_at.unwrap_or(case.last_activity);
    now.signed_duration_since(reference) > Duration::days(ARCHIVE_AFTER_DAYS)
}
