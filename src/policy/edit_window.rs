//! Edit-Window Policy
//!
//! Time-based gate for lightweight corrections. The correction workflow is
//! always available regardless of the window; callers use this signal for
//! UI affordances and policy gating on top of it.

use chrono::{DateTime, Duration, Utc};

/// Corrections inside this window are considered routine.
pub const EDIT_WINDOW_HOURS: i64 = 48;

pub struct EditWindowPolicy;

impl EditWindowPolicy {
    /// True iff `now` is within 48 hours of `recorded_at`, boundary inclusive.
    pub fn is_within_edit_window(recorded_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - recorded_at <= Duration::hours(EDIT_WINDOW_HOURS)
    }

    /// Time left in the window, clamped at zero once it has expired.
    pub fn remaining(recorded_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let remaining = Duration::hours(EDIT_WINDOW_HOURS) - (now - recorded_at);
        remaining.max(Duration::zero())
    }
}
