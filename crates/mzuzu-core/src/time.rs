//! Unit conversions used by the display and notification layers.

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;

/// `None` when the result does not fit in an `i64`.
pub fn minutes_to_millis(minutes: u64) -> Option<i64> {
    i64::try_from(minutes)
        .ok()
        .and_then(|minutes| minutes.checked_mul(MILLIS_PER_MINUTE))
}

/// Whole minutes left, rounded up, so "0:30 left" reads as 1 minute.
///
/// Zero and negative inputs map to 0.
pub fn remaining_minutes(millis: i64) -> i64 {
    if millis <= 0 {
        return 0;
    }
    (millis - 1) / MILLIS_PER_MINUTE + 1
}

/// Formats a countdown as `MM:SS`, or `H:MM:SS` past the hour.
///
/// Partial seconds round up so the display reaches `00:00` only at completion.
pub fn format_countdown(millis: i64) -> String {
    let total_secs = if millis <= 0 {
        0
    } else {
        (millis - 1) / MILLIS_PER_SECOND + 1
    };
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
