use chrono::{DateTime, Utc};

/// Remaining time as `m:ss`; minutes are not capped at 59.
#[must_use]
pub fn format_countdown(remaining_seconds: u32) -> String {
    let minutes = remaining_seconds / 60;
    let seconds = remaining_seconds % 60;
    format!("{minutes}:{seconds:02}")
}

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M UTC").to_string()
}
