//! Timestamp display.

use chrono::{DateTime, Local, Utc};

/// Month/day/year, 12-hour clock.
const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Shown when a post or reply carries no usable timestamp.
pub const UNKNOWN_DATE: &str = "Unknown date";

/// Which clock timestamps are shown in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeDisplay {
    #[default]
    Local,
    Utc,
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>, display: TimeDisplay) -> String {
    match (ts, display) {
        (None, _) => UNKNOWN_DATE.to_string(),
        (Some(ts), TimeDisplay::Utc) => ts.format(DISPLAY_FORMAT).to_string(),
        (Some(ts), TimeDisplay::Local) => ts.with_timezone(&Local).format(DISPLAY_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_in_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_timestamp(Some(ts), TimeDisplay::Utc), "3/9/2024, 2:05:07 PM");
    }

    #[test]
    fn midnight_uses_twelve_hour_clock() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(Some(ts), TimeDisplay::Utc), "12/31/2023, 12:00:00 AM");
    }

    #[test]
    fn missing_timestamp_is_labelled() {
        assert_eq!(format_timestamp(None, TimeDisplay::Local), UNKNOWN_DATE);
    }
}
