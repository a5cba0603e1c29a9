//! Utility functions for common operations.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

/// Format duration as MM:SS
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}", mins, secs)
}

/// Offset used to display timestamps: the system zone, or a fixed number of
/// hours east of UTC. Out-of-range hours fall back to UTC.
pub fn display_offset(auto_utc: bool, offset_hours: i32) -> FixedOffset {
    if auto_utc {
        return *Local::now().offset();
    }
    offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS` in the given offset
pub fn format_timestamp(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp
        .with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Truncate to `max_chars` characters, ending with "..." when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_duration_zero() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
    }

    #[test]
    fn test_format_duration_seconds_only() {
        assert_eq!(format_duration(Duration::from_secs(45)), "00:45");
    }

    #[test]
    fn test_format_duration_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(125)), "02:05");
    }

    #[test]
    fn test_format_duration_hour_plus() {
        assert_eq!(format_duration(Duration::from_secs(3661)), "61:01");
    }

    #[test]
    fn test_format_timestamp_fixed_offset() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 23, 30, 0).unwrap();
        let offset = display_offset(false, 9);
        assert_eq!(format_timestamp(ts, offset), "2026-10-20 08:30:00");
    }

    #[test]
    fn test_display_offset_out_of_range_is_utc() {
        assert_eq!(display_offset(false, 99).local_minus_utc(), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 8), "a lon...");
        assert_eq!(truncate("ピアノ協奏曲", 5), "ピア...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
