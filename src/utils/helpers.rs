//! Small shared helpers
//!
//! Argument parsing for command handlers and human-readable formatting of
//! subscription time remaining.

use chrono::Duration;

/// Parse a positive integer amount from user input.
///
/// Returns `None` for anything that is not a strictly positive integer.
pub fn parse_amount(input: &str) -> Option<i64> {
    match input.trim().parse::<i64>() {
        Ok(amount) if amount > 0 => Some(amount),
        _ => None,
    }
}

/// Parse a Telegram user id argument.
pub fn parse_user_id(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Parse an optional user-id filter argument.
///
/// Empty input is a valid "no filter"; input that is present but not a
/// user id is `None`, so callers can reply with usage instead of silently
/// listing everything.
pub fn parse_filter_arg(input: &str) -> Option<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    parse_user_id(trimmed).map(Some)
}

/// Split a command argument string into (first word, rest).
pub fn split_arg(input: &str) -> (&str, &str) {
    let trimmed = input.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (trimmed, ""),
    }
}

/// Format a remaining duration as `3d 04h 12m 05s`.
///
/// The largest non-zero unit leads unpadded, lower units are zero-padded to
/// two digits, and seconds are always shown. Negative durations render as
/// `0s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    if total <= 0 {
        return "0s".to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{}d {:02}h {:02}m {:02}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{:02}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50"), Some(50));
        assert_eq!(parse_amount(" 50 "), Some(50));
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("5.5"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("1262317603"), Some(1262317603));
        assert_eq!(parse_user_id("-1"), None);
        assert_eq!(parse_user_id("not-an-id"), None);
    }

    #[test]
    fn test_parse_filter_arg() {
        assert_eq!(parse_filter_arg(""), Some(None));
        assert_eq!(parse_filter_arg("   "), Some(None));
        assert_eq!(parse_filter_arg("100"), Some(Some(100)));
        assert_eq!(parse_filter_arg("garbage"), None);
        assert_eq!(parse_filter_arg("-1"), None);
    }

    #[test]
    fn test_split_arg() {
        assert_eq!(split_arg("100 hello world"), ("100", "hello world"));
        assert_eq!(split_arg("100"), ("100", ""));
        assert_eq!(split_arg("  100   x "), ("100", "x"));
        assert_eq!(split_arg(""), ("", ""));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(0)), "0s");
        assert_eq!(format_duration(Duration::seconds(-10)), "0s");
        assert_eq!(format_duration(Duration::seconds(5)), "05s");
        assert_eq!(format_duration(Duration::seconds(65)), "1m 05s");
        assert_eq!(format_duration(Duration::seconds(3_725)), "1h 02m 05s");
        assert_eq!(
            format_duration(Duration::days(29) + Duration::seconds(59)),
            "29d 00h 00m 59s"
        );
    }
}
