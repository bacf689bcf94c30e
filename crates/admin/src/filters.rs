//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a number of seconds as `m:ss` for the lockout countdown.
///
/// Usage in templates: `{{ remaining_seconds|countdown }}`
#[askama::filter_fn]
pub fn countdown(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_countdown(value.to_string().parse().unwrap_or(0)))
}

/// `m:ss`, never negative.
#[must_use]
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(61), "1:01");
        assert_eq!(format_countdown(-4), "0:00");
    }
}
