//! Currency and date formatting helpers.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

/// Format cents as dollars with two decimals (e.g., "$300.00").
pub fn fmt_dollars(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// Format a record timestamp as a local calendar date.
pub fn fmt_added_on(timestamp: Option<DateTime<Utc>>) -> String {
    fmt_date_in(timestamp, &Local)
}

fn fmt_date_in<Tz>(timestamp: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.map_or_else(
        || "unknown date".into(),
        |ts| ts.with_timezone(tz).format("%Y-%m-%d").to_string(),
    )
}

/// Truncate to `max_chars`, ending with `…` when shortened.
pub fn truncate_text(value: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn dollars() {
        assert_eq!(fmt_dollars(0), "$0.00");
        assert_eq!(fmt_dollars(10_000), "$100.00");
        assert_eq!(fmt_dollars(15_050), "$150.50");
    }

    #[test]
    fn added_on_uses_calendar_date() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 22, 30, 0).unwrap();
        assert_eq!(fmt_date_in(Some(ts), &Utc), "2024-03-15");

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(fmt_date_in(Some(ts), &tokyo), "2024-03-16");

        assert_eq!(fmt_added_on(None), "unknown date");
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate_text("expense-001", 20), "expense-001");
        assert_eq!(truncate_text("expense-001", 8), "expense…");
        assert_eq!(truncate_text("abc", 0), "");
    }
}
