//! Utilities for date and time formatting
use chrono::{Duration, NaiveDate, NaiveDateTime};

const ISO_DATE: &str = "%Y-%m-%d";

/// Parses a yyyy-mm-dd string; blank or malformed input yields `None`
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE).ok()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}

/// Header clock label
/// Example: 2024-03-15 14:02:26 -> "2024/03/15 14:02:26"
pub fn format_clock(now: &NaiveDateTime) -> String {
    now.format("%Y/%m/%d %H:%M:%S").to_string()
}

/// Inclusive range of `days` days ending at `end`
pub fn trailing_window(end: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (end - Duration::days(days - 1), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_iso_date(" 2024-03-15 "), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(parse_iso_date(""), None);
        assert_eq!(parse_iso_date("15.03.2024"), None);
    }

    #[test]
    fn test_format_clock() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 2, 9)
            .unwrap();
        assert_eq!(format_clock(&now), "2024/03/05 07:02:09");
    }

    #[test]
    fn test_trailing_window() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let (start, last) = trailing_window(end, 14);
        assert_eq!(format_iso_date(start), "2024-03-01");
        assert_eq!(last, end);

        let (start, _) = trailing_window(end, 1);
        assert_eq!(start, end);
    }
}
