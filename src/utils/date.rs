//! Publication dates.
//!
//! Documents carry a plain calendar date, either from the `date` header key
//! or from a `YYYY-MM-DD-` file name prefix.

use chrono::{NaiveDate, TimeZone, Utc};

/// Length of "YYYY-MM-DD"
const DATE_LEN: usize = 10;

/// Parse a "YYYY-MM-DD" date, ignoring anything after the first 10 bytes
/// (so `2020-01-20 10:00:00 +0000` is accepted).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date = s.get(..DATE_LEN)?;
    if let Some(rest) = s.get(DATE_LEN..)
        && !(rest.is_empty() || rest.starts_with([' ', 'T', 't']))
    {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Split a `YYYY-MM-DD-` prefix off a file stem.
///
/// ```ignore
/// split_date_prefix("2020-01-20-zero") // (Some(2020-01-20), "zero")
/// split_date_prefix("about")           // (None, "about")
/// ```
pub fn split_date_prefix(stem: &str) -> (Option<NaiveDate>, &str) {
    let prefix = stem.get(..DATE_LEN);
    let rest = stem.get(DATE_LEN + 1..);
    match (prefix, rest) {
        (Some(prefix), Some(rest))
            if stem.as_bytes()[DATE_LEN] == b'-' && !rest.is_empty() =>
        {
            match NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                Ok(date) => (Some(date), rest),
                Err(_) => (None, stem),
            }
        }
        _ => (None, stem),
    }
}

/// Format a date as RFC 2822 at midnight UTC (rss `pubDate`).
pub fn to_rfc2822(date: NaiveDate) -> String {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    Utc.from_utc_datetime(&midnight).to_rfc2822()
}
