use crate::common::error::{Result, ScraperError};
use crate::common::types::{raw_field, RawRecord};
use chrono::{Duration, NaiveDate};
use tracing::debug;

/// Parse the date part of the formats the license feeds publish:
/// ISO datetimes (`2024-05-01T00:00:00.000`), ISO dates, and US `MM/DD/YYYY`
/// (optionally followed by a time).
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let date_part = value
        .trim()
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()?;

    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// The day a fallback search settled on and the rows published that day
#[derive(Debug)]
pub struct DaySelection<'a> {
    pub day: NaiveDate,
    pub rows: Vec<&'a RawRecord>,
}

/// Find the most recent day before `today` whose rows pass `keep`.
///
/// Starts at yesterday and steps back one day at a time, re-applying `keep`
/// to each day's rows. Returns `Ok(None)` once the walk passes the earliest
/// date in the feed, and `SourceUnavailable` if `lookback_days` runs out first.
pub fn select_recent_day<'a, F>(
    source_name: &str,
    feed: &'a [RawRecord],
    date_field: &str,
    today: NaiveDate,
    lookback_days: u32,
    keep: F,
) -> Result<Option<DaySelection<'a>>>
where
    F: Fn(&RawRecord) -> bool,
{
    let dated: Vec<(NaiveDate, &RawRecord)> = feed
        .iter()
        .filter_map(|raw| {
            raw_field(raw, date_field)
                .and_then(|v| parse_date(&v))
                .map(|day| (day, raw))
        })
        .collect();

    let Some(earliest) = dated.iter().map(|(day, _)| *day).min() else {
        debug!("{}: no rows carry a parseable '{}'", source_name, date_field);
        return Ok(None);
    };

    for step in 1..=i64::from(lookback_days) {
        let day = today - Duration::days(step);
        if day < earliest {
            debug!("{}: feed exhausted before finding a day with records", source_name);
            return Ok(None);
        }

        let rows: Vec<&RawRecord> = dated
            .iter()
            .filter(|(d, raw)| *d == day && keep(*raw))
            .map(|(_, raw)| *raw)
            .collect();

        if !rows.is_empty() {
            if step > 1 {
                debug!("{}: fell back {} days to {}", source_name, step, day);
            }
            return Ok(Some(DaySelection { day, rows }));
        }
    }

    Err(ScraperError::unavailable(
        source_name,
        format!("no records in the {} days before {}", lookback_days, today),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(date: &str, kind: &str) -> RawRecord {
        json!({"received_date": date, "kind": kind})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-05-01T00:00:00.000"), Some(day("2024-05-01")));
        assert_eq!(parse_date("2024-05-01"), Some(day("2024-05-01")));
        assert_eq!(parse_date("05/01/2024"), Some(day("2024-05-01")));
        assert_eq!(parse_date("5/1/2024 3:15 PM"), Some(day("2024-05-01")));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_selects_yesterday_when_present() {
        let feed = vec![row("2024-05-09", "R"), row("2024-05-08", "R")];
        let selection = select_recent_day("test", &feed, "received_date", day("2024-05-10"), 14, |_| true)
            .unwrap()
            .unwrap();
        assert_eq!(selection.day, day("2024-05-09"));
        assert_eq!(selection.rows.len(), 1);
    }

    #[test]
    fn test_falls_back_past_filtered_out_days() {
        // D has rows but all are excluded, D-1 likewise, D-2 has a kept row
        let feed = vec![
            row("2024-05-09", "X"),
            row("2024-05-08", "X"),
            row("2024-05-07", "R"),
            row("2024-05-07", "X"),
        ];
        let keep = |raw: &RawRecord| raw_field(raw, "kind").as_deref() == Some("R");

        let selection = select_recent_day("test", &feed, "received_date", day("2024-05-10"), 14, keep)
            .unwrap()
            .unwrap();
        assert_eq!(selection.day, day("2024-05-07"));
        assert_eq!(selection.rows.len(), 1);
    }

    #[test]
    fn test_exhausted_feed_is_empty_not_error() {
        let feed = vec![row("2024-05-08", "X")];
        let keep = |raw: &RawRecord| raw_field(raw, "kind").as_deref() == Some("R");
        let selection =
            select_recent_day("test", &feed, "received_date", day("2024-05-10"), 14, keep).unwrap();
        assert!(selection.is_none());

        let empty: Vec<RawRecord> = Vec::new();
        assert!(select_recent_day("test", &empty, "received_date", day("2024-05-10"), 14, |_| true)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_lookback_bound_is_an_error() {
        let feed = vec![row("2024-01-01", "X"), row("2024-05-09", "X")];
        let err = select_recent_day("test", &feed, "received_date", day("2024-05-10"), 3, |raw| {
            raw_field(raw, "kind").as_deref() == Some("R")
        })
        .unwrap_err();
        assert!(matches!(err, ScraperError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_rows_dated_today_are_ignored() {
        let feed = vec![row("2024-05-10", "R"), row("2024-05-08", "R")];
        let selection = select_recent_day("test", &feed, "received_date", day("2024-05-10"), 14, |_| true)
            .unwrap()
            .unwrap();
        assert_eq!(selection.day, day("2024-05-08"));
    }
}
