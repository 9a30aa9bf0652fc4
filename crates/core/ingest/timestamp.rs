//! Timestamp resolution for occurrence rows.
//!
//! Dates come either from a single date column (ISO-8601, a few common
//! layouts, bare years and year-months, interval notation, spreadsheet
//! serials) or from separate year/month/day columns. Anything unparseable,
//! or outside years 0000 through 9999, resolves to "unknown".

use crate::ingest::record::{cell_integer, cell_number, cell_text};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Spreadsheet day numbers accepted as dates (1900-02-18 through 2064-04-09).
const SERIAL_RANGE: std::ops::RangeInclusive<f64> = 50.0..=60_000.0;

/// Years that keep [`format_iso`] fixed-width.
const ISO_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parses a free-text date into UTC.
///
/// ```
/// use rangewatch::ingest::timestamp::parse_date_text;
///
/// let ts = parse_date_text("2024-01-01").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
/// assert!(parse_date_text("sometime in spring").is_none());
/// ```
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(ts) = parse_exact(text) {
        return Some(ts);
    }
    // Interval notation: take the start.
    let (start, _) = text.split_once('/')?;
    parse_exact(start.trim())
}

fn parse_exact(text: &str) -> Option<DateTime<Utc>> {
    parse_layouts(text).and_then(within_iso_years)
}

fn parse_layouts(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return midnight(date);
        }
    }
    parse_year_month(text).and_then(midnight)
}

/// `YYYY` or `YYYY-MM`, anchored to the first of the month.
fn parse_year_month(text: &str) -> Option<NaiveDate> {
    let (year, month) = text.split_once('-').unwrap_or((text, "1"));
    let digits = |s: &str, len: std::ops::RangeInclusive<usize>| {
        len.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(year, 4..=4) || !digits(month, 1..=2) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

fn within_iso_years(ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
    ISO_YEARS.contains(&ts.year()).then_some(ts)
}

/// Interprets a number as a spreadsheet serial day (epoch 1899-12-30).
pub fn parse_serial_day(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || !SERIAL_RANGE.contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    Some((epoch + Duration::milliseconds(millis)).and_utc())
}

/// Resolves the direct date cell: text first, then a numeric serial.
///
/// Numbers go through the text layouts too, so a four-digit `2024` is a year
/// rather than serial day 2024.
pub fn parse_date_cell(value: &Value) -> Option<DateTime<Utc>> {
    let text = cell_text(value)?;
    parse_date_text(&text).or_else(|| cell_number(value).and_then(parse_serial_day))
}

/// Builds a date from separate parts; month and day default to 1.
pub fn from_parts(
    year: Option<&Value>,
    month: Option<&Value>,
    day: Option<&Value>,
) -> Option<DateTime<Utc>> {
    let year = i32::try_from(year.and_then(cell_integer)?).ok()?;
    if !ISO_YEARS.contains(&year) {
        return None;
    }
    let month = part_or_one(month)?;
    let day = part_or_one(day)?;
    midnight(NaiveDate::from_ymd_opt(year, month, day)?)
}

/// Absent or blank parts default to 1; a present part that is not a whole
/// number invalidates the date.
fn part_or_one(value: Option<&Value>) -> Option<u32> {
    match value {
        None => Some(1),
        Some(v) if cell_text(v).is_none() => Some(1),
        Some(v) => cell_integer(v).and_then(|n| u32::try_from(n).ok()),
    }
}

/// Prefers the direct date cell, falling back to year/month/day.
pub fn resolve(
    date: Option<&Value>,
    year: Option<&Value>,
    month: Option<&Value>,
    day: Option<&Value>,
) -> Option<DateTime<Utc>> {
    date.and_then(parse_date_cell)
        .or_else(|| from_parts(year, month, day))
}

/// Fixed-width ISO-8601 rendering, `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Lexicographic order matches chronological order for years 0000–9999.
pub fn format_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Age of `ts` in fractional days; negative for future timestamps.
pub fn age_days(ts: &DateTime<Utc>, reference: &DateTime<Utc>) -> f64 {
    (*reference - *ts).num_milliseconds() as f64 / 86_400_000.0
}

/// Unix day number used as the dedup bucket.
pub fn unix_day(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp().div_euclid(86_400)
}
