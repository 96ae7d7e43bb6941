//! Parsing of loosely formatted date and time input.
//!
//! Dates and times arrive as separate strings (an LLM tool call fills them in
//! from free text), so each is parsed on its own and combined by the event
//! builder. Relative input ("tomorrow", "saturday") is resolved against an
//! explicit `today` so results are reproducible.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

use crate::error::ParseError;

/// Absolute date formats, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%A %B %d %Y",
];

/// Formats without a year; the next matching day on or after today is used.
const YEARLESS_FORMATS: &[&str] = &["%B %d", "%d %B", "%A, %B %d", "%A %B %d"];

/// Parse a date relative to `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ParseError> {
    let normalized = normalize_date(input);
    if normalized.is_empty() {
        return Err(ParseError::Date(input.to_string()));
    }

    match normalized.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return today.succ_opt().ok_or_else(|| ParseError::Date(input.to_string())),
        _ => {}
    }

    if let Some(date) = parse_weekday(&normalized, today) {
        return Ok(date);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            return Ok(date);
        }
    }

    for format in YEARLESS_FORMATS {
        let with_year = format!("{} {}", normalized, today.year());
        let format_with_year = format!("{} %Y", format);
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, &format_with_year) {
            if date >= today {
                return Ok(date);
            }
            return date
                .with_year(today.year() + 1)
                .ok_or_else(|| ParseError::Date(input.to_string()));
        }
    }

    Err(ParseError::Date(input.to_string()))
}

/// Parse a wall-clock time ("18:00", "6:00 PM", "6pm", "noon").
pub fn parse_time(input: &str) -> Result<NaiveTime, ParseError> {
    let err = || ParseError::Time(input.to_string());

    let lower = input.trim().to_lowercase().replace('.', "");
    let lower = lower.strip_prefix("at ").unwrap_or(&lower).trim().to_string();

    match lower.as_str() {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0).ok_or_else(err),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(err),
        _ => {}
    }

    if let Some((clock, pm)) = split_meridiem(&lower) {
        let (hour, minute) = match clock.split_once(':') {
            Some((h, m)) if m.len() == 2 => (h.parse::<u32>().ok(), m.parse::<u32>().ok()),
            Some(_) => (None, None),
            None => (clock.parse::<u32>().ok(), Some(0)),
        };
        let (Some(hour), Some(minute)) = (hour, minute) else {
            return Err(err());
        };
        if !(1..=12).contains(&hour) {
            return Err(err());
        }
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(err);
    }

    // A bare number ("6") could be morning or evening; require minutes or am/pm.
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&lower, format).ok())
        .ok_or_else(err)
}

/// Split "6:30pm" / "6 pm" into ("6:30", true).
fn split_meridiem(input: &str) -> Option<(&str, bool)> {
    let (clock, pm) = if let Some(clock) = input.strip_suffix("pm") {
        (clock, true)
    } else if let Some(clock) = input.strip_suffix("am") {
        (clock, false)
    } else {
        return None;
    };
    let clock = clock.trim_end();
    if clock.is_empty() {
        return None;
    }
    Some((clock, pm))
}

/// Resolve "saturday", "next sat", "this friday" to the next such day after `today`.
fn parse_weekday(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let name = input
        .strip_prefix("next ")
        .or_else(|| input.strip_prefix("this "))
        .or_else(|| input.strip_prefix("on "))
        .unwrap_or(input);

    let target: Weekday = name.parse().ok()?;
    let current = today.weekday().num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let ahead = match (wanted + 7 - current) % 7 {
        0 => 7,
        n => n,
    };
    today.checked_add_days(Days::new(u64::from(ahead)))
}

/// Lowercase, collapse whitespace, expand month abbreviations and drop ordinal suffixes.
fn normalize_date(input: &str) -> String {
    let abbrevs = [
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let (core, comma) = match word.strip_suffix(',') {
                Some(core) => (core, ","),
                None => (word, ""),
            };
            let core = core.trim_end_matches('.');
            let core = abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == core)
                .map(|(_, full)| *full)
                .unwrap_or_else(|| strip_ordinal(core));
            format!("{}{}", core, comma)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "20th" -> "20", leaves everything else untouched.
fn strip_ordinal(word: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(digits) = word.strip_suffix(suffix) {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return digits;
            }
        }
    }
    word
}
