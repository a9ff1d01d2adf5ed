//! Poster dates: `YY.MM.DD (Day)` formatting, validation and the calendar grid.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{PosterError, PosterResult};

/// Number of cells in the month grid (six weeks).
pub const CALENDAR_CELLS: usize = 42;

fn date_regex() -> &'static Regex {
    static DATE_REGEX: OnceLock<Regex> = OnceLock::new();
    DATE_REGEX.get_or_init(|| {
        Regex::new(r"^(\d{2})\.(\d{2})\.(\d{2})(?: \(([A-Za-z]{3})\))?$").unwrap()
    })
}

fn day_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// `25.08.25 (Mon)`
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{:02}.{:02}.{:02} ({})",
        date.year().rem_euclid(100),
        date.month(),
        date.day(),
        day_abbrev(date.weekday())
    )
}

/// Parse either `YY.MM.DD` or `YY.MM.DD (Day)`; years are taken as 20YY.
/// Returns `None` unless the numbers form a real calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let caps = date_regex().captures(value.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

pub fn validate_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Normalize user input into the display form. Empty input stays empty.
pub fn normalize_date(value: &str) -> PosterResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    parse_date(trimmed)
        .map(format_date)
        .ok_or_else(|| PosterError::InvalidDate {
            value: trimmed.to_string(),
        })
}

/// `20250825`, as used in export filenames.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// One cell of the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
}

/// Month view backing the date picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    first: NaiveDate,
}

impl CalendarMonth {
    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        CalendarMonth {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    /// Month of the record's date when it parses, otherwise of `today`.
    pub fn for_record_date(record_date: &str, today: NaiveDate) -> Self {
        CalendarMonth::containing(parse_date(record_date).unwrap_or(today))
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// `August 2025`
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    pub fn navigate(&self, direction: i32) -> Self {
        let months = Months::new(direction.unsigned_abs());
        let first = if direction >= 0 {
            self.first.checked_add_months(months)
        } else {
            self.first.checked_sub_months(months)
        };
        CalendarMonth {
            first: first.unwrap_or(self.first),
        }
    }

    /// Six weeks starting on the Sunday on or before the first of the month.
    pub fn grid(&self, today: NaiveDate, selected: Option<NaiveDate>) -> Vec<CalendarDay> {
        let lead = self.first.weekday().num_days_from_sunday() as i64;
        let start = self.first - Duration::days(lead);
        (0..CALENDAR_CELLS as i64)
            .map(|offset| {
                let date = start + Duration::days(offset);
                CalendarDay {
                    date,
                    in_month: date.month() == self.first.month(),
                    is_today: date == today,
                    is_selected: selected == Some(date),
                }
            })
            .collect()
    }
}
