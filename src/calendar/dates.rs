//! Turns the date text people type into chat ("2024/03/10", "3/10",
//! "tomorrow") into calendar dates.
//!
//! Numeric dates are read year-first when the order is ambiguous and
//! fall back to the current year when no year is given. Relative words
//! and dates buried inside other text are only accepted in fuzzy mode.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use regex::{Captures, Regex};

/// Day boundaries for the shared calendar are always computed at +09:00.
const CALENDAR_OFFSET_SECS: i32 = 9 * 60 * 60;

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4})[/.\-](\d{1,2})(?:[/.\-](\d{1,4}))?$").unwrap()
});

static COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap());

static MONTH_NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$").unwrap()
});

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]+)\.?(?:,?\s+(\d{4}))?$").unwrap()
});

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static EMBEDDED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{1,4}[/.\-]\d{1,2}(?:[/.\-]\d{1,4})?)(?:\D|$)").unwrap()
});

// Longer phrases first so "day after tomorrow" doesn't resolve as
// "tomorrow" and "一昨日" doesn't resolve as "昨日".
const RELATIVE_DAYS: &[(&str, i64)] = &[
    ("day after tomorrow", 2),
    ("明後日", 2),
    ("あさって", 2),
    ("tomorrow", 1),
    ("明日", 1),
    ("あした", 1),
    ("day before yesterday", -2),
    ("一昨日", -2),
    ("おととい", -2),
    ("yesterday", -1),
    ("昨日", -1),
    ("きのう", -1),
    ("today", 0),
    ("今日", 0),
    ("きょう", 0),
];

pub fn calendar_offset() -> FixedOffset {
    FixedOffset::east_opt(CALENDAR_OFFSET_SECS).expect("+09:00 is a valid UTC offset")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("could not read '{0}' as a date")]
    Unrecognized(String),

    #[error("'{0}' is not a valid calendar date")]
    OutOfRange(String),
}

/// A one day search window, inclusive start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DayWindow {
    pub fn for_date(date: NaiveDate, offset: FixedOffset) -> Self {
        let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
        Self {
            start: local_midnight(date, offset),
            end: local_midnight(next, offset),
        }
    }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

#[derive(Debug, Clone)]
pub struct DateResolver {
    offset: FixedOffset,
    // Pinned "today" so resolution is reproducible, otherwise the clock
    // is read on every call.
    today: Option<NaiveDate>,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DateResolver {
    pub fn new() -> Self {
        Self {
            offset: calendar_offset(),
            today: None,
        }
    }

    pub fn pinned(today: NaiveDate) -> Self {
        Self {
            offset: calendar_offset(),
            today: Some(today),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.offset).date_naive())
    }

    pub fn day_window(&self, date: NaiveDate) -> DayWindow {
        DayWindow::for_date(date, self.offset)
    }

    /// Resolve text that must be nothing but a date.
    pub fn resolve(&self, text: &str) -> Result<NaiveDate, DateError> {
        let trimmed = text.trim();

        if let Some(caps) = NUMERIC_DATE.captures(trimmed) {
            return self.from_numeric(trimmed, &caps);
        }

        if let Some(caps) = COMPACT_DATE.captures(trimmed) {
            let year = number(trimmed, &caps[1])?;
            let month = number(trimmed, &caps[2])?;
            let day = number(trimmed, &caps[3])?;
            return to_date(trimmed, year as i32, month, day);
        }

        if let Some(caps) = MONTH_NAME_FIRST.captures(trimmed)
            && let Some(month) = month_from_name(&caps[1])
        {
            return self.from_named(trimmed, month, &caps[2], caps.get(3).map(|m| m.as_str()));
        }

        if let Some(caps) = DAY_FIRST.captures(trimmed)
            && let Some(month) = month_from_name(&caps[2])
        {
            return self.from_named(trimmed, month, &caps[1], caps.get(3).map(|m| m.as_str()));
        }

        Err(DateError::Unrecognized(trimmed.to_string()))
    }

    /// Like `resolve` but also accepts relative words ("today",
    /// "tomorrow", "明日") and a date embedded in surrounding text.
    pub fn resolve_fuzzy(&self, text: &str) -> Result<NaiveDate, DateError> {
        match self.resolve(text) {
            Ok(date) => return Ok(date),
            Err(err @ DateError::OutOfRange(_)) => return Err(err),
            Err(DateError::Unrecognized(_)) => {}
        }

        if let Some(token) = EMBEDDED_DATE.captures(text).and_then(|caps| caps.get(1)) {
            return self.resolve(token.as_str());
        }

        let lowered = text.to_lowercase();
        for (word, days) in RELATIVE_DAYS {
            if lowered.contains(word) {
                return self
                    .today()
                    .checked_add_signed(Duration::days(*days))
                    .ok_or_else(|| DateError::OutOfRange(text.trim().to_string()));
            }
        }

        Err(DateError::Unrecognized(text.trim().to_string()))
    }

    fn from_numeric(&self, text: &str, caps: &Captures) -> Result<NaiveDate, DateError> {
        let first = &caps[1];
        let second = &caps[2];

        let (year, month, day) = match caps.get(3).map(|m| m.as_str()) {
            None => {
                // A four digit leading part is a year-month, which is not
                // a day
                if first.len() > 2 {
                    return Err(DateError::Unrecognized(text.to_string()));
                }
                let (month, day) = month_day(number(text, first)?, number(text, second)?);
                (self.today().year(), month, day)
            }
            Some(third) if first.len() > 2 => (
                number(text, first)? as i32,
                number(text, second)?,
                number(text, third)?,
            ),
            Some(third) if third.len() > 2 => {
                let (month, day) = month_day(number(text, first)?, number(text, second)?);
                (number(text, third)? as i32, month, day)
            }
            Some(third) => (
                expand_year(number(text, first)? as i32, self.today().year()),
                number(text, second)?,
                number(text, third)?,
            ),
        };

        to_date(text, year, month, day)
    }

    fn from_named(
        &self,
        text: &str,
        month: u32,
        day: &str,
        year: Option<&str>,
    ) -> Result<NaiveDate, DateError> {
        let year = match year {
            Some(year) => number(text, year)? as i32,
            None => self.today().year(),
        };
        to_date(text, year, month, number(text, day)?)
    }
}

/// Month and day when the year is not leading. A first part that can't
/// be a month is read as the day, so "13/10" is October 13.
fn month_day(first: u32, second: u32) -> (u32, u32) {
    if first > 12 && (1..=12).contains(&second) {
        (second, first)
    } else {
        (first, second)
    }
}

/// Full English month names or any prefix of at least three letters.
fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|month| month.starts_with(&name))
        .map(|idx| idx as u32 + 1)
}

fn number(text: &str, digits: &str) -> Result<u32, DateError> {
    digits
        .parse()
        .map_err(|_| DateError::Unrecognized(text.to_string()))
}

fn to_date(text: &str, year: i32, month: u32, day: u32) -> Result<NaiveDate, DateError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateError::OutOfRange(text.to_string()))
}

/// Two digit years land within 50 years of the current year.
fn expand_year(two_digit: i32, this_year: i32) -> i32 {
    let mut year = this_year / 100 * 100 + two_digit;
    if year >= this_year + 50 {
        year -= 100;
    } else if year < this_year - 50 {
        year += 100;
    }
    year
}
