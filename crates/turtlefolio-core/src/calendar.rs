//! Trading-day calendar.
//!
//! Finds the most recent session before a reference date, skipping weekends
//! and the holiday set of a [`Market`]. Holiday tables are computed from
//! rules, so no data files or network calls are involved.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, Weekday};

use crate::{CalendarError, ValidationError};

/// Upper bound on the backward walk in [`last_trading_day`].
pub const MAX_LOOKBACK_DAYS: u32 = 30;

/// Holiday rule set used to decide whether a weekday is a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// US federal holidays, observed on the nearest weekday.
    #[default]
    #[serde(alias = "us")]
    UsFederal,
    /// NYSE full-day closures.
    Nyse,
}

impl Market {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UsFederal => "us",
            Self::Nyse => "nyse",
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "us" | "us_federal" | "federal" => Ok(Self::UsFederal),
            "nyse" => Ok(Self::Nyse),
            other => Err(ValidationError::InvalidMarket {
                value: other.to_owned(),
            }),
        }
    }
}

/// Source of "today" for date-relative lookups.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

/// Holidays observed by `market` during `year`.
pub fn holidays_for(market: Market, year: i32) -> BTreeSet<Date> {
    let mut days = BTreeSet::new();
    let mut push = |date: Option<Date>| {
        if let Some(date) = date {
            days.insert(date);
        }
    };

    match market {
        Market::UsFederal => {
            push(observed(fixed(year, Month::January, 1)));
            // New Year's Day of the following year observed on Dec 31.
            if let Some(next_new_year) = fixed(year + 1, Month::January, 1) {
                if next_new_year.weekday() == Weekday::Saturday {
                    push(next_new_year.previous_day());
                }
            }
            if year >= 1986 {
                push(nth_weekday(year, Month::January, Weekday::Monday, 3));
            }
            push(nth_weekday(year, Month::February, Weekday::Monday, 3));
            push(last_weekday(year, Month::May, Weekday::Monday));
            if year >= 2021 {
                push(observed(fixed(year, Month::June, 19)));
            }
            push(observed(fixed(year, Month::July, 4)));
            push(nth_weekday(year, Month::September, Weekday::Monday, 1));
            push(nth_weekday(year, Month::October, Weekday::Monday, 2));
            push(observed(fixed(year, Month::November, 11)));
            push(nth_weekday(year, Month::November, Weekday::Thursday, 4));
            push(observed(fixed(year, Month::December, 25)));
        }
        Market::Nyse => {
            // The exchange does not close on Dec 31 for a Saturday New Year.
            push(fixed(year, Month::January, 1).and_then(|day| match day.weekday() {
                Weekday::Saturday => None,
                Weekday::Sunday => day.next_day(),
                _ => Some(day),
            }));
            push(nth_weekday(year, Month::January, Weekday::Monday, 3));
            push(nth_weekday(year, Month::February, Weekday::Monday, 3));
            push(easter_sunday(year).and_then(|easter| easter.checked_sub(Duration::days(2))));
            push(last_weekday(year, Month::May, Weekday::Monday));
            if year >= 2022 {
                push(observed(fixed(year, Month::June, 19)));
            }
            push(observed(fixed(year, Month::July, 4)));
            push(nth_weekday(year, Month::September, Weekday::Monday, 1));
            push(nth_weekday(year, Month::November, Weekday::Thursday, 4));
            push(observed(fixed(year, Month::December, 25)));
        }
    }

    days
}

/// Holidays for the year of `reference` and the year before it, enough to
/// cover any walk of [`MAX_LOOKBACK_DAYS`].
pub fn holidays_around(market: Market, reference: Date) -> BTreeSet<Date> {
    let year = reference.year();
    let mut days = holidays_for(market, year - 1);
    days.extend(holidays_for(market, year));
    days
}

/// Whether `date` is a weekday outside `holidays`.
pub fn is_trading_day(date: Date, holidays: &BTreeSet<Date>) -> bool {
    !is_weekend(date) && !holidays.contains(&date)
}

/// Most recent trading day strictly before `reference`.
pub fn last_trading_day(
    reference: Date,
    holidays: &BTreeSet<Date>,
) -> Result<Date, CalendarError> {
    let mut candidate = reference;
    for _ in 0..MAX_LOOKBACK_DAYS {
        candidate = candidate
            .previous_day()
            .ok_or(CalendarError::OutOfRange { reference })?;
        if is_trading_day(candidate, holidays) {
            return Ok(candidate);
        }
    }

    Err(CalendarError::NoTradingDay {
        reference,
        max_days: MAX_LOOKBACK_DAYS,
    })
}

fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

fn fixed(year: i32, month: Month, day: u8) -> Option<Date> {
    Date::from_calendar_date(year, month, day).ok()
}

/// Saturday holidays move to Friday, Sunday holidays to Monday.
fn observed(date: Option<Date>) -> Option<Date> {
    let date = date?;
    match date.weekday() {
        Weekday::Saturday => date.previous_day(),
        Weekday::Sunday => date.next_day(),
        _ => Some(date),
    }
}

fn nth_weekday(year: i32, month: Month, weekday: Weekday, nth: u8) -> Option<Date> {
    let first = fixed(year, month, 1)?;
    let offset =
        (7 + weekday.number_days_from_monday() - first.weekday().number_days_from_monday()) % 7;
    fixed(year, month, 1 + offset + 7 * (nth - 1))
}

fn last_weekday(year: i32, month: Month, weekday: Weekday) -> Option<Date> {
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        other => (year, other.next()),
    };
    let last = fixed(next_year, next_month, 1)?.previous_day()?;
    let back =
        (7 + last.weekday().number_days_from_monday() - weekday.number_days_from_monday()) % 7;
    last.checked_sub(Duration::days(i64::from(back)))
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
fn easter_sunday(year: i32) -> Option<Date> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
    fixed(year, month, u8::try_from(day).ok()?)
}
