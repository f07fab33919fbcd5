//! Calendar readouts derived from the current local wall-clock time.
//!
//! Every function here is pure: same timestamp in, same answer out.

use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 86_400_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;
const MINUTES_PER_DAY: u32 = 1_440;

/// Denominator of the week progress bar. Years with 53 weeks overflow it.
pub const NOMINAL_WEEKS: u32 = 52;

/// Hours and whole minutes left until 23:59:59.999 today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRemaining {
    pub hours: i64,
    pub minutes: i64,
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

pub fn time_remaining_today(now: NaiveDateTime) -> TimeRemaining {
    let millis = now.nanosecond().min(999_999_999) / 1_000_000;
    let elapsed = i64::from(now.num_seconds_from_midnight()) * 1000 + i64::from(millis);
    let diff = (MS_PER_DAY - 1) - elapsed;

    TimeRemaining {
        hours: diff / MS_PER_HOUR,
        minutes: (diff % MS_PER_HOUR) / MS_PER_MINUTE,
    }
}

fn start_of_year(now: NaiveDateTime) -> NaiveDateTime {
    let jan1 = now.date() - Days::new(u64::from(now.ordinal0()));
    jan1.and_time(NaiveTime::MIN)
}

/// Whole days elapsed since "January 0" (midnight of Dec 31 the year before),
/// so Jan 1 is day 1.
pub fn day_of_year(now: NaiveDateTime) -> u32 {
    let jan0 = start_of_year(now) - TimeDelta::days(1);
    ((now - jan0).num_milliseconds() / MS_PER_DAY) as u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekProgress {
    pub week: u32,
    pub total_weeks: u32,
    pub percent: f64,
}

impl WeekProgress {
    pub fn weeks_left(&self) -> u32 {
        self.total_weeks.saturating_sub(self.week)
    }

    /// True in the last days of a 53-week year, where `percent` exceeds 100.
    pub fn overflows(&self) -> bool {
        self.week > self.total_weeks
    }
}

pub fn week_progress(now: NaiveDateTime) -> WeekProgress {
    let jan1 = start_of_year(now);
    let days = (now - jan1).num_milliseconds() as f64 / MS_PER_DAY as f64;
    let offset = f64::from(jan1.weekday().num_days_from_sunday());
    let week = ((days + offset + 1.0) / 7.0).ceil() as u32;

    WeekProgress {
        week,
        total_weeks: NOMINAL_WEEKS,
        percent: f64::from(week) / f64::from(NOMINAL_WEEKS) * 100.0,
    }
}

/// Meteorological season by month, northern-hemisphere naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// `month` is 1-based, as returned by [`Datelike::month`].
    pub fn for_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn season(now: NaiveDateTime) -> Season {
    Season::for_month(now.month())
}

/// Day-of-year based countdown shown under the season; negative once past.
pub fn days_until_spring(now: NaiveDateTime) -> i64 {
    90 - i64::from(day_of_year(now))
}

pub fn days_in_month(now: NaiveDateTime) -> u32 {
    let first = now.date() - Days::new(u64::from(now.day0()));
    let next = first + Months::new(1);
    (next - first).num_days() as u32
}

pub fn month_progress(now: NaiveDateTime) -> u32 {
    now.day() * 100 / days_in_month(now)
}

pub fn days_left_in_month(now: NaiveDateTime) -> u32 {
    days_in_month(now) - now.day()
}

/// Percentage of the day complete, by whole minutes.
pub fn day_progress(now: NaiveDateTime) -> u32 {
    (now.hour() * 60 + now.minute()) * 100 / MINUTES_PER_DAY
}

pub fn greeting(now: NaiveDateTime) -> &'static str {
    match now.hour() {
        0..=4 => "Good Night",
        5..=11 => "Good Morning",
        12..=17 => "Good Afternoon",
        _ => "Good Evening",
    }
}

/// The large time readout and the date line beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFace {
    pub hour: u32,
    pub minute: String,
    pub second: String,
    pub meridiem: &'static str,
    pub weekday: String,
    pub date: String,
}

impl ClockFace {
    pub fn at(now: NaiveDateTime) -> Self {
        let (is_pm, hour) = now.hour12();
        Self {
            hour,
            minute: format!("{:02}", now.minute()),
            second: format!("{:02}", now.second()),
            meridiem: if is_pm { "PM" } else { "AM" },
            weekday: now.format("%A").to_string(),
            date: now.format("%B %-d, %Y").to_string(),
        }
    }
}
