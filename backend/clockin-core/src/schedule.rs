// src/schedule.rs

use chrono::{Datelike, Month, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Only for literals known to be valid.
const fn at(hour: u16, minute: u16) -> ClockTime {
    ClockTime(hour * 60 + minute)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid clock time '{input}': expected HH:MM (24-hour)")]
pub struct ClockTimeError {
    pub input: String,
}

/// A wall-clock time within one day, stored as minutes since midnight.
///
/// Shifts never cross midnight, so two `ClockTime`s of the same day can be
/// compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ClockTimeError {
            input: s.to_string(),
        };
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(err());
        }
        let hour: u16 = h.parse().map_err(|_| err())?;
        let minute: u16 = m.parse().map_err(|_| err())?;
        Self::from_hm(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// A same-day clock-in/clock-out pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl Interval {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Parses a pair of `HH:MM` strings, as found on recorded shifts.
    pub fn parse(start: &str, end: &str) -> Result<Self, ClockTimeError> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    /// Whether `self` (the requested shift) conflicts with `existing`.
    ///
    /// Conflict when the requested start or end falls strictly inside the
    /// existing shift, or when the existing shift lies within the requested
    /// one (equality included). Back-to-back shifts do not conflict.
    pub fn overlaps(&self, existing: &Interval) -> bool {
        let starts_inside = existing.start < self.start && self.start < existing.end;
        let ends_inside = existing.start < self.end && self.end < existing.end;
        let contains_existing = self.start <= existing.start && existing.end <= self.end;
        starts_inside || ends_inside || contains_existing
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Organisation-specific working pattern used when creating shifts.
///
/// Days on `short_weekday` or anywhere in `short_month` get the single
/// `short_day` block; every other working day gets the `split_day` blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePolicy {
    pub short_weekday: Weekday,
    pub short_month: Month,
    pub short_day: Vec<Interval>,
    pub split_day: Vec<Interval>,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            short_weekday: Weekday::Fri,
            short_month: Month::July,
            short_day: vec![Interval::new(at(8, 0), at(15, 0))],
            split_day: vec![
                Interval::new(at(9, 0), at(14, 15)),
                Interval::new(at(15, 0), at(18, 0)),
            ],
        }
    }
}

impl SchedulePolicy {
    pub fn is_short_day(&self, date: NaiveDate) -> bool {
        date.weekday() == self.short_weekday || date.month() == self.short_month.number_from_month()
    }

    pub fn blocks_for(&self, date: NaiveDate) -> &[Interval] {
        if self.is_short_day(date) {
            &self.short_day
        } else {
            &self.split_day
        }
    }
}
