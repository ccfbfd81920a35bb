// src/calendar.rs

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::factorial_client::{
    AttendanceApi, CalendarEntry, ClockInError, PeriodDistribution, CALENDAR_PATH, PERIODS_PATH,
};

/// One date of the period, with the quota still to be worked on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub is_laborable: bool,
    pub is_leave: bool,
    pub leave_name: String,
    pub minutes_left: Decimal,
}

/// First and last date of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ClockInError> {
    let invalid = || ClockInError::Config(format!("invalid year/month {}/{}", month, year));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next.and_then(|d| d.pred_opt()).ok_or_else(invalid)?;
    Ok((first, last))
}

/// Fetches the calendar of the month, ordered by day, with quotas merged in.
pub async fn load_calendar<A: AttendanceApi + ?Sized>(
    api: &A,
    employee_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<CalendarDay>, ClockInError> {
    let query = [
        ("id", employee_id.to_string()),
        ("year", year.to_string()),
        ("month", month.to_string()),
    ];
    let mut entries: Vec<CalendarEntry> = api
        .get(CALENDAR_PATH, &query)
        .await?
        .json_if_ok("calendar")?;
    entries.sort_by_key(|e| e.day);
    debug!("Calendar for {}/{} has {} days", month, year, entries.len());

    let distribution = load_minutes_distribution(api, employee_id, year, month).await?;
    let calendar = merge_quota(entries, &distribution)?;
    info!("Loaded {} calendar days for {}/{}", calendar.len(), month, year);
    Ok(calendar)
}

/// Estimated regular minutes per day of the month, in calendar order.
pub async fn load_minutes_distribution<A: AttendanceApi + ?Sized>(
    api: &A,
    employee_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<f64>, ClockInError> {
    let (start_on, end_on) = month_bounds(year, month)?;
    let query = [
        ("year", year.to_string()),
        ("month", month.to_string()),
        ("employee_id", employee_id.to_string()),
        ("start_on", start_on.to_string()),
        ("end_on", end_on.to_string()),
    ];
    let periods: Vec<PeriodDistribution> = api
        .get(PERIODS_PATH, &query)
        .await?
        .json_if_ok("minutes distribution")?;
    periods
        .into_iter()
        .next()
        .map(|p| p.estimated_regular_minutes_distribution)
        .ok_or(ClockInError::MissingDistribution)
}

/// Pairs the sorted calendar with the distribution by position.
///
/// The distribution carries no dates, so both sequences must have the same
/// length; anything else is rejected rather than partially merged.
pub fn merge_quota(
    entries: Vec<CalendarEntry>,
    distribution: &[f64],
) -> Result<Vec<CalendarDay>, ClockInError> {
    if entries.len() != distribution.len() {
        return Err(ClockInError::QuotaMismatch {
            calendar_days: entries.len(),
            quota_days: distribution.len(),
        });
    }

    Ok(entries
        .into_iter()
        .zip(distribution)
        .map(|(entry, &minutes)| {
            let minutes_left = Decimal::from_f64(minutes).unwrap_or_else(|| {
                warn!("Unusable quota {} for day {}, using 0", minutes, entry.day);
                Decimal::ZERO
            });
            if entry.date.day() != entry.day {
                warn!(
                    "Calendar entry {} reports day {} for date {}",
                    entry.id, entry.day, entry.date
                );
            }
            CalendarDay {
                day: entry.day,
                date: entry.date,
                is_laborable: entry.is_laborable,
                is_leave: entry.is_leave,
                leave_name: entry.leave_name,
                minutes_left,
            }
        })
        .collect())
}
