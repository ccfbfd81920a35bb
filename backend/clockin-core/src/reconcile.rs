// src/reconcile.rs

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::bootstrap::MonthContext;
use crate::calendar::CalendarDay;
use crate::factorial_client::{AttendanceApi, ShiftRequest};
use crate::schedule::{ClockTime, Interval, SchedulePolicy};
use crate::shifts::{create_shift, ExistingShift};

pub const DEFAULT_LOCATION_TYPE: &str = "work_from_home";
pub const DEFAULT_SOURCE: &str = "desktop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    Today,
    UntilToday,
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterReason::Today => write!(f, "today"),
            FilterReason::UntilToday => write!(f, "until-today"),
        }
    }
}

/// What happened to one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    /// Every block was accepted (or would be, on a dry run).
    Created(Vec<Interval>),
    /// Some blocks were accepted and some were not.
    PartiallyCreated {
        created: Vec<Interval>,
        failed: Vec<Interval>,
    },
    /// Carries the conflicting shift as "HH:MM - HH:MM".
    SkippedOverlap(String),
    SkippedLeave(String),
    /// Carries the weekday name.
    SkippedNonLaborable(String),
    SkippedFilter(FilterReason),
    Failed,
}

fn join_blocks(blocks: &[Interval]) -> String {
    blocks
        .iter()
        .map(Interval::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DayOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, DayOutcome::Created(_))
    }

    /// Stable machine-readable label, used in CSV reports.
    pub fn status(&self) -> &'static str {
        match self {
            DayOutcome::Created(_) => "created",
            DayOutcome::PartiallyCreated { .. } => "partially_created",
            DayOutcome::SkippedOverlap(_) => "skipped_overlap",
            DayOutcome::SkippedLeave(_) => "skipped_leave",
            DayOutcome::SkippedNonLaborable(_) => "skipped_non_laborable",
            DayOutcome::SkippedFilter(_) => "skipped_filter",
            DayOutcome::Failed => "failed",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            DayOutcome::Created(blocks) => join_blocks(blocks),
            DayOutcome::PartiallyCreated { created, failed } => format!(
                "created {}; failed {}",
                join_blocks(created),
                join_blocks(failed)
            ),
            DayOutcome::SkippedOverlap(range) => format!("Period overlap: {}", range),
            DayOutcome::SkippedLeave(name) => name.clone(),
            DayOutcome::SkippedNonLaborable(weekday) => weekday.clone(),
            DayOutcome::SkippedFilter(reason) => format!("Skipping: --{}", reason),
            DayOutcome::Failed => "Error when attempting to clock in".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayFilters {
    pub today_only: bool,
    pub until_today: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Interval checked against recorded shifts.
    pub requested: Interval,
    pub filters: DayFilters,
    pub today: NaiveDate,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub day: u32,
    pub date: NaiveDate,
    pub minutes_left: Decimal,
    pub outcome: DayOutcome,
}

pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// First recorded shift of `day` that conflicts with `requested`.
///
/// An open shift (no clock-out yet) conflicts when it started inside `requested`.
pub fn find_overlap<'s>(
    day: u32,
    requested: &Interval,
    shifts: &'s [ExistingShift],
) -> Option<&'s ExistingShift> {
    shifts.iter().filter(|s| s.day == day).find(|s| {
        if let Some(existing) = s.interval() {
            return requested.overlaps(&existing);
        }
        match s.clock_in.parse::<ClockTime>() {
            Ok(start) if s.clock_out.is_empty() => {
                requested.start <= start && start < requested.end
            }
            _ => {
                warn!(
                    "Ignoring shift {} on day {} with unreadable times '{}'",
                    s.id,
                    day,
                    s.time_range()
                );
                false
            }
        }
    })
}

/// Returns the skip outcome for `day`, or `None` when a shift should be created.
///
/// Checks run in a fixed order: overlap, leave, laborable, filters.
pub fn classify_day(
    day: &CalendarDay,
    shifts: &[ExistingShift],
    options: &ReconcileOptions,
) -> Option<DayOutcome> {
    if let Some(existing) = find_overlap(day.day, &options.requested, shifts) {
        return Some(DayOutcome::SkippedOverlap(existing.time_range()));
    }
    if day.is_leave {
        return Some(DayOutcome::SkippedLeave(day.leave_name.clone()));
    }
    if !day.is_laborable {
        return Some(DayOutcome::SkippedNonLaborable(weekday_name(day.date)));
    }
    let today = options.today.day();
    if options.filters.today_only && day.day != today {
        return Some(DayOutcome::SkippedFilter(FilterReason::Today));
    }
    if options.filters.until_today && day.day > today {
        return Some(DayOutcome::SkippedFilter(FilterReason::UntilToday));
    }
    None
}

/// Decides and submits shifts day by day, strictly in calendar order.
pub struct ReconciliationEngine<'a, A: ?Sized> {
    api: &'a A,
    schedule: SchedulePolicy,
    location_type: String,
    source: String,
}

impl<'a, A: AttendanceApi + ?Sized> ReconciliationEngine<'a, A> {
    pub fn new(api: &'a A, schedule: SchedulePolicy) -> Self {
        Self {
            api,
            schedule,
            location_type: DEFAULT_LOCATION_TYPE.to_string(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    pub fn with_location_type(mut self, location_type: impl Into<String>) -> Self {
        self.location_type = location_type.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// One payload per schedule block of `day`.
    pub fn build_requests(&self, day: &CalendarDay, employee_id: i64) -> Vec<ShiftRequest> {
        self.schedule
            .blocks_for(day.date)
            .iter()
            .map(|block| ShiftRequest {
                clock_in: block.start,
                clock_out: block.end,
                day: day.day,
                employee_id,
                workable: true,
                location_type: self.location_type.clone(),
                time_settings_break_configuration_id: None,
                minutes: None,
                date: day.date,
                source: self.source.clone(),
                reference_date: day.date,
            })
            .collect()
    }

    /// Reconciles every calendar day, calling `on_day` as each one finishes.
    pub async fn reconcile<F>(
        &self,
        month: &MonthContext,
        options: &ReconcileOptions,
        mut on_day: F,
    ) -> Vec<DayReport>
    where
        F: FnMut(&DayReport),
    {
        let mut reports = Vec::with_capacity(month.calendar.len());
        for day in &month.calendar {
            let outcome = match classify_day(day, &month.shifts, options) {
                Some(skip) => skip,
                None if options.dry_run => {
                    DayOutcome::Created(self.schedule.blocks_for(day.date).to_vec())
                }
                None => self.submit_day(day, month.period.employee_id).await,
            };
            debug!("Day {} ({}): {:?}", day.day, day.date, outcome);

            let report = DayReport {
                day: day.day,
                date: day.date,
                minutes_left: day.minutes_left,
                outcome,
            };
            on_day(&report);
            reports.push(report);
        }
        reports
    }

    async fn submit_day(&self, day: &CalendarDay, employee_id: i64) -> DayOutcome {
        let mut created = Vec::new();
        let mut failed = Vec::new();

        for request in self.build_requests(day, employee_id) {
            let block = Interval::new(request.clock_in, request.clock_out);
            match create_shift(self.api, &request).await {
                Ok(()) => {
                    info!("Created shift {} on {}", block, day.date);
                    created.push(block);
                }
                Err(e) => {
                    error!("Failed to create shift {} on {}: {}", block, day.date, e);
                    failed.push(block);
                }
            }
        }

        match (created.is_empty(), failed.is_empty()) {
            (true, _) => DayOutcome::Failed,
            (false, true) => DayOutcome::Created(created),
            (false, false) => DayOutcome::PartiallyCreated { created, failed },
        }
    }
}
