// src/report.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use std::io;

use crate::reconcile::{DayOutcome, DayReport};
use crate::reset::{ResetOutcome, ResetReport};

fn line_prefix(date: NaiveDate) -> String {
    format!("{}...", date.format("%d %b"))
}

/// One terminal line per day, e.g. `03 Mar... ✅ 09:00 - 14:15, 15:00 - 18:00`.
pub fn format_day_line(report: &DayReport) -> String {
    let prefix = line_prefix(report.date);
    match &report.outcome {
        DayOutcome::Created(_) => format!(
            "{} ✅ {} ({} min left)",
            prefix,
            report.outcome.detail(),
            report.minutes_left.normalize()
        ),
        DayOutcome::PartiallyCreated { .. } => {
            format!("{} ⚠️ Partially clocked in: {}", prefix, report.outcome.detail())
        }
        _ => format!("{} ❌ {}", prefix, report.outcome.detail()),
    }
}

pub fn format_reset_line(report: &ResetReport, year: i32, month: u32) -> String {
    let prefix = NaiveDate::from_ymd_opt(year, month, report.shift.day)
        .map(line_prefix)
        .unwrap_or_else(|| format!("Day {}...", report.shift.day));
    match &report.outcome {
        ResetOutcome::Deleted => {
            format!("{} ✅ Shift deleted: {}", prefix, report.shift.time_range())
        }
        ResetOutcome::Failed(_) => format!(
            "{} ❌ Error when attempting to delete shift: {}",
            prefix,
            report.shift.time_range()
        ),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub partial: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Remaining quota of the days that got at least one shift.
    pub covered_minutes: Decimal,
}

impl ReconcileSummary {
    pub fn from_reports(reports: &[DayReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match report.outcome {
                DayOutcome::Created(_) => summary.created += 1,
                DayOutcome::PartiallyCreated { .. } => summary.partial += 1,
                DayOutcome::Failed => summary.failed += 1,
                _ => summary.skipped += 1,
            }
            if matches!(
                report.outcome,
                DayOutcome::Created(_) | DayOutcome::PartiallyCreated { .. }
            ) {
                summary.covered_minutes += report.minutes_left;
            }
        }
        summary
    }

    pub fn covered_hours(&self) -> Decimal {
        (self.covered_minutes / dec!(60)).round_dp(2).normalize()
    }
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "done! {} created, {} partial, {} skipped, {} failed ({}h of remaining quota covered)",
            self.created,
            self.partial,
            self.skipped,
            self.failed,
            self.covered_hours()
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub deleted: usize,
    pub failed: usize,
}

impl ResetSummary {
    pub fn from_reports(reports: &[ResetReport]) -> Self {
        let failed = reports
            .iter()
            .filter(|r| matches!(r.outcome, ResetOutcome::Failed(_)))
            .count();
        Self {
            deleted: reports.len() - failed,
            failed,
        }
    }
}

impl fmt::Display for ResetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "done! {} deleted, {} failed", self.deleted, self.failed)
    }
}

#[derive(Debug, Serialize)]
struct DayRow<'a> {
    date: NaiveDate,
    day: u32,
    status: &'a str,
    detail: String,
    minutes_left: Decimal,
}

#[derive(Debug, Serialize)]
struct ResetRow<'a> {
    shift_id: i64,
    day: u32,
    clock_in: &'a str,
    clock_out: &'a str,
    status: &'a str,
    error: &'a str,
}

pub fn write_day_csv<W: io::Write>(writer: W, reports: &[DayReport]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for report in reports {
        wtr.serialize(DayRow {
            date: report.date,
            day: report.day,
            status: report.outcome.status(),
            detail: report.outcome.detail(),
            minutes_left: report.minutes_left,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_reset_csv<W: io::Write>(writer: W, reports: &[ResetReport]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for report in reports {
        let (status, error) = match &report.outcome {
            ResetOutcome::Deleted => ("deleted", ""),
            ResetOutcome::Failed(e) => ("failed", e.as_str()),
        };
        wtr.serialize(ResetRow {
            shift_id: report.shift.id,
            day: report.shift.day,
            clock_in: &report.shift.clock_in,
            clock_out: &report.shift.clock_out,
            status,
            error,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
