// src/reset.rs

use tracing::{error, info};

use crate::factorial_client::AttendanceApi;
use crate::shifts::{delete_shift, ExistingShift};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Deleted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResetReport {
    pub shift: ExistingShift,
    pub outcome: ResetOutcome,
}

/// Deletes every shift in the given order. A failed delete never stops the rest.
///
/// On a dry run nothing is sent and every shift reports `Deleted`.
pub async fn reset_month<A, F>(
    api: &A,
    shifts: &[ExistingShift],
    dry_run: bool,
    mut on_shift: F,
) -> Vec<ResetReport>
where
    A: AttendanceApi + ?Sized,
    F: FnMut(&ResetReport),
{
    let mut reports = Vec::with_capacity(shifts.len());
    for shift in shifts {
        let outcome = if dry_run {
            info!("Dry run: would delete shift {} ({})", shift.id, shift.time_range());
            ResetOutcome::Deleted
        } else {
            match delete_shift(api, shift.id).await {
                Ok(()) => {
                    info!(
                        "Deleted shift {} ({}) on day {}",
                        shift.id,
                        shift.time_range(),
                        shift.day
                    );
                    ResetOutcome::Deleted
                }
                Err(e) => {
                    error!("Failed to delete shift {}: {}", shift.id, e);
                    ResetOutcome::Failed(e.to_string())
                }
            }
        };
        let report = ResetReport {
            shift: shift.clone(),
            outcome,
        };
        on_shift(&report);
        reports.push(report);
    }
    reports
}
