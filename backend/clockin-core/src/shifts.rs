// src/shifts.rs

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::factorial_client::{AttendanceApi, ClockInError, ShiftRecord, ShiftRequest, SHIFTS_PATH};
use crate::schedule::Interval;

/// A shift already recorded on the remote side.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingShift {
    pub id: i64,
    pub day: u32,
    pub clock_in: String,
    pub clock_out: String,
    pub source: Option<String>,
}

impl ExistingShift {
    /// `None` for open shifts (empty clock-out) or times that are not `HH:MM`.
    pub fn interval(&self) -> Option<Interval> {
        Interval::parse(&self.clock_in, &self.clock_out).ok()
    }

    pub fn time_range(&self) -> String {
        format!("{} - {}", self.clock_in, self.clock_out)
    }
}

impl From<ShiftRecord> for ExistingShift {
    fn from(record: ShiftRecord) -> Self {
        Self {
            id: record.id,
            day: record.day,
            clock_in: record.clock_in.unwrap_or_default(),
            clock_out: record.clock_out.unwrap_or_default(),
            source: record.source,
        }
    }
}

pub async fn load_shifts<A: AttendanceApi + ?Sized>(
    api: &A,
    employee_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<ExistingShift>, ClockInError> {
    let query = [
        ("employee_id", employee_id.to_string()),
        ("year", year.to_string()),
        ("month", month.to_string()),
    ];
    let records: Vec<ShiftRecord> = api.get(SHIFTS_PATH, &query).await?.json_if_ok("shifts")?;
    info!("Loaded {} existing shifts for {}/{}", records.len(), month, year);
    Ok(records.into_iter().map(ExistingShift::from).collect())
}

/// Submits one shift; only `201 Created` counts as success.
pub async fn create_shift<A: AttendanceApi + ?Sized>(
    api: &A,
    request: &ShiftRequest,
) -> Result<(), ClockInError> {
    let body = serde_json::to_value(request)?;
    debug!("Creating shift: {}", body);
    let response = api.post_json(SHIFTS_PATH, &body).await?;
    if response.status == StatusCode::CREATED {
        Ok(())
    } else {
        Err(ClockInError::Create {
            day: request.day,
            status: response.status,
        })
    }
}

/// Deletes one shift; only `204 No Content` counts as success.
pub async fn delete_shift<A: AttendanceApi + ?Sized>(api: &A, id: i64) -> Result<(), ClockInError> {
    let response = api.delete(&format!("{}/{}", SHIFTS_PATH, id)).await?;
    if response.status == StatusCode::NO_CONTENT {
        Ok(())
    } else {
        Err(ClockInError::Delete {
            id,
            status: response.status,
        })
    }
}
