// src/test_support.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::bootstrap::{MonthContext, Period};
use crate::calendar::CalendarDay;
use crate::factorial_client::{
    ApiResponse, AttendanceApi, ClockInError, ShiftRequest, SHIFTS_PATH,
};
use crate::shifts::ExistingShift;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
}

impl RecordedRequest {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory `AttendanceApi` with scripted responses per method and path.
///
/// Responses for a route are served in order; the last one repeats. Routes
/// without a script answer `404`.
#[derive(Default)]
pub struct FakeApi {
    scripts: Mutex<HashMap<(&'static str, String), VecDeque<ApiResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &'static str, path: &str, status: u16, body: &str) -> &Self {
        let status = StatusCode::from_u16(status).expect("valid status in test script");
        self.scripts
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(ApiResponse::new(status, body));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn routes(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn posted_shifts(&self) -> Vec<ShiftRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "POST" && r.path == SHIFTS_PATH)
            .filter_map(|r| r.json)
            .map(|v| serde_json::from_value(v).expect("posted body is a ShiftRequest"))
            .collect()
    }

    fn record(&self, request: RecordedRequest) -> ApiResponse {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => ApiResponse::new(StatusCode::NOT_FOUND, ""),
        }
    }
}

#[async_trait]
impl AttendanceApi for FakeApi {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, ClockInError> {
        Ok(self.record(RecordedRequest {
            method: "GET",
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            form: Vec::new(),
            json: None,
        }))
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse, ClockInError> {
        Ok(self.record(RecordedRequest {
            method: "POST",
            path: path.to_string(),
            query: Vec::new(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            json: None,
        }))
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ApiResponse, ClockInError> {
        Ok(self.record(RecordedRequest {
            method: "POST",
            path: path.to_string(),
            query: Vec::new(),
            form: Vec::new(),
            json: Some(body.clone()),
        }))
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse, ClockInError> {
        Ok(self.record(RecordedRequest {
            method: "DELETE",
            path: path.to_string(),
            query: Vec::new(),
            form: Vec::new(),
            json: None,
        }))
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

pub fn working_day(iso: &str) -> CalendarDay {
    let date = date(iso);
    CalendarDay {
        day: chrono::Datelike::day(&date),
        date,
        is_laborable: true,
        is_leave: false,
        leave_name: String::new(),
        minutes_left: Decimal::new(480, 0),
    }
}

pub fn day_off(iso: &str) -> CalendarDay {
    CalendarDay {
        is_laborable: false,
        minutes_left: Decimal::ZERO,
        ..working_day(iso)
    }
}

pub fn shift(id: i64, day: u32, clock_in: &str, clock_out: &str) -> ExistingShift {
    ExistingShift {
        id,
        day,
        clock_in: clock_in.to_string(),
        clock_out: clock_out.to_string(),
        source: Some("desktop".to_string()),
    }
}

pub fn march_2025(calendar: Vec<CalendarDay>, shifts: Vec<ExistingShift>) -> MonthContext {
    MonthContext {
        period: Period {
            employee_id: 42,
            period_id: 77,
            year: 2025,
            month: 3,
        },
        calendar,
        shifts,
    }
}
