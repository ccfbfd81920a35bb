// src/factorial_client.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::schedule::ClockTime;

pub const FACTORIAL_BASE_URL: &str = "https://api.factorialhr.com";
pub const SIGN_IN_PATH: &str = "/users/sign_in";
pub const PERIODS_PATH: &str = "/attendance/periods";
pub const CALENDAR_PATH: &str = "/attendance/calendar";
pub const SHIFTS_PATH: &str = "/attendance/shifts";

// --- Factorial API Data Structures ---

// Entry of the period listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodListing {
    pub id: i64,
    pub employee_id: i64,
    pub year: i32,
    pub month: u32,
}

// The same endpoint queried with a date window also carries the per-day estimates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDistribution {
    pub id: Option<i64>,
    pub employee_id: Option<i64>,
    pub start_on: Option<NaiveDate>,
    pub end_on: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_regular_minutes_distribution: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub day: u32,
    pub date: NaiveDate,
    pub is_laborable: bool,
    pub is_leave: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub leave_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub id: i64,
    pub day: u32,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    pub location_type: Option<String>,
    pub source: Option<String>,
    pub minutes: Option<i64>,
}

/// Body of `POST /attendance/shifts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRequest {
    pub clock_in: ClockTime,
    pub clock_out: ClockTime,
    pub day: u32,
    pub employee_id: i64,
    pub workable: bool,
    pub location_type: String,
    pub time_settings_break_configuration_id: Option<i64>,
    pub minutes: Option<i64>,
    pub date: NaiveDate,
    pub source: String,
    pub reference_date: NaiveDate,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ClockInError {
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error")]
    UrlParse(#[from] url::ParseError),

    #[error("Login failed: {0}")]
    Auth(String),

    #[error("Unexpected page structure: {0}")]
    Protocol(String),

    #[error("Could not find the specified year/month in the available periods ({month}/{year})")]
    PeriodNotFound { year: i32, month: u32 },

    #[error("Error retrieving {resource} data: Status={status}")]
    Fetch {
        resource: &'static str,
        status: StatusCode,
    },

    #[error("Minutes distribution is missing from the period response")]
    MissingDistribution,

    #[error("Calendar has {calendar_days} days but the minutes distribution has {quota_days}")]
    QuotaMismatch {
        calendar_days: usize,
        quota_days: usize,
    },

    #[error("Shift creation for day {day} failed: Status={status}")]
    Create { day: u32, status: StatusCode },

    #[error("Shift {id} deletion failed: Status={status}")]
    Delete { id: i64, status: StatusCode },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Status and body of one completed exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Deserializes a 200 body, or reports `Fetch` for any other status.
    pub fn json_if_ok<T: DeserializeOwned>(
        &self,
        resource: &'static str,
    ) -> Result<T, ClockInError> {
        if self.status != StatusCode::OK {
            return Err(ClockInError::Fetch {
                resource,
                status: self.status,
            });
        }
        serde_json::from_str(&self.body).map_err(|e| {
            error!("JSON deserialization failed for '{}': {}", resource, e);
            ClockInError::Json(e)
        })
    }
}

/// Everything the bookkeeping pipeline needs from an authenticated session.
///
/// Implementations own the cookie jar; callers never see it.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, ClockInError>;

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse, ClockInError>;

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ApiResponse, ClockInError>;

    async fn delete(&self, path: &str) -> Result<ApiResponse, ClockInError>;
}

#[derive(Clone, Debug)]
pub struct FactorialConfig {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
}

impl Default for FactorialConfig {
    fn default() -> Self {
        Self {
            base_url: FACTORIAL_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

// Factorial API Client Implementation
#[derive(Clone)]
pub struct FactorialClient {
    base_url: Url,
    http_client: Client,
}

impl FactorialClient {
    pub fn new(config: FactorialConfig) -> Result<Self, ClockInError> {
        let base_url = Url::parse(&config.base_url)?;
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ClockInError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, ClockInError> {
        let url = self.build_url(path, query)?;
        Ok(self.http_client.request(method, url))
    }

    async fn send(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<ApiResponse, ClockInError> {
        let request = request_builder.build().map_err(|e| {
            error!("Request build failed for '{}': {}", context_msg, e);
            ClockInError::Request(e)
        })?;
        let request_url = request.url().to_string();
        debug!(
            "Sending {} request for '{}' to URL: {}",
            request.method(),
            context_msg,
            request_url
        );

        let resp = self.http_client.execute(request).await.map_err(|e| {
            error!(
                "HTTP execution failed before receiving response for '{}' (URL: {}): {}",
                context_msg, request_url, e
            );
            ClockInError::Request(e)
        })?;

        let status = resp.status();
        info!(
            "Received response for '{}' (URL: {}): Status={}",
            context_msg, request_url, status
        );

        let bytes = resp.bytes().await.map_err(|e| {
            error!(
                "Failed to read response body bytes for '{}': {}",
                context_msg, e
            );
            ClockInError::Request(e)
        })?;

        let body = match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                warn!(
                    "Response body for '{}' is not valid UTF-8. Logging hex.",
                    context_msg
                );
                debug!("Raw Response Body (Hex) for '{}': {}", context_msg, hex::encode(&bytes));
                String::from_utf8_lossy(&bytes).into_owned()
            }
        };

        if !status.is_success() {
            warn!(
                "API Error Response: Status={}, Body='{}' for URL: {}",
                status, body, request_url
            );
        }

        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl AttendanceApi for FactorialClient {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, ClockInError> {
        let request = self
            .build_request(Method::GET, path, query)?
            .header(ACCEPT, "application/json, text/html");
        self.send(request, path).await
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse, ClockInError> {
        let request = self.build_request(Method::POST, path, &[])?.form(form);
        self.send(request, path).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ApiResponse, ClockInError> {
        let request = self
            .build_request(Method::POST, path, &[])?
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json;charset=UTF-8")
            .body(serde_json::to_vec(body)?);
        self.send(request, path).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse, ClockInError> {
        let request = self.build_request(Method::DELETE, path, &[])?;
        self.send(request, path).await
    }
}
