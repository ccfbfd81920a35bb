// src/bootstrap.rs

use reqwest::StatusCode;
use std::fmt;
use tracing::{info, warn};

use crate::calendar::{load_calendar, CalendarDay};
use crate::factorial_client::{AttendanceApi, ClockInError, PeriodListing, PERIODS_PATH, SIGN_IN_PATH};
use crate::markup::SignInMarkup;
use crate::shifts::{load_shifts, ExistingShift};

pub const DEFAULT_RETURN_HOST: &str = "factorialhr.es";

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One employee's accounting month on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub employee_id: i64,
    pub period_id: i64,
    pub year: i32,
    pub month: u32,
}

/// Everything fetched before any decision is made.
#[derive(Debug, Clone)]
pub struct MonthContext {
    pub period: Period,
    pub calendar: Vec<CalendarDay>,
    pub shifts: Vec<ExistingShift>,
}

/// Signs in; afterwards the session cookie lives in `api`.
pub async fn login<A, M>(
    api: &A,
    markup: &M,
    credentials: &Credentials,
    return_host: &str,
) -> Result<(), ClockInError>
where
    A: AttendanceApi + ?Sized,
    M: SignInMarkup + ?Sized,
{
    let page = api.get(SIGN_IN_PATH, &[]).await?;
    let token = markup.csrf_token(&page.body).ok_or_else(|| {
        ClockInError::Protocol(format!(
            "csrf-token meta tag not found on sign-in page (Status={})",
            page.status
        ))
    })?;

    let form = [
        ("authenticity_token", token.as_str()),
        ("return_host", return_host),
        ("user[email]", credentials.email.as_str()),
        ("user[password]", credentials.password.as_str()),
        ("user[remember_me]", "0"),
        ("commit", "Sign in"),
    ];
    let response = api.post_form(SIGN_IN_PATH, &form).await?;

    if let Some(banner) = markup.login_error(&response.body) {
        warn!("Sign-in rejected for {}: {}", credentials.email, banner);
        return Err(ClockInError::Auth(banner));
    }
    if !response.status.is_success() {
        return Err(ClockInError::Auth(format!(
            "sign-in returned Status={}",
            response.status
        )));
    }

    info!("Signed in as {}", credentials.email);
    Ok(())
}

/// Finds the period listed for exactly `year`/`month`.
pub async fn resolve_period<A: AttendanceApi + ?Sized>(
    api: &A,
    year: i32,
    month: u32,
) -> Result<Period, ClockInError> {
    let not_found = ClockInError::PeriodNotFound { year, month };
    let query = [("year", year.to_string()), ("month", month.to_string())];
    let response = api.get(PERIODS_PATH, &query).await?;
    if response.status != StatusCode::OK {
        warn!("Period listing returned Status={}", response.status);
        return Err(not_found);
    }

    let listing: Vec<PeriodListing> = match serde_json::from_str(&response.body) {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Period listing could not be parsed: {}", e);
            return Err(not_found);
        }
    };
    listing
        .into_iter()
        .find(|p| p.year == year && p.month == month)
        .map(|p| Period {
            employee_id: p.employee_id,
            period_id: p.id,
            year: p.year,
            month: p.month,
        })
        .ok_or(not_found)
}

/// Runs sign-in, period resolution, calendar and shift loading, in that order.
///
/// The first failing stage aborts the rest.
pub async fn open_month<A, M>(
    api: &A,
    markup: &M,
    credentials: &Credentials,
    return_host: &str,
    year: i32,
    month: u32,
) -> Result<MonthContext, ClockInError>
where
    A: AttendanceApi + ?Sized,
    M: SignInMarkup + ?Sized,
{
    info!("Logging in...");
    login(api, markup, credentials, return_host).await?;

    info!("Getting periods data...");
    let period = resolve_period(api, year, month).await?;
    info!(
        "Resolved period {} for employee {}",
        period.period_id, period.employee_id
    );

    info!("Getting calendar data...");
    let calendar = load_calendar(api, period.employee_id, year, month).await?;

    info!("Getting shifts data...");
    let shifts = load_shifts(api, period.employee_id, year, month).await?;

    Ok(MonthContext {
        period,
        calendar,
        shifts,
    })
}
