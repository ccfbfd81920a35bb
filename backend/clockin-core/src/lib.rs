// src/lib.rs

pub mod bootstrap;
pub mod calendar;
pub mod config;
pub mod factorial_client;
pub mod markup;
pub mod reconcile;
pub mod report;
pub mod reset;
pub mod schedule;
pub mod shifts;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod reconcile_tests;

pub use bootstrap::{open_month, Credentials, MonthContext, Period};
pub use factorial_client::{AttendanceApi, ClockInError, FactorialClient, FactorialConfig};
pub use reconcile::{DayFilters, DayOutcome, DayReport, ReconcileOptions, ReconciliationEngine};
pub use reset::{reset_month, ResetOutcome, ResetReport};
pub use schedule::{ClockTime, Interval, SchedulePolicy};
