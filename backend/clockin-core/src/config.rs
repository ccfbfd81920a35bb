// src/config.rs

use serde::Deserialize;
use std::time::Duration;

use crate::bootstrap::DEFAULT_RETURN_HOST;
use crate::factorial_client::{FactorialConfig, FACTORIAL_BASE_URL};
use crate::reconcile::{DEFAULT_LOCATION_TYPE, DEFAULT_SOURCE};

pub const ENV_PREFIX: &str = "CLOCKIN_";

/// Settings read from `CLOCKIN_*` environment variables (and `.env`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_return_host")]
    pub return_host: String,
    #[serde(default = "default_location_type")]
    pub location_type: String,
    #[serde(default = "default_source")]
    pub source: String,
    /// Unset keeps the transport's own default.
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    FACTORIAL_BASE_URL.to_string()
}

fn default_return_host() -> String {
    DEFAULT_RETURN_HOST.to_string()
}

fn default_location_type() -> String {
    DEFAULT_LOCATION_TYPE.to_string()
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        envy::prefixed(ENV_PREFIX).from_env::<AppConfig>()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    pub fn factorial_config(&self) -> FactorialConfig {
        FactorialConfig {
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}
