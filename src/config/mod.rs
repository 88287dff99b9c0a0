pub mod scenario;

use crate::utils::error::{DevReadyError, Result};
use crate::utils::validation::{parse_http_url, validate_positive_millis, Validate};
use std::time::Duration;
use url::Url;

/// Environment variable holding the dev server's base URL.
pub const DEV_ORIGIN_ENV: &str = "DEV_HTTP_ORIGIN";

/// Settings for reaching the dev server. Built once at process start and
/// handed to the broadcaster; nothing below this reads the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevConfig {
    pub origin: Option<String>,
    pub timeout: Option<Duration>,
}

impl DevConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_env() -> Self {
        Self {
            origin: std::env::var(DEV_ORIGIN_ENV).ok(),
            timeout: None,
        }
    }

    /// Explicit origin first, then the configured one. Only a missing explicit
    /// origin falls back; a blank one is rejected like a missing configuration.
    pub fn resolve_origin(&self, explicit: Option<&str>) -> Result<Url> {
        let origin = explicit
            .or(self.origin.as_deref())
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| DevReadyError::config("Dev server origin not set"))?;

        parse_http_url("origin", origin)
    }
}

/// `{origin}/ping`, tolerating a trailing slash on the origin.
pub fn ping_url(origin: &Url) -> Result<Url> {
    let base = origin.as_str().trim_end_matches('/');
    parse_http_url("origin", &format!("{}/ping", base))
}

impl Validate for DevConfig {
    fn validate(&self) -> Result<()> {
        if let Some(origin) = &self.origin {
            parse_http_url("origin", origin)?;
        }
        if let Some(timeout) = self.timeout {
            validate_positive_millis("timeout_ms", timeout)?;
        }
        Ok(())
    }
}
