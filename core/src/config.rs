//! Base URL resolution.
//!
//! The override comes from `INVOICES_API_BASE_URL`. Resolution itself is a
//! pure function over the raw value so it can be tested without touching
//! the process environment.

use std::env;

/// Environment variable that overrides the API origin.
pub const BASE_URL_ENV: &str = "INVOICES_API_BASE_URL";

/// Origin used when no override is set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Normalize a raw override: surrounding whitespace and trailing slashes are
/// dropped, and an unset or empty value falls back to `DEFAULT_BASE_URL`.
pub fn resolve_base_url(raw: Option<&str>) -> String {
    let trimmed = raw.map(|value| value.trim().trim_end_matches('/')).unwrap_or("");
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: resolve_base_url(Some(base_url)),
        }
    }

    /// Read the base URL override from the environment.
    pub fn from_env() -> Self {
        let raw = env::var(BASE_URL_ENV).ok();
        Self {
            base_url: resolve_base_url(raw.as_deref()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}
