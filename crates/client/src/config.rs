//! Client configuration from the environment.

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin, without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
    pub search_debounce: Duration,
    /// Page size sent when a query does not set one; server default if `None`.
    pub per_page: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            per_page: None,
        }
    }
}

impl ClientConfig {
    /// Read `HMIS_BASE_URL`, `HMIS_HTTP_TIMEOUT_SECS`, `HMIS_SEARCH_DEBOUNCE_MS`
    /// and `HMIS_PER_PAGE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = match lookup("HMIS_BASE_URL") {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                tracing::warn!("HMIS_BASE_URL not set; using {DEFAULT_BASE_URL}");
                DEFAULT_BASE_URL.to_string()
            }
        };

        Self {
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "HMIS_HTTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
            search_debounce: Duration::from_millis(parse_or(
                &lookup,
                "HMIS_SEARCH_DEBOUNCE_MS",
                DEFAULT_SEARCH_DEBOUNCE_MS,
            )),
            per_page: lookup("HMIS_PER_PAGE").and_then(|raw| match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid HMIS_PER_PAGE");
                    None
                }
            }),
            ..Self::default()
        }
        .with_base_url(base_url)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "invalid {key}; using default {default}");
            default
        }),
    }
}
