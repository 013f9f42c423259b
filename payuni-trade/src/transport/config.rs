//! `[http]` section of the client configuration.

use std::{ops::RangeInclusive, time::Duration};

use serde::Deserialize;

use crate::error::{Result, TradeError};

/// Accepted request timeouts, in seconds.
pub const TIMEOUT_RANGE: RangeInclusive<u64> = 1..=300;

/// Accepted connect timeouts, in seconds.
pub const CONNECT_TIMEOUT_RANGE: RangeInclusive<u64> = 1..=60;

/// HTTP client settings.
///
/// Every key is optional in TOML:
///
/// ```toml
/// [http]
/// timeout_secs = 20
/// http_version = "http1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Idle pooled connections kept per gateway host.
    pub pool_max_idle_per_host: usize,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// TCP and TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP version preference.
    pub http_version: HttpVersion,
    /// Accept `http://` and loopback base URLs. Local test gateways only.
    pub allow_insecure_http: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            http_version: HttpVersion::Auto,
            allow_insecure_http: false,
        }
    }
}

impl HttpConfig {
    /// Checks both timeouts against [`TIMEOUT_RANGE`] and
    /// [`CONNECT_TIMEOUT_RANGE`].
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        check_range("timeout_secs", self.timeout_secs, &TIMEOUT_RANGE)?;
        check_range("connect_timeout_secs", self.connect_timeout_secs, &CONNECT_TIMEOUT_RANGE)
    }

    /// Whole-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn check_range(key: &str, value: u64, range: &RangeInclusive<u64>) -> Result<()> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(TradeError::Config(format!(
        "{key} must be between {} and {}, got {value}",
        range.start(),
        range.end()
    )))
}

/// HTTP version preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 with prior knowledge.
    Http2,
    /// Whatever ALPN negotiates.
    #[default]
    Auto,
}
