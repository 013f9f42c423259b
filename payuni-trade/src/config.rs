//! Client configuration.
//!
//! A [`ClientConfig`] fixes the merchant key, IV and gateway base URL for
//! the lifetime of a [`TradeClient`](crate::trade::TradeClient). It can be
//! built in code, read from `PAYUNI_*` environment variables, or parsed
//! from TOML:
//!
//! ```toml
//! key = "12345678901234567890123456789012"
//! iv = "1234567890123456"
//! environment = "sandbox"
//!
//! [http]
//! timeout_secs = 20
//! ```

use std::{fmt, path::Path, str::FromStr};

use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::{
    envelope::MerchantKeys,
    error::{Result, TradeError},
    transport::HttpConfig,
};

/// Production API base URL.
pub const PRODUCTION_BASE_URL: &str = "https://api.payuni.com.tw/api/";

/// Sandbox API base URL.
pub const SANDBOX_BASE_URL: &str = "https://sandbox-api.payuni.com.tw/api/";

/// Gateway environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Live gateway.
    #[default]
    Production,
    /// Test gateway.
    #[serde(alias = "t")]
    Sandbox,
}

impl Environment {
    /// API base URL of this environment.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_BASE_URL,
            Self::Sandbox => SANDBOX_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = TradeError;

    /// Accepts `t` or `sandbox` for the test gateway and an empty string or
    /// `production` for the live one.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "sandbox" => Ok(Self::Sandbox),
            "" | "production" => Ok(Self::Production),
            other => Err(TradeError::Config(format!("unknown environment: {other}"))),
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    key: String,
    iv: String,
    #[serde(default)]
    environment: Environment,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    http: HttpConfig,
}

/// Immutable configuration of a trade client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Merchant key and IV.
    pub keys: MerchantKeys,
    /// Gateway environment.
    pub environment: Environment,
    /// Overrides the environment base URL when set.
    pub base_url: Option<String>,
    /// Transport settings.
    pub http: HttpConfig,
}

impl ClientConfig {
    /// Creates a configuration with default transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] if the trimmed key is not 32 bytes or
    /// the trimmed IV is not 16 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use payuni_trade::config::{ClientConfig, Environment};
    ///
    /// let config = ClientConfig::new(
    ///     "12345678901234567890123456789012",
    ///     "1234567890123456",
    ///     Environment::Sandbox,
    /// )?;
    /// assert_eq!(config.base_url(), "https://sandbox-api.payuni.com.tw/api/");
    /// # Ok::<(), payuni_trade::TradeError>(())
    /// ```
    pub fn new(key: &str, iv: &str, environment: Environment) -> Result<Self> {
        Ok(Self {
            keys: MerchantKeys::new(key, iv)?,
            environment,
            base_url: None,
            http: HttpConfig::default(),
        })
    }

    /// Overrides the gateway base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Replaces the transport settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Effective gateway base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(self.environment.base_url())
    }

    /// Reads configuration from the process environment.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `PAYUNI_KEY` | merchant key (required) |
    /// | `PAYUNI_IV` | merchant IV (required) |
    /// | `PAYUNI_ENV` | `t`/`sandbox` or `production` (default) |
    /// | `PAYUNI_BASE_URL` | base URL override |
    /// | `PAYUNI_TIMEOUT_SECS` | request timeout |
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] if a required variable is missing or
    /// any value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &str| {
            lookup(name)
                .map(Zeroizing::new)
                .ok_or_else(|| TradeError::Config(format!("{name} is not set")))
        };
        let key = require("PAYUNI_KEY")?;
        let iv = require("PAYUNI_IV")?;

        let environment = match lookup("PAYUNI_ENV") {
            Some(value) => value.parse::<Environment>()?,
            None => Environment::Production,
        };
        let mut config = Self::new(&key, &iv, environment)?;

        if let Some(base_url) = lookup("PAYUNI_BASE_URL").filter(|s| !s.trim().is_empty()) {
            config.base_url = Some(base_url);
        }
        if let Some(timeout) = lookup("PAYUNI_TIMEOUT_SECS") {
            config.http.timeout_secs = timeout.trim().parse().map_err(|_| {
                TradeError::Config(format!("PAYUNI_TIMEOUT_SECS is not a number: {timeout}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] if the TOML is malformed or any value
    /// is invalid.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| TradeError::Config(format!("invalid TOML: {e}")))?;
        let key = Zeroizing::new(file.key);
        let iv = Zeroizing::new(file.iv);

        let config = Self {
            keys: MerchantKeys::new(&key, &iv)?,
            environment: file.environment,
            base_url: file.base_url,
            http: file.http,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            TradeError::Config(format!("cannot read {}: {e}", path.display()))
        })?);
        Self::from_toml(&text)
    }

    /// Validates the base URL and transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] for an unparsable or non-HTTPS base
    /// URL (HTTP is allowed with `allow_insecure_http`) or out-of-range
    /// timeouts.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(self.base_url()).map_err(|e| {
            TradeError::Config(format!("invalid base_url '{}': {e}", self.base_url()))
        })?;

        match url.scheme() {
            "https" => {}
            "http" if self.http.allow_insecure_http => {}
            other => {
                return Err(TradeError::Config(format!("base_url must use HTTPS, got: {other}")));
            }
        }

        self.http.validate()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("keys", &self.keys)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url())
            .field("http", &self.http)
            .finish()
    }
}
