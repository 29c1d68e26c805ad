//! Configuration for EDS clients.
//!
//! [`EdsConfig`] is assembled from `EDS_*` environment variables and hands the
//! directory client an already-built [`Credentials`] value plus the HTTP
//! settings for its transport. Missing credential variables are not an error
//! here; the client reports incomplete credentials when a lookup is attempted.

use crate::client::{HttpConfig, EDS_DEFAULT_CONNECT_TIMEOUT, EDS_DEFAULT_TIMEOUT};
use crate::Error;
use base64::{engine::general_purpose::STANDARD, Engine};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use validator::Validate;

/// Environment variable holding the EDS base URL
pub const ENV_EDS_URL: &str = "EDS_URL";
/// Environment variable holding the EDS service account
pub const ENV_EDS_USER: &str = "EDS_USER";
/// Environment variable holding the EDS service account password
pub const ENV_EDS_PASSWORD: &str = "EDS_PASSWORD";
/// Environment variable overriding the request timeout (seconds)
pub const ENV_EDS_TIMEOUT_SECS: &str = "EDS_TIMEOUT_SECS";
/// Environment variable overriding the connection timeout (seconds)
pub const ENV_EDS_CONNECT_TIMEOUT_SECS: &str = "EDS_CONNECT_TIMEOUT_SECS";
/// Environment variable toggling TLS certificate verification
pub const ENV_EDS_TLS_VERIFY: &str = "EDS_TLS_VERIFY";
/// Environment variable pointing at a custom CA certificate
pub const ENV_EDS_CA_CERT: &str = "EDS_CA_CERT";

/// Credentials for the directory service.
///
/// No normalization is performed; the client checks completeness before use.
#[derive(Debug, Clone)]
pub struct Credentials {
    base_url: String,
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials from their three parts.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Base URL that user ids are appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Service account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Service account password.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    /// Returns true when base URL, username and password are all non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.base_url.is_empty()
            && !self.username.is_empty()
            && !self.password.expose_secret().is_empty()
    }

    /// Renders the `Authorization` header value: `Basic base64(username:password)`.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let pair = format!("{}:{}", self.username, self.password.expose_secret());
        format!("Basic {}", STANDARD.encode(pair))
    }
}

/// Configuration for an EDS client instance.
#[derive(Debug, Clone, Validate)]
pub struct EdsConfig {
    /// EDS base URL (`EDS_URL`)
    pub base_url: String,

    /// Service account (`EDS_USER`)
    pub username: String,

    /// Service account password (`EDS_PASSWORD`)
    pub password: SecretString,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 60))]
    pub connect_timeout_secs: u64,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    pub tls_ca_cert: Option<PathBuf>,
}

impl EdsConfig {
    /// Create a configuration with explicit credentials and default transport settings.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            request_timeout_secs: EDS_DEFAULT_TIMEOUT,
            connect_timeout_secs: EDS_DEFAULT_CONNECT_TIMEOUT,
            tls_verify: true,
            tls_ca_cert: None,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if an optional setting is present but
    /// cannot be parsed or is out of range.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if an optional setting is present but
    /// cannot be parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or_else(|| {
                warn!("{key} is not set; EDS lookups will be rejected");
                String::new()
            })
        };

        let mut config = Self::new(
            required(ENV_EDS_URL),
            required(ENV_EDS_USER),
            required(ENV_EDS_PASSWORD),
        );

        if let Some(raw) = lookup(ENV_EDS_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_secs(ENV_EDS_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EDS_CONNECT_TIMEOUT_SECS) {
            config.connect_timeout_secs = parse_secs(ENV_EDS_CONNECT_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EDS_TLS_VERIFY) {
            config.tls_verify = parse_bool(ENV_EDS_TLS_VERIFY, &raw)?;
        }
        config.tls_ca_cert = lookup(ENV_EDS_CA_CERT)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Credentials handed to the directory client.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Transport settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let mut http = HttpConfig::new()
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_tls_verify(self.tls_verify);
        if let Some(path) = &self.tls_ca_cert {
            http = http.with_ca_cert(path.clone());
        }
        http
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| Error::ConfigError(format!("{key} must be a number of seconds: {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::ConfigError(format!(
            "{key} must be a boolean, got `{other}`"
        ))),
    }
}
