//! HTTP transport settings.
//!
//! The core performs one request per lookup. Timeouts and TLS handling are
//! the only knobs. There is no retry policy and no connection pool.

use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for a complete EDS request (seconds)
pub const EDS_DEFAULT_TIMEOUT: u64 = 15;

/// Default timeout for establishing the TCP/TLS connection (seconds)
pub const EDS_DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,

    /// Optional path to a custom CA certificate (PEM)
    pub tls_ca_cert: Option<PathBuf>,
}

impl HttpConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(EDS_DEFAULT_TIMEOUT),
            connect_timeout: Duration::from_secs(EDS_DEFAULT_CONNECT_TIMEOUT),
            tls_verify: true,
            tls_ca_cert: None,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable TLS certificate verification.
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
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}
