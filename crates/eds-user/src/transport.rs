//! HTTP transport for EDS lookups.

use async_trait::async_trait;
use eds_core::client::HttpConfig;
use eds_core::{Error, Result};
use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("eds-user/", env!("CARGO_PKG_VERSION"));

/// Performs the single authenticated GET behind a lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` with the given `Authorization` header value and returns
    /// the raw response body.
    async fn get(&self, url: &str, authorization: &str) -> Result<Vec<u8>>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Builds the HTTP client from transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the CA certificate cannot be loaded or
    /// the client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(0);

        if !config.tls_verify {
            warn!("TLS verification disabled for EDS transport");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &config.tls_ca_cert {
            debug!("loading EDS CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read EDS CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid EDS CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build EDS HTTP client: {err}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, authorization: &str) -> Result<Vec<u8>> {
        debug!(url = %url, "sending EDS request");

        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_to_error(status, &message));
        }

        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "EDS response received");
        Ok(body.to_vec())
    }
}

/// [`Transport`] for clients that only resolve documents loaded from
/// elsewhere. Every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn get(&self, url: &str, _authorization: &str) -> Result<Vec<u8>> {
        Err(Error::ConfigError(format!(
            "no transport configured; cannot request {url}"
        )))
    }
}

fn map_status_to_error(status: StatusCode, message: &str) -> Error {
    let message = message.trim();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::http_status(
            status.as_u16(),
            format!("EDS authentication failed ({status}): {message}"),
        ),
        StatusCode::NOT_FOUND => {
            Error::http_status(status.as_u16(), format!("EDS entry not found: {message}"))
        }
        _ => Error::http_status(status.as_u16(), format!("EDS error {status}: {message}")),
    }
}
