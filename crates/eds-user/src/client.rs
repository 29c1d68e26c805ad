//! Directory client: credentials, one fetch, and record resolution.

use crate::mapping::AttributeMapping;
use crate::record::{DirectoryRecord, FieldValue};
use crate::resolver::{FieldOverride, FieldResolver, OverrideRegistry};
use crate::transport::{HttpTransport, OfflineTransport, Transport};
use eds_core::client::HttpConfig;
use eds_core::{Credentials, EdsConfig, Error, Result};
use eds_dsml::ResponseDocument;
use std::fmt;
use tracing::{debug, info};
use url::Url;

/// Looks a person up in EDS and resolves the response into a
/// [`DirectoryRecord`].
///
/// A client holds at most one response document. Fetching or loading a new
/// one replaces it; resolving never touches the network.
pub struct DirectoryClient {
    credentials: Option<Credentials>,
    mapping: AttributeMapping,
    overrides: OverrideRegistry,
    transport: Box<dyn Transport>,
    document: Option<ResponseDocument>,
}

impl DirectoryClient {
    /// Creates a client with the default mapping, the built-in overrides and
    /// an HTTP transport using default settings. Credentials must be set
    /// before [`fetch`](Self::fetch).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let transport = HttpTransport::new(&HttpConfig::default())?;
        Ok(Self::with_transport(Box::new(transport)))
    }

    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            credentials: None,
            mapping: AttributeMapping::default(),
            overrides: OverrideRegistry::builtin(),
            transport,
            document: None,
        }
    }

    /// Creates a client over a DSML body obtained elsewhere, with no network
    /// transport. [`fetch`](Self::fetch) always fails on such a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the body is not well-formed DSML.
    pub fn from_dsml(raw: impl Into<Vec<u8>>) -> Result<Self> {
        let mut client = Self::with_transport(Box::new(OfflineTransport));
        client.load_dsml(raw)?;
        Ok(client)
    }

    /// Creates a client with credentials and transport settings from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the HTTP client cannot be built.
    pub fn from_config(config: &EdsConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.http_config())?;
        let mut client = Self::with_transport(Box::new(transport));
        client.set_credentials(config.credentials());
        Ok(client)
    }

    /// Fetches `user_id` with the settings in `config` and resolves every
    /// mapped field to its first value.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`fetch`](Self::fetch).
    pub async fn retrieve_by_id(config: &EdsConfig, user_id: &str) -> Result<DirectoryRecord> {
        let mut client = Self::from_config(config)?;
        client.fetch(user_id).await?;
        client.resolve_all(true)
    }

    /// Stores credentials. Nothing is checked until [`validate`](Self::validate)
    /// or [`fetch`](Self::fetch).
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Stored credentials, if any.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns true when base URL, username and password are all non-empty.
    #[must_use]
    pub fn validate(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(Credentials::is_complete)
    }

    /// Performs `GET {base_url}/{user_id}` and stores the parsed response.
    ///
    /// On failure the previously stored document, if any, is kept.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigError`] if the credentials are incomplete or the base
    ///   URL is not an absolute URL
    /// - [`Error::InvalidRequest`] if `user_id` is empty
    /// - [`Error::TransportError`] if the request fails or returns a
    ///   non-success status
    /// - [`Error::ParseError`] if the body is not well-formed DSML
    pub async fn fetch(&mut self, user_id: &str) -> Result<()> {
        let credentials = match &self.credentials {
            Some(credentials) if credentials.is_complete() => credentials,
            _ => {
                return Err(Error::ConfigError(
                    "EDS credentials are incomplete: base URL, username and password are required"
                        .to_string(),
                ))
            }
        };
        if user_id.is_empty() {
            return Err(Error::InvalidRequest("user id must not be empty".to_string()));
        }

        let url = request_url(credentials.base_url(), user_id)?;
        debug!(url = %url, "fetching EDS entry");

        let body = self
            .transport
            .get(url.as_str(), &credentials.authorization_header())
            .await?;
        let document = ResponseDocument::build(body)?;

        info!(
            user_id = %user_id,
            entries = document.entry_count(),
            "EDS entry fetched"
        );
        self.document = Some(document);
        Ok(())
    }

    /// Parses and stores a DSML body obtained elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the body is not well-formed DSML; the
    /// previously stored document is kept.
    pub fn load_dsml(&mut self, raw: impl Into<Vec<u8>>) -> Result<()> {
        self.document = Some(ResponseDocument::build(raw)?);
        Ok(())
    }

    /// Bytes of the stored response.
    #[must_use]
    pub fn raw_dsml(&self) -> Option<&[u8]> {
        self.document.as_ref().map(ResponseDocument::as_bytes)
    }

    /// The stored response document.
    #[must_use]
    pub const fn document(&self) -> Option<&ResponseDocument> {
        self.document.as_ref()
    }

    /// Resolves every mapped field in mapping order.
    ///
    /// With `first_only` each mapped field holds its first value or `None`;
    /// without it each holds every value. Overridden fields always hold a
    /// single value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if no document has been fetched or loaded.
    pub fn resolve_all(&self, first_only: bool) -> Result<DirectoryRecord> {
        Ok(self.resolver()?.resolve_all(first_only))
    }

    /// Resolves one field; `Ok(None)` if it is neither mapped nor overridden.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if no document has been fetched or loaded.
    pub fn resolve_field(&self, field: &str, first_only: bool) -> Result<Option<FieldValue>> {
        Ok(self.resolver()?.resolve(field, first_only))
    }

    /// Adds or overwrites mapping entries. See [`AttributeMapping::extend`].
    pub fn extend_attributes<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.mapping.extend(entries);
    }

    /// Replaces the whole mapping.
    pub fn set_attributes(&mut self, mapping: AttributeMapping) {
        self.mapping = mapping;
    }

    /// The current mapping.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeMapping {
        &self.mapping
    }

    /// Adds or replaces the override for `field`, returning the old one.
    pub fn register_override(
        &mut self,
        field: impl Into<String>,
        resolver: FieldOverride,
    ) -> Option<FieldOverride> {
        self.overrides.register(field, resolver)
    }

    /// Removes the override for `field` so it resolves through the mapping.
    pub fn remove_override(&mut self, field: &str) -> Option<FieldOverride> {
        self.overrides.remove(field)
    }

    /// The registered overrides.
    #[must_use]
    pub const fn overrides(&self) -> &OverrideRegistry {
        &self.overrides
    }

    fn resolver(&self) -> Result<FieldResolver<'_>> {
        let document = self.document.as_ref().ok_or_else(|| {
            Error::ConfigError("no EDS response loaded; fetch a user first".to_string())
        })?;
        Ok(FieldResolver::new(document, &self.mapping, &self.overrides))
    }
}

impl fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("credentials", &self.credentials)
            .field("mapping", &self.mapping)
            .field("overrides", &self.overrides)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Appends `user_id` to `base_url` as one percent-encoded path segment.
fn request_url(base_url: &str, user_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|()| Error::ConfigError(format!("EDS base URL cannot carry a path: {base_url}")))?
        .pop_if_empty()
        .push(user_id);
    Ok(url)
}
