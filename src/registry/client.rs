//! Blocking client for npm-style package registries.

use reqwest::blocking::Client;
use std::time::Duration;
use url::Url;

use crate::error::{Result, SproutError};

/// Public npm registry.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Environment variable overriding the registry URL.
pub const REGISTRY_ENV: &str = "SPROUT_REGISTRY";

/// Registry client for fetching package metadata.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    http: Client,
}

impl RegistryClient {
    /// Create a client for the given registry base URL.
    ///
    /// # Errors
    /// Returns [`SproutError::Registry`] if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        // Without a trailing slash `Url::join` would replace the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let parsed = Url::parse(&normalized)
            .map_err(|e| SproutError::registry(base_url, format!("invalid registry URL: {e}")))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("sprout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SproutError::registry(base_url, format!("failed to build client: {e}")))?;

        Ok(Self {
            base_url: parsed,
            http,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the HTTP client (reused for tarball downloads).
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// URL of the metadata document for `name`.
    ///
    /// Scoped names keep their `@` and have the `/` encoded.
    pub fn package_url(&self, name: &str) -> Result<Url> {
        let encoded = if name.starts_with('@') {
            name.replace('/', "%2F")
        } else {
            name.to_string()
        };
        self.base_url
            .join(&encoded)
            .map_err(|e| SproutError::registry(name, format!("failed to build URL: {e}")))
    }

    /// Fetch the metadata document for a package.
    ///
    /// Returns `Ok(None)` when the registry answers with a non-success status,
    /// which is how an unknown package shows up.
    ///
    /// # Errors
    /// Returns [`SproutError::Registry`] if the request cannot be sent or the
    /// body is not JSON.
    pub fn fetch_metadata(&self, name: &str) -> Result<Option<serde_json::Value>> {
        let url = self.package_url(name)?;
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(url.as_str())
            .send()
            .map_err(|e| SproutError::registry(name, e))?;

        if !response.status().is_success() {
            tracing::debug!("registry returned {} for {}", response.status(), name);
            return Ok(None);
        }

        let json = response
            .json::<serde_json::Value>()
            .map_err(|e| SproutError::registry(name, format!("invalid metadata: {e}")))?;
        Ok(Some(json))
    }

    /// Fetch the metadata of a single published version.
    pub fn fetch_version_metadata(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<serde_json::Value>> {
        Ok(self
            .fetch_metadata(name)?
            .and_then(|meta| meta.get("versions")?.get(version).cloned()))
    }
}
