//! HTTP access to the booking service
//!
//! This module provides the client used for both upstream calls of a
//! collection cycle:
//! - [`catalog`] - the region catalog (places, agendas, vaccination types)
//! - [`availability`] - next appointment dates per (center, vaccination type)
//!
//! Both go through [`DoctolibClient`], which owns one connection pool, applies
//! the per-request timeout, and maps transport, status and decode failures to
//! distinct [`FetchError`] variants.

pub mod availability;
pub mod catalog;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::utils::error::FetchError;

pub use availability::{AvailabilityClient, AvailabilityQuery};
pub use catalog::CatalogClient;

/// Everything a collection cycle needs from the upstream
pub trait BookingApi: CatalogClient + AvailabilityClient {}

impl<T: CatalogClient + AvailabilityClient + ?Sized> BookingApi for T {}

/// Booking service client
#[derive(Debug, Clone)]
pub struct DoctolibClient {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Base URL, always ending in `/`
    base_url: Url,

    /// Catalog slug
    region: String,
}

impl DoctolibClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the base URL does not parse and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        Self::build(
            &config.base_url,
            &config.region,
            config.request_timeout(),
            &config.user_agent,
        )
    }

    /// Create a client against a custom base URL, mainly for mock servers
    ///
    /// # Errors
    ///
    /// Same as [`DoctolibClient::new`]
    pub fn with_base_url(base_url: &str, region: &str, timeout: Duration) -> Result<Self, FetchError> {
        let user_agent = UpstreamConfig::default().user_agent;
        Self::build(base_url, region, timeout, &user_agent)
    }

    fn build(
        base_url: &str,
        region: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let base_url = normalize_base(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            region: region.to_string(),
        })
    }

    /// Catalog slug this client queries
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Resolve a path relative to the base URL
    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}{path}: {e}", self.base_url)))
    }

    /// GET a URL and decode its JSON body
    ///
    /// # Errors
    ///
    /// - `FetchError::Timeout` / `FetchError::Http` for transport failures
    /// - `FetchError::Status` for status codes of 400 and above
    /// - `FetchError::Decode` if the body is not the expected JSON
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::debug!(url = %url, "Calling upstream");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Parse a base URL and make sure relative joins append to its path
fn normalize_base(base_url: &str) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
