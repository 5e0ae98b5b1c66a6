//! Voice-synthesis service API client.

use std::sync::Arc;

use crate::{
    error::{Error, Result},
    http::HttpClient,
    identity::IdentityService,
    jobs::JobService,
};

/// Default maximum number of retries for transient errors.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Voice-synthesis service API client.
///
/// The client provides access to the job and identity services.
pub struct Client {
    http: Arc<HttpClient>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with default options.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(base_url, api_key).build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url, api_key)
    }

    /// Returns the clone-job service.
    pub fn jobs(&self) -> JobService {
        JobService::new(self.http.clone())
    }

    /// Returns the identity resolution service.
    pub fn identities(&self) -> IdentityService {
        IdentityService::new(self.http.clone())
    }

    /// Returns a reference to the internal HTTP client.
    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }
}

/// Builder for creating a synthesis service client.
pub struct ClientBuilder {
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the maximum number of retries for transient errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base_url must be non-empty".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(Error::Config("api_key must be non-empty".to_string()));
        }

        let base_url = self.base_url.trim_end_matches('/').to_string();
        let http = HttpClient::new(base_url, self.api_key, self.max_retries)?;

        Ok(Client {
            http: Arc::new(http),
        })
    }
}
