//! Store client configuration

/// Configuration for connecting to the hosted data backend.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend base URL (e.g., "https://project.example.co")
    pub base_url: String,

    /// Project API key, sent with every request
    pub api_key: Option<String>,

    /// Per-user bearer token; falls back to the API key when absent
    pub token: Option<String>,

    /// Path prefix for the table REST surface
    pub rest_path: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl StoreConfig {
    /// Create a new configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            token: None,
            rest_path: "rest/v1".to_string(),
            timeout: 10,
        }
    }

    /// Set the project API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the per-user bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the REST path prefix.
    pub fn with_rest_path(mut self, path: impl Into<String>) -> Self {
        self.rest_path = path.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Create an HTTP store from this configuration.
    pub fn build_http_store(&self) -> super::HttpStore {
        super::HttpStore::new(self)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321")
    }
}
