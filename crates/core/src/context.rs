//! Explicit request context for backend calls.
//!
//! The bearer credential is injected once at construction instead of being
//! read from ambient state on every call. The surrounding auth layer owns
//! the token lifecycle; a 401 from the backend is surfaced as an ordinary
//! gateway error and never triggers a refresh here.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use crate::config::ApiConfig;

/// Shared context for authenticated API requests.
#[derive(Debug, Clone)]
pub struct ApiContext {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl ApiContext {
    /// Create a context from API configuration.
    pub fn new(config: &ApiConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            http,
        }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer credential, if one is configured.
    ///
    /// Direct storage transfers must NOT go through this: presigned
    /// endpoints carry their own authorization.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Underlying HTTP client.
    pub fn http(&self) -> &Client {
        &self.http
    }
}
