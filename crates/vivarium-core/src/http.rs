//! HTTP transport for the dashboard backend.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use vivarium_core::http::HttpTransport;
//!
//! # fn example() -> vivarium_core::Result<()> {
//! let transport = HttpTransport::builder("http://vivarium.local:5000")
//!     .timeout(Duration::from_secs(5))
//!     .session_cookie("session=abc123")
//!     .build()?;
//! assert_eq!(transport.base_url(), "http://vivarium.local:5000");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use tracing::trace;

use crate::error::{Error, Result};
use crate::transport::{RawResponse, Transport};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Transport`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
    timeout: Option<Duration>,
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    base_url: String,
    timeout: Duration,
    session_cookie: Option<String>,
}

impl HttpTransportBuilder {
    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `cookie` (for example `session=...`) with every request.
    #[must_use]
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] unless the base URL starts with
    /// `http://` or `https://`, and [`Error::InvalidConfig`] for a zero
    /// timeout.
    pub fn build(self) -> Result<HttpTransport> {
        if self.timeout.is_zero() {
            return Err(Error::invalid_config("request timeout must be > 0"));
        }
        let client = Client::builder().timeout(self.timeout).build()?;
        let mut transport = HttpTransport::with_client(&self.base_url, client)?
            .with_session_cookie(self.session_cookie);
        transport.timeout = Some(self.timeout);
        Ok(transport)
    }
}

impl HttpTransport {
    /// A transport for `base_url` with the default timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Start building a transport for `base_url`.
    pub fn builder(base_url: &str) -> HttpTransportBuilder {
        HttpTransportBuilder {
            base_url: base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            session_cookie: None,
        }
    }

    /// A transport over an existing reqwest client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            session_cookie: None,
            timeout: None,
        })
    }

    fn with_session_cookie(mut self, cookie: Option<String>) -> Self {
        self.session_cookie = cookie.filter(|c| !c.trim().is_empty());
        self
    }

    /// The base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request timeout, if this transport built its own client.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn request_error(&self, path: &str, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::timeout(format!("POST {}", path), timeout),
            _ => Error::transport(path, err.to_string()),
        }
    }

    /// Full URL for an endpoint path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<RawResponse> {
        let url = self.url_for(path);
        let mut request = self.client.post(&url).form(fields);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.request_error(path, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.request_error(path, e))?;

        trace!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(RawResponse::new(status, body))
    }
}
