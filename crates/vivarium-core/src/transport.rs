//! The request boundary between the sync engine and the backend.
//!
//! The engine only ever needs one kind of exchange: POST a form to an
//! endpoint path and get back a status code and a body. Everything else
//! (cookies, TLS, timeouts) belongs to the [`Transport`] implementation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Poll endpoint: everything recorded after the watermark.
pub const RELOAD_PATH: &str = "/reload";
/// Device toggle endpoint.
pub const TOGGLE_PATH: &str = "/toggle_device";
/// Settings submission endpoint.
pub const SETTINGS_PATH: &str = "/settings";

/// A form body: ordered `(name, value)` pairs.
pub type FormFields = Vec<(String, String)>;

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: Bytes,
}

impl RawResponse {
    /// A response with a body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response with no body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }
}

/// Something that can deliver a form to the backend.
///
/// Implemented by [`crate::http::HttpTransport`] (feature `http`) and by
/// [`crate::mock::MockTransport`] for tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `fields` as a URL-encoded form to `path`.
    ///
    /// Returns `Err` only when no response was obtained at all; any status
    /// code, including errors, is an `Ok` response.
    async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<RawResponse>;
}
