//! Response classification and the session guard.
//!
//! Every endpoint's response is reduced to one [`Classified`] value by
//! [`classify`] (or [`classify_with`] for endpoints without a JSON body).
//! The [`SessionGuard`] then consumes it the same way for all endpoints:
//! pass the payload on, redirect to login, or do nothing.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::transport::RawResponse;

/// HTTP status for a successful exchange.
pub const STATUS_OK: u16 = 200;
/// HTTP status for "nothing changed since the watermark".
pub const STATUS_NOT_MODIFIED: u16 = 304;
/// HTTP status for an expired or missing session.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Outcome of a backend exchange, as far as the dashboard cares.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<T> {
    /// The backend answered with a payload to act on.
    Success(T),
    /// The session has expired; the user must log in again.
    Unauthenticated,
    /// The backend had nothing new.
    Unchanged,
    /// Anything else, including transport failures. Treated as a no-op.
    Unclassified,
}

impl<T> Classified<T> {
    /// Short name of the classification, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Classified::Success(_) => "success",
            Classified::Unauthenticated => "unauthenticated",
            Classified::Unchanged => "unchanged",
            Classified::Unclassified => "unclassified",
        }
    }
}

/// Classify a response whose success body is JSON.
///
/// A 200 whose body does not decode as `T` is unclassified.
pub fn classify<T: DeserializeOwned>(response: Result<RawResponse>) -> Classified<T> {
    classify_with(response, |body| Ok(serde_json::from_slice(body)?))
}

/// Classify a response, decoding a 200 body with `decode`.
pub fn classify_with<T, F>(response: Result<RawResponse>, decode: F) -> Classified<T>
where
    F: FnOnce(&[u8]) -> Result<T>,
{
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            debug!("Request failed, treating as unclassified: {}", e);
            return Classified::Unclassified;
        }
    };

    match response.status {
        STATUS_OK => match decode(&response.body) {
            Ok(payload) => Classified::Success(payload),
            Err(e) => {
                warn!("Discarding undecodable response body: {}", e);
                Classified::Unclassified
            }
        },
        STATUS_UNAUTHORIZED => Classified::Unauthenticated,
        STATUS_NOT_MODIFIED => Classified::Unchanged,
        other => {
            debug!("Unclassified response status {}", other);
            Classified::Unclassified
        }
    }
}

/// Which endpoint a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The periodic poll.
    Poll,
    /// A device toggle.
    Toggle,
    /// A settings submission.
    Settings,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Poll => write!(f, "poll"),
            Endpoint::Toggle => write!(f, "toggle"),
            Endpoint::Settings => write!(f, "settings"),
        }
    }
}

/// The "go to the login page" side effect.
pub trait Navigator: Send + Sync {
    /// Leave the dashboard for the login boundary.
    fn to_login(&self);
}

/// Consumes classifications uniformly for all endpoints.
pub struct SessionGuard {
    navigator: Arc<dyn Navigator>,
    expired: AtomicBool,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("expired", &self.is_expired())
            .finish()
    }
}

impl SessionGuard {
    /// Create a guard that redirects through `navigator`.
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            expired: AtomicBool::new(false),
        }
    }

    /// Whether an unauthenticated response has been seen.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Relaxed)
    }

    /// Let a successful payload through; handle every other outcome.
    ///
    /// On `Unauthenticated` the navigator is invoked and nothing further
    /// should be processed. `Unchanged` and `Unclassified` are no-ops.
    pub fn admit<T>(&self, endpoint: Endpoint, classified: Classified<T>) -> Option<T> {
        trace!("{} response classified as {}", endpoint, classified.kind());
        match classified {
            Classified::Success(payload) => Some(payload),
            Classified::Unauthenticated => {
                warn!("Session expired during {}, redirecting to login", endpoint);
                self.expired.store(true, Ordering::Relaxed);
                self.navigator.to_login();
                None
            }
            Classified::Unchanged | Classified::Unclassified => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mock::RecordingNavigator;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn test_classify_success() {
        let response = Ok(RawResponse::new(200, r#"{"value": 7}"#));
        assert_eq!(classify::<Payload>(response), Classified::Success(Payload { value: 7 }));
    }

    #[test]
    fn test_classify_bad_body_is_unclassified() {
        let response = Ok(RawResponse::new(200, "<html>"));
        assert_eq!(classify::<Payload>(response), Classified::Unclassified);
    }

    #[test]
    fn test_classify_statuses() {
        assert_eq!(
            classify::<Payload>(Ok(RawResponse::empty(401))),
            Classified::Unauthenticated
        );
        assert_eq!(
            classify::<Payload>(Ok(RawResponse::empty(304))),
            Classified::Unchanged
        );
        assert_eq!(
            classify::<Payload>(Ok(RawResponse::empty(400))),
            Classified::Unclassified
        );
        assert_eq!(
            classify::<Payload>(Ok(RawResponse::empty(500))),
            Classified::Unclassified
        );
    }

    #[test]
    fn test_classify_transport_failure() {
        let response = Err(Error::transport("/reload", "connection refused"));
        assert_eq!(classify::<Payload>(response), Classified::Unclassified);
    }

    #[test]
    fn test_classify_with_ignores_empty_body() {
        let response = Ok(RawResponse::empty(200));
        assert_eq!(classify_with(response, |_| Ok(())), Classified::Success(()));
    }

    #[test]
    fn test_guard_redirects_on_unauthenticated() {
        let navigator = Arc::new(RecordingNavigator::new());
        let guard = SessionGuard::new(navigator.clone());

        assert_eq!(guard.admit::<u32>(Endpoint::Poll, Classified::Unauthenticated), None);
        assert!(guard.is_expired());
        assert_eq!(navigator.redirects(), 1);
    }

    #[test]
    fn test_guard_passes_success_and_ignores_the_rest() {
        let navigator = Arc::new(RecordingNavigator::new());
        let guard = SessionGuard::new(navigator.clone());

        assert_eq!(guard.admit(Endpoint::Toggle, Classified::Success(3)), Some(3));
        assert_eq!(guard.admit::<u32>(Endpoint::Settings, Classified::Unchanged), None);
        assert_eq!(guard.admit::<u32>(Endpoint::Poll, Classified::Unclassified), None);
        assert!(!guard.is_expired());
        assert_eq!(navigator.redirects(), 0);
    }

    #[test]
    fn test_classified_kind() {
        assert_eq!(Classified::Success(1).kind(), "success");
        assert_eq!(Classified::<u8>::Unchanged.kind(), "unchanged");
        assert_eq!(Classified::<u8>::Unauthenticated.kind(), "unauthenticated");
        assert_eq!(Classified::<u8>::Unclassified.kind(), "unclassified");
    }
}
