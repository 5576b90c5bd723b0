//! Test doubles for the sync engine.
//!
//! [`MockTransport`] replays scripted responses per endpoint path and records
//! every request it receives. [`RecordingNavigator`] counts login redirects,
//! and [`ManualClock`] is a clock the test moves by hand.
//!
//! # Features
//!
//! - **Scripted responses**: queue any status and body per path
//! - **Failure injection**: queue transport failures that never reach a status
//! - **Latency simulation**: delay individual responses to reorder completions

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::context::Clock;
use crate::error::{Error, Result};
use crate::session::{Navigator, STATUS_OK};
use crate::transport::{FormFields, RawResponse, Transport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type Handler = Box<dyn Fn(&[(String, String)]) -> RawResponse + Send + Sync>;

enum Reply {
    Respond(RawResponse),
    Fail(String),
    Handle(Handler),
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Respond(response) => f.debug_tuple("Respond").field(response).finish(),
            Reply::Fail(reason) => f.debug_tuple("Fail").field(reason).finish(),
            Reply::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

#[derive(Debug)]
struct Scripted {
    reply: Reply,
    delay: Duration,
}

/// A request received by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Endpoint path.
    pub path: String,
    /// Form fields, in the order sent.
    pub fields: FormFields,
}

impl RecordedRequest {
    /// Value of a form field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A scripted [`Transport`].
///
/// Each path has its own queue of replies, consumed in order. A request to a
/// path whose queue is empty fails as a transport error, which the session
/// guard treats as unclassified.
///
/// # Example
///
/// ```
/// use vivarium_core::mock::MockTransport;
/// use vivarium_core::transport::{RawResponse, Transport, RELOAD_PATH};
///
/// #[tokio::main]
/// async fn main() {
///     let transport = MockTransport::new();
///     transport.respond(RELOAD_PATH, RawResponse::empty(304));
///
///     let response = transport.post_form(RELOAD_PATH, &[]).await.unwrap();
///     assert_eq!(response.status, 304);
///     assert!(transport.post_form(RELOAD_PATH, &[]).await.is_err());
///     assert_eq!(transport.request_count(RELOAD_PATH), 2);
/// }
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// A transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `path`.
    pub fn respond(&self, path: &str, response: RawResponse) {
        self.push(path, Reply::Respond(response), Duration::ZERO);
    }

    /// Queue a response for `path`, delivered after `delay`.
    pub fn respond_after(&self, path: &str, delay: Duration, response: RawResponse) {
        self.push(path, Reply::Respond(response), delay);
    }

    /// Queue a 200 response whose body is `payload` as JSON.
    pub fn respond_json<P: Serialize>(&self, path: &str, payload: &P) -> Result<()> {
        self.respond_json_after(path, Duration::ZERO, payload)
    }

    /// Queue a delayed 200 JSON response.
    pub fn respond_json_after<P: Serialize>(
        &self,
        path: &str,
        delay: Duration,
        payload: &P,
    ) -> Result<()> {
        let body = serde_json::to_vec(payload)?;
        self.push(path, Reply::Respond(RawResponse::new(STATUS_OK, body)), delay);
        Ok(())
    }

    /// Queue a reply computed from the request's form fields.
    ///
    /// Useful for emulating backend logic, such as flipping the state a
    /// toggle request carries.
    pub fn respond_with<F>(&self, path: &str, handler: F)
    where
        F: Fn(&[(String, String)]) -> RawResponse + Send + Sync + 'static,
    {
        self.push(path, Reply::Handle(Box::new(handler)), Duration::ZERO);
    }

    /// Queue a transport failure for `path`.
    pub fn fail(&self, path: &str, reason: impl Into<String>) {
        self.push(path, Reply::Fail(reason.into()), Duration::ZERO);
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Requests received for `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Number of requests received for `path`.
    pub fn request_count(&self, path: &str) -> usize {
        lock(&self.requests).iter().filter(|r| r.path == path).count()
    }

    /// Replies still queued for `path`.
    pub fn pending(&self, path: &str) -> usize {
        lock(&self.replies).get(path).map_or(0, VecDeque::len)
    }

    fn push(&self, path: &str, reply: Reply, delay: Duration) {
        lock(&self.replies)
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted { reply, delay });
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<RawResponse> {
        lock(&self.requests).push(RecordedRequest {
            path: path.to_string(),
            fields: fields.to_vec(),
        });

        let scripted = lock(&self.replies).get_mut(path).and_then(VecDeque::pop_front);
        let Some(Scripted { reply, delay }) = scripted else {
            return Err(Error::transport(path, "no scripted response"));
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(reason) => Err(Error::transport(path, reason)),
            Reply::Handle(handler) => Ok(handler(fields)),
        }
    }
}

/// Answer a toggle request the way the backend does.
///
/// The backend reads `state` as the device's current state and flips it, so
/// the confirmed state is the opposite of the one sent. A request without
/// both fields gets a 400.
///
/// ```
/// use vivarium_core::mock::flip_toggle;
///
/// let fields = vec![
///     ("device".to_string(), "pump".to_string()),
///     ("state".to_string(), "Off".to_string()),
/// ];
/// let reply = flip_toggle(&fields);
/// assert_eq!(reply.status, 200);
/// assert_eq!(&reply.body[..], br#"{"device":"pump","state":"On"}"#);
/// ```
pub fn flip_toggle(fields: &[(String, String)]) -> RawResponse {
    let field = |name: &str| fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());
    let (Some(device), Some(state)) = (field("device"), field("state")) else {
        return RawResponse::empty(400);
    };
    let flipped = if state == "On" { "Off" } else { "On" };
    let body = serde_json::json!({ "device": device, "state": flipped }).to_string();
    RawResponse::new(STATUS_OK, body)
}

/// A [`Navigator`] that counts redirects.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: AtomicU32,
}

impl RecordingNavigator {
    /// A navigator with no redirects yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the login redirect fired.
    pub fn redirects(&self) -> u32 {
        self.redirects.load(Ordering::Relaxed)
    }
}

impl Navigator for RecordingNavigator {
    fn to_login(&self) {
        self.redirects.fetch_add(1, Ordering::Relaxed);
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// A clock reading `now`.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: OffsetDateTime) {
        *lock(&self.now) = now;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: time::Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *lock(&self.now)
    }
}
