//! The watermark scheduler.
//!
//! [`SyncEngine::poll_once`] is one tick: pick the watermark, ask the poll
//! endpoint for everything after it, and apply whatever comes back.
//! [`SyncEngine::spawn_poll_loop`] runs ticks on a fixed interval until it is
//! closed or the session expires.
//!
//! Each tick's request runs on its own task, so ticks are not serialized with
//! respect to their responses. A slow response may land after a later tick or
//! a toggle; the watermark only ever moves forward, which is what makes that
//! safe.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::Stream;
use time::UtcOffset;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::context::PollReport;
use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::protocol::{PollPayload, poll_form};
use crate::session::{Classified, Endpoint, classify_with};
use crate::transport::{RELOAD_PATH, Transport};
use crate::view::DashboardView;
use crate::watermark::SyncWatermark;

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Options for the poll loop.
///
/// ```
/// use std::time::Duration;
/// use vivarium_core::SyncOptions;
///
/// let options = SyncOptions::builder()
///     .poll_interval(Duration::from_secs(10))
///     .build();
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Time between ticks. Default: 5 seconds.
    pub poll_interval: Duration,
    /// How many unread outcomes the loop buffers before dropping new ones.
    /// Default: 16.
    pub buffer_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            buffer_size: 16,
        }
    }
}

impl SyncOptions {
    /// Create a new builder for SyncOptions.
    pub fn builder() -> SyncOptionsBuilder {
        SyncOptionsBuilder::default()
    }

    /// Options with a specific poll interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            poll_interval: interval,
            ..Default::default()
        }
    }

    /// Validate the options and return an error if invalid.
    ///
    /// Checks that:
    /// - `poll_interval` is > 0
    /// - `buffer_size` is > 0
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::invalid_config("poll_interval must be > 0"));
        }
        if self.buffer_size == 0 {
            return Err(Error::invalid_config("buffer_size must be > 0"));
        }
        Ok(())
    }
}

/// Builder for SyncOptions.
#[derive(Debug, Clone, Default)]
pub struct SyncOptionsBuilder {
    options: SyncOptions,
}

impl SyncOptionsBuilder {
    /// Set the polling interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Set the outcome buffer size.
    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.options.buffer_size = size;
        self
    }

    /// Build the SyncOptions.
    #[must_use]
    pub fn build(self) -> SyncOptions {
        self.options
    }
}

/// What one poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A payload was applied.
    Merged(PollReport),
    /// The backend had nothing new.
    Unchanged,
    /// The session expired; the login redirect has fired.
    Unauthenticated,
    /// The response was unclassified or the request failed.
    Ignored,
    /// No request was sent because the session had already expired.
    Skipped,
}

impl PollOutcome {
    fn unadmitted<T>(classified: &Classified<T>) -> Self {
        match classified {
            Classified::Unauthenticated => PollOutcome::Unauthenticated,
            Classified::Unchanged => PollOutcome::Unchanged,
            Classified::Success(_) | Classified::Unclassified => PollOutcome::Ignored,
        }
    }
}

impl<V, T> SyncEngine<V, T>
where
    V: DashboardView + 'static,
    T: Transport + 'static,
{
    /// Run one poll.
    pub async fn poll_once(&self) -> PollOutcome {
        if self.guard.is_expired() {
            return PollOutcome::Skipped;
        }

        let (watermark, offset) = {
            let mut context = self.context.lock().await;
            (context.prepare_poll(), context.backend_offset())
        };
        let payload = match self.fetch(watermark, offset).await {
            Ok(payload) => payload,
            Err(outcome) => return outcome,
        };

        let report = self.context.lock().await.apply_poll(payload);
        debug!(
            "Poll applied: +{} -{} readings, watermark {}",
            report.merge.inserted, report.merge.evicted, report.watermark
        );
        PollOutcome::Merged(report)
    }

    /// Fill the history once with everything inside the retention window.
    ///
    /// Unlike [`poll_once`](Self::poll_once) the request starts at
    /// `now - retention` and the readings are applied without eviction.
    pub async fn bootstrap(&self) -> PollOutcome {
        if self.guard.is_expired() {
            return PollOutcome::Skipped;
        }

        let (from, offset) = {
            let context = self.context.lock().await;
            (context.prepare_bootstrap(), context.backend_offset())
        };
        let payload = match self.fetch(from, offset).await {
            Ok(payload) => payload,
            Err(outcome) => return outcome,
        };

        let report = self.context.lock().await.seed_from(payload);
        info!(
            "Loaded {} reading(s) since {}",
            report.merge.inserted, from
        );
        PollOutcome::Merged(report)
    }

    /// Start polling every `options.poll_interval`.
    ///
    /// The first tick fires one interval after the call. The loop stops when
    /// the returned [`PollLoop`] is closed or dropped, or at the first tick
    /// after the session has expired. Requests already in flight are never
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `options` fail validation.
    pub fn spawn_poll_loop(&self, options: SyncOptions) -> Result<PollLoop> {
        options.validate()?;

        let (tx, rx) = mpsc::channel(options.buffer_size);
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let engine = self.clone();
        let period = options.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Poll loop cancelled, stopping gracefully");
                        break;
                    }
                    _ = ticker.tick() => {
                        if engine.is_session_expired() {
                            info!("Session expired, stopping poll loop");
                            break;
                        }
                        let engine = engine.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let outcome = engine.poll_once().await;
                            if tx.try_send(outcome).is_err() {
                                trace!("Poll outcome not delivered");
                            }
                        });
                    }
                }
            }
        });

        Ok(PollLoop {
            receiver: rx,
            handle,
            cancel_token,
        })
    }

    async fn fetch(
        &self,
        watermark: SyncWatermark,
        offset: UtcOffset,
    ) -> std::result::Result<PollPayload, PollOutcome> {
        trace!("Polling from watermark {}", watermark);
        let response = self
            .transport
            .post_form(RELOAD_PATH, &poll_form(watermark))
            .await;
        let classified = classify_with(response, |body| PollPayload::decode(body, offset));
        let fallback = PollOutcome::unadmitted(&classified);
        self.guard
            .admit(Endpoint::Poll, classified)
            .ok_or(fallback)
    }
}

/// A running poll loop.
///
/// Yields the outcome of every tick as a [`Stream`]. The stream ends once the
/// loop has stopped and every in-flight poll has finished.
pub struct PollLoop {
    receiver: mpsc::Receiver<PollOutcome>,
    handle: tokio::task::JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl PollLoop {
    /// Stop issuing ticks.
    pub fn close(self) {
        self.cancel_token.cancel();
    }

    /// A token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Whether the loop is still issuing ticks.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Whether the loop was stopped explicitly.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Stream for PollLoop {
    type Item = PollOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}
