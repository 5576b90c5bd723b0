//! Retention window and the eviction decision.

use std::fmt;

use time::{Duration, OffsetDateTime};

/// How far back from "now" the visible history may extend.
///
/// The dashboard exposes this as a whole number of hours; the default is 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetentionWindow(Duration);

impl RetentionWindow {
    /// Default window shown by the dashboard.
    pub const DEFAULT_HOURS: u32 = 12;

    /// A window of `hours` hours.
    pub fn hours(hours: u32) -> Self {
        Self(Duration::hours(i64::from(hours)))
    }

    /// A window of arbitrary length. Negative durations are clamped to zero.
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration.max(Duration::ZERO))
    }

    /// The window length.
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Earliest instant still inside the window at `now`.
    pub fn retain_from(&self, now: OffsetDateTime) -> OffsetDateTime {
        now - self.0
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::hours(Self::DEFAULT_HOURS)
    }
}

impl fmt::Display for RetentionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0.whole_hours();
        if Duration::hours(hours) == self.0 {
            write!(f, "{}h", hours)
        } else {
            write!(f, "{}s", self.0.whole_seconds())
        }
    }
}

/// Whether old entries must be evicted before new ones are admitted.
///
/// True iff the oldest visible reading is older than `now - window`. The
/// merge engine asks once per poll and applies the answer to every reading in
/// that poll's batch.
///
/// ```
/// use time::macros::datetime;
/// use vivarium_core::retention::{should_evict, RetentionWindow};
///
/// let now = datetime!(2024-05-01 13:00 UTC);
/// let window = RetentionWindow::hours(1);
/// assert!(should_evict(datetime!(2024-05-01 11:59 UTC), now, window));
/// assert!(!should_evict(datetime!(2024-05-01 12:00 UTC), now, window));
/// ```
pub fn should_evict(
    oldest_visible: OffsetDateTime,
    now: OffsetDateTime,
    window: RetentionWindow,
) -> bool {
    oldest_visible < window.retain_from(now)
}
