//! The sync watermark.
//!
//! Readings at or before the watermark are already reflected in the visible
//! history; a poll asks the backend for everything strictly after it. The
//! watermark has whole-second granularity because that is what the poll
//! endpoint accepts, and it never moves backward.

use std::fmt;

use time::{Duration, OffsetDateTime};
use vivarium_types::timestamp::{ceil_to_second, truncate_to_second};

/// Boundary between already-synchronized and not-yet-fetched data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncWatermark(OffsetDateTime);

impl SyncWatermark {
    /// Watermark for "now": the current instant rounded up to whole seconds.
    pub fn starting_at(now: OffsetDateTime) -> Self {
        Self(ceil_to_second(now))
    }

    /// The watermark just past a delivered reading.
    ///
    /// Readings are displayed with their fraction dropped, so the successor
    /// is the truncated timestamp plus one second. The next poll then
    /// excludes that reading.
    pub fn successor_of(reading_time: OffsetDateTime) -> Self {
        Self(truncate_to_second(reading_time) + Duration::SECOND)
    }

    /// The instant this watermark stands for.
    pub fn instant(&self) -> OffsetDateTime {
        self.0
    }

    /// Unix seconds, as sent in the poll request.
    pub fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Move the watermark forward to `candidate` if it is strictly newer.
    ///
    /// Returns `true` if the watermark changed.
    pub fn raise_to(&mut self, candidate: SyncWatermark) -> bool {
        if candidate > *self {
            *self = candidate;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for SyncWatermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unix_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_starting_at_rounds_up() {
        let wm = SyncWatermark::starting_at(datetime!(2024-05-01 12:00:00.001 UTC));
        assert_eq!(wm.instant(), datetime!(2024-05-01 12:00:01 UTC));
    }

    #[test]
    fn test_successor_drops_fraction_then_adds_second() {
        let wm = SyncWatermark::successor_of(datetime!(2024-05-01 12:00:00.900 UTC));
        assert_eq!(wm.instant(), datetime!(2024-05-01 12:00:01 UTC));

        let wm = SyncWatermark::successor_of(datetime!(2024-05-01 12:00:00 UTC));
        assert_eq!(wm.instant(), datetime!(2024-05-01 12:00:01 UTC));
    }

    #[test]
    fn test_raise_to_never_moves_backward() {
        let mut wm = SyncWatermark::starting_at(datetime!(2024-05-01 12:00 UTC));
        let older = SyncWatermark::starting_at(datetime!(2024-05-01 11:00 UTC));
        let newer = SyncWatermark::starting_at(datetime!(2024-05-01 13:00 UTC));

        assert!(!wm.raise_to(older));
        assert_eq!(wm.instant(), datetime!(2024-05-01 12:00 UTC));
        assert!(!wm.raise_to(wm));
        assert!(wm.raise_to(newer));
        assert_eq!(wm, newer);
    }

    #[test]
    fn test_unix_seconds() {
        let wm = SyncWatermark::starting_at(datetime!(1970-01-01 00:01:40 UTC));
        assert_eq!(wm.unix_seconds(), 100);
        assert_eq!(wm.to_string(), "100");
    }
}
