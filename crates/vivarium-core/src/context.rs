//! The sync context: all mutable dashboard state in one place.
//!
//! The scheduler, the toggle coordinator and the settings submission all
//! operate on a [`SyncContext`]. Each operation is split into synchronous
//! phases (prepare a request, apply a response) so that the rules between
//! them can be tested without any I/O, and so that drivers only ever hold
//! the context between network round-trips, never across one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use time::{OffsetDateTime, UtcOffset};
use tracing::debug;
use vivarium_types::timestamp::local_offset;
use vivarium_types::{DeviceId, DeviceState, DeviceStatus, SensorReading};

use crate::history::VisibleHistory;
use crate::merge::{MergeOutcome, eviction_decision, merge_batch, update_latest_tiles};
use crate::protocol::PollPayload;
use crate::retention::RetentionWindow;
use crate::view::{DashboardView, Tile, TileStyle, TileValue};
use crate::watermark::SyncWatermark;

/// Status text shown after a settings submission succeeds.
pub const SETTINGS_SAVED_MESSAGE: &str = "Settings updated successfully.";

/// Source of "now".
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> OffsetDateTime;
}

/// The system clock, in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Result of applying a successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// What the merge did.
    pub merge: MergeOutcome,
    /// Number of device states applied.
    pub devices_updated: usize,
    /// Whether the backend reported itself running.
    pub backend_running: bool,
    /// Watermark after the poll.
    pub watermark: SyncWatermark,
}

/// Watermark, visible history, device states and the view, owned together.
pub struct SyncContext<V> {
    watermark: SyncWatermark,
    history: VisibleHistory,
    devices: BTreeMap<DeviceId, DeviceStatus>,
    retention: RetentionWindow,
    backend_offset: UtcOffset,
    view: V,
    clock: Arc<dyn Clock>,
}

impl<V> fmt::Debug for SyncContext<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("watermark", &self.watermark)
            .field("visible", &self.history.len())
            .field("devices", &self.devices)
            .field("retention", &self.retention)
            .field("backend_offset", &self.backend_offset)
            .finish()
    }
}

impl<V: DashboardView> SyncContext<V> {
    /// A context using the system clock. The watermark starts at "now".
    pub fn new(view: V, retention: RetentionWindow) -> Self {
        Self::with_clock(view, retention, Arc::new(SystemClock))
    }

    /// A context with an explicit clock.
    ///
    /// Naive backend timestamps are read in the host's local offset, if it
    /// can be determined at this point; see [`with_backend_offset`](Self::with_backend_offset).
    pub fn with_clock(view: V, retention: RetentionWindow, clock: Arc<dyn Clock>) -> Self {
        let watermark = SyncWatermark::starting_at(clock.now());
        Self {
            watermark,
            history: VisibleHistory::new(),
            devices: BTreeMap::new(),
            retention,
            backend_offset: local_offset(),
            view,
            clock,
        }
    }

    /// Read the backend's naive timestamps in `offset`.
    #[must_use]
    pub fn with_backend_offset(mut self, offset: UtcOffset) -> Self {
        self.backend_offset = offset;
        self
    }

    /// UTC offset the backend writes its timestamps in.
    pub fn backend_offset(&self) -> UtcOffset {
        self.backend_offset
    }

    /// Current watermark.
    pub fn watermark(&self) -> SyncWatermark {
        self.watermark
    }

    /// Readings currently visible.
    pub fn history(&self) -> &VisibleHistory {
        &self.history
    }

    /// The view being driven.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the view, for front ends that decorate it.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Retention window used by the next poll.
    pub fn retention(&self) -> RetentionWindow {
        self.retention
    }

    /// Change the retention window. Takes effect at the next poll.
    pub fn set_retention(&mut self, retention: RetentionWindow) {
        self.retention = retention;
    }

    /// Last known state of a device.
    pub fn device_state(&self, device: &DeviceId) -> Option<DeviceStatus> {
        self.devices.get(device).copied()
    }

    /// All known device states.
    pub fn devices(&self) -> impl Iterator<Item = (&DeviceId, DeviceStatus)> {
        self.devices.iter().map(|(id, state)| (id, *state))
    }

    /// The clock's current instant.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Fill the history with its initial readings, without eviction.
    ///
    /// Raises the watermark past the newest seeded reading.
    pub fn seed(&mut self, readings: Vec<SensorReading>) -> MergeOutcome {
        update_latest_tiles(&mut self.view, &readings);
        let newest = readings.iter().map(|r| r.timestamp).max();
        let outcome = merge_batch(&mut self.history, &mut self.view, readings, false);
        if let Some(newest) = newest {
            self.watermark.raise_to(SyncWatermark::successor_of(newest));
        }
        debug!("Seeded {} reading(s), watermark {}", outcome.inserted, self.watermark);
        outcome
    }

    /// Watermark for the initial fill: the start of the retention window.
    ///
    /// The context's own watermark is left untouched.
    pub fn prepare_bootstrap(&self) -> SyncWatermark {
        SyncWatermark::starting_at(self.retention.retain_from(self.clock.now()))
    }

    /// Seed from a full poll payload: readings, device states and liveness.
    pub fn seed_from(&mut self, payload: PollPayload) -> PollReport {
        let PollPayload {
            sensor_readings,
            device_states,
            backend_running,
        } = payload;
        let merge = self.seed(sensor_readings.unwrap_or_default());
        let devices_updated = self.apply_device_states(device_states.unwrap_or_default());
        self.apply_backend_running(backend_running);
        PollReport {
            merge,
            devices_updated,
            backend_running,
            watermark: self.watermark,
        }
    }

    /// First phase of a poll: pick the watermark to request from.
    ///
    /// If the newest visible reading's successor is strictly newer than the
    /// watermark, the watermark is raised to it first, so the poll never asks
    /// for data older than what is already shown.
    pub fn prepare_poll(&mut self) -> SyncWatermark {
        if let Some(newest) = self.history.newest() {
            let candidate = SyncWatermark::successor_of(newest.timestamp);
            if self.watermark.raise_to(candidate) {
                debug!("Watermark raised to {} from visible history", self.watermark);
            }
        }
        self.watermark
    }

    /// Second phase of a poll: apply a successful payload.
    ///
    /// The eviction decision is taken here, once, against the clock and the
    /// retention window as they are when the response arrives.
    pub fn apply_poll(&mut self, payload: PollPayload) -> PollReport {
        let PollPayload {
            sensor_readings,
            device_states,
            backend_running,
        } = payload;
        let readings = sensor_readings.unwrap_or_default();

        update_latest_tiles(&mut self.view, &readings);

        let newest = readings.iter().map(|r| r.timestamp).max();
        let evict = eviction_decision(&self.history, self.clock.now(), self.retention);
        let merge = merge_batch(&mut self.history, &mut self.view, readings, evict);

        let devices_updated = self.apply_device_states(device_states.unwrap_or_default());
        self.apply_backend_running(backend_running);

        if let Some(newest) = newest {
            self.watermark.raise_to(SyncWatermark::successor_of(newest));
        }

        PollReport {
            merge,
            devices_updated,
            backend_running,
            watermark: self.watermark,
        }
    }

    /// First phase of a toggle: raise the watermark to "now" before the
    /// request goes out, so a racing poll cannot pick the toggle's effects
    /// up a second time.
    pub fn begin_toggle(&mut self) -> SyncWatermark {
        let now = SyncWatermark::starting_at(self.clock.now());
        self.watermark.raise_to(now);
        self.watermark
    }

    /// Second phase of a toggle: show the state the backend confirmed.
    pub fn apply_confirmed_state(&mut self, confirmed: DeviceState) {
        self.set_device(confirmed);
    }

    /// Show a status message (settings submissions).
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.view
            .set_tile(Tile::Status, TileValue::text(message.into()));
    }

    /// Clear the status message.
    pub fn clear_status(&mut self) {
        self.set_status(String::new());
    }

    fn apply_device_states(&mut self, states: Vec<DeviceState>) -> usize {
        let count = states.len();
        for state in states {
            self.set_device(state);
        }
        count
    }

    fn set_device(&mut self, state: DeviceState) {
        let DeviceState { device_id, state } = state;
        self.view.set_tile(
            Tile::Device(device_id.clone()),
            TileValue::text(state.as_str()),
        );
        self.devices.insert(device_id, state);
    }

    fn apply_backend_running(&mut self, running: bool) {
        let value = if running {
            TileValue::styled("Running", TileStyle::Ok)
        } else {
            TileValue::styled("Stopped", TileStyle::Alert)
        };
        self.view.set_tile(Tile::Backend, value);
    }
}
