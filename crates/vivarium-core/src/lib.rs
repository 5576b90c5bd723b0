//! Incremental synchronization engine for the vivarium monitoring dashboard.
//!
//! The dashboard shows a rolling window of temperature and humidity readings
//! (a table plus two charts), the latest values, backend liveness and one
//! on/off control per device. This crate keeps that view in step with the
//! backend by polling for everything newer than a watermark.
//!
//! # Features
//!
//! - **Watermark polling**: ask only for readings after the last synchronized
//!   instant, on a fixed interval
//! - **Bounded history**: evict old entries under a retention window, keeping
//!   the table and both charts consistent
//! - **Confirmed toggles**: device controls only show backend-confirmed state
//! - **Session guard**: one classification of every response, one redirect
//!   path for expired sessions
//! - **HTTP transport** (feature `http`): `reqwest` with cookie and timeout
//!
//! # Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`scheduler`] | Periodic poll and the watermark rules around it |
//! | [`merge`] | Insertion and eviction across table and charts |
//! | [`toggle`] | Device toggles |
//! | [`session`] | Response classification and login redirect |
//! | [`retention`] | The eviction decision |
//! | [`context`] | All mutable state, split into prepare/apply phases |
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use vivarium_core::mock::{MockTransport, RecordingNavigator};
//! use vivarium_core::{MemoryDashboard, RetentionWindow, SyncContext, SyncEngine, SyncOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = SyncContext::new(MemoryDashboard::new(), RetentionWindow::default());
//!     let engine = SyncEngine::new(
//!         context,
//!         Arc::new(MockTransport::new()),
//!         Arc::new(RecordingNavigator::new()),
//!     );
//!
//!     engine.bootstrap().await;
//!     let mut polls = engine.spawn_poll_loop(SyncOptions::default())?;
//!     while let Some(outcome) = polls.next().await {
//!         println!("{:?}", outcome);
//!     }
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod history;
#[cfg(feature = "http")]
pub mod http;
pub mod merge;
pub mod mock;
pub mod protocol;
pub mod retention;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod toggle;
pub mod transport;
pub mod view;
pub mod watermark;

// Core exports
pub use context::{Clock, PollReport, SETTINGS_SAVED_MESSAGE, SyncContext, SystemClock};
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use history::VisibleHistory;
pub use merge::MergeOutcome;
pub use protocol::{PollPayload, SettingsForm};
pub use retention::{RetentionWindow, should_evict};
pub use scheduler::{PollLoop, PollOutcome, SyncOptions, SyncOptionsBuilder};
pub use session::{Classified, Navigator, SessionGuard};
pub use settings::SettingsOutcome;
pub use toggle::ToggleOutcome;
pub use transport::{RawResponse, Transport};
pub use view::{
    ChartPoint, ChartView, DashboardView, MemoryDashboard, Series, TableRow, TableView, Tile,
    TileBoard, TileStyle, TileValue,
};
pub use watermark::SyncWatermark;

#[cfg(feature = "http")]
pub use http::HttpTransport;

// Re-export from vivarium-types
pub use vivarium_types::{DeviceId, DeviceState, DeviceStatus, ParseError, SensorReading};
