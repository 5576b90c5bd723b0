//! Shared data types for the vivarium monitoring dashboard.
//!
//! This crate holds the values that travel between the vivarium backend and
//! the dashboard sync engine (`vivarium-core`):
//!
//! - [`SensorReading`]: a timestamped temperature/humidity reading
//! - [`DeviceState`]: the on/off state of a switchable device
//! - [`timestamp`]: parsing and display of backend timestamps
//!
//! # Example
//!
//! ```
//! use vivarium_types::{DeviceId, DeviceState, DeviceStatus};
//!
//! let pump = DeviceId::new("pump").unwrap();
//! let state = DeviceState::new(pump, DeviceStatus::On);
//! assert_eq!(state.state.toggled(), DeviceStatus::Off);
//! ```

pub mod error;
pub mod timestamp;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{DeviceId, DeviceState, DeviceStatus, SensorReading};
