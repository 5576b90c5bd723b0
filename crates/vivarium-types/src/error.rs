//! Error types for data parsing in vivarium-types.

use thiserror::Error;

/// Errors that can occur when parsing values delivered by the vivarium backend.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A reading timestamp was in neither of the accepted formats.
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// A UTC offset was not `UTC`, `Z` or `+HH:MM`.
    #[error("Invalid UTC offset: '{0}' (expected UTC or +HH:MM)")]
    InvalidOffset(String),

    /// A device state was not "On" or "Off".
    #[error("Invalid device state: '{0}' (expected On or Off)")]
    InvalidDeviceState(String),

    /// A device identifier was empty.
    #[error("Device identifier cannot be empty")]
    EmptyDeviceId,
}

/// Result type alias using vivarium-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
