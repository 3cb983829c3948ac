//! Error types for event delivery

use thiserror::Error;

/// Event delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The receiving side is gone
    #[error("Event sink disconnected")]
    Disconnected,

    /// A bounded sink has no room left
    #[error("Event sink is full")]
    Full,
}

/// Result type for event delivery
pub type Result<T> = std::result::Result<T, EventError>;
