//! Error types for collision detection

use thiserror::Error;

/// Collision detection errors
///
/// Bad data never ends up here: malformed volumes are reported as
/// [`crate::DataQualityWarning`]s and the instance is skipped.
#[derive(Debug, Error)]
pub enum CollisionError {
    /// A pair evaluation worker panicked
    #[error("Collision worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    /// Negative or non-finite clearance requirement
    #[error("Invalid clearance for {instance}: {value}")]
    InvalidClearance { instance: String, value: f64 },
}

/// Result type for collision operations
pub type Result<T> = std::result::Result<T, CollisionError>;
