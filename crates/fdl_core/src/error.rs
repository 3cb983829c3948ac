//! Configuration errors shared by every layer of the layout engine
//!
//! A configuration error is structural: it aborts the operation that hit it.
//! Domain-rule breaches (scaling, collisions, clearance) are never errors and
//! are returned as data by the crates that check them.

use thiserror::Error;

/// Fatal structural errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An ancestor chain loops back on itself
    #[error("cyclic hierarchy detected at node '{node}'")]
    CyclicHierarchy {
        /// Node at which the walk revisited an ancestor
        node: String,
    },

    /// A node or its parent is not (or no longer) part of the hierarchy
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A scale component is zero, negative or not finite
    #[error("scale component {axis} must be strictly positive, got {value}")]
    NonPositiveScale {
        /// Axis name (`x`, `y` or `z`)
        axis: char,
        /// Offending value
        value: f64,
    },

    /// A transform component is NaN or infinite
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    /// A matrix mirrors space and has no positive-scale decomposition
    #[error("matrix contains a reflection and cannot be decomposed")]
    Reflection,

    /// A unit, axis or handedness token is not recognised
    #[error("unknown unit token: {0}")]
    UnknownUnit(String),

    /// A textual identifier could not be parsed
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, ConfigError>;
