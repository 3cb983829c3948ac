//! Error types for layout processing

use fdl_core::{AreaId, ConfigError, InstanceId, TagId};
use thiserror::Error;

/// A merged scaling constraint that cannot be applied
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    /// min_scale above max_scale
    #[error("instance {instance}: min_scale {min} exceeds max_scale {max}")]
    InvertedRange { instance: InstanceId, min: f64, max: f64 },

    /// A bound that is zero, negative or not finite
    #[error("instance {instance}: scale bound {value} must be finite and positive")]
    InvalidBound { instance: InstanceId, value: f64 },
}

/// Batch pattern parameters that cannot be expanded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("batch layout '{layout}': parameter {parameter} is not finite")]
    NonFinite { layout: String, parameter: &'static str },

    #[error("batch layout '{layout}': radius {radius} is negative")]
    NegativeRadius { layout: String, radius: f64 },

    #[error("batch layout '{layout}': {source}")]
    Transform {
        layout: String,
        #[source]
        source: ConfigError,
    },
}

/// Structural errors in a layout document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("batch layout '{layout}' targets unknown area {area}")]
    UnknownArea { layout: String, area: AreaId },

    #[error("duplicate area id: {0}")]
    DuplicateArea(AreaId),

    #[error("duplicate instance id: {0}")]
    DuplicateInstance(InstanceId),

    #[error("connection '{connection}' references unknown instance {instance}")]
    UnknownConnectionEndpoint { connection: String, instance: InstanceId },

    #[error("clearance {value} is negative")]
    NegativeClearance { value: f64 },

    #[error("instance {instance} has no tag {tag}")]
    UnknownTag { instance: InstanceId, tag: TagId },

    #[error("tag {tag} is attached to node '{path}' which could not be located")]
    UnresolvedNode { tag: TagId, path: String },

    #[error("unknown instance: {0}")]
    UnknownInstance(InstanceId),
}

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
