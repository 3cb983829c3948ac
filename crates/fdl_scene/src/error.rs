//! Error types for scene composition

use fdl_core::{AssetId, InstanceId, TagId};
use fdl_layout::LayoutError;
use thiserror::Error;

use crate::path::ScenePath;

/// Composition errors; a failed composition produces no scene at all
#[derive(Debug, Error)]
pub enum CompositionError {
    /// An instance references an asset the catalog does not hold
    #[error("Instance {instance} references unknown asset {asset}")]
    DanglingAsset { instance: InstanceId, asset: AssetId },

    /// Two siblings map to the same node name
    #[error("Scene path {path} produced by both {first:?} and {second:?}")]
    NameCollision {
        path: ScenePath,
        first: String,
        second: String,
    },

    /// A tag override names a tag the asset does not declare
    #[error("Instance {instance} overrides unknown tag {tag}")]
    UnknownTag { instance: InstanceId, tag: TagId },

    /// The layout has no world transform for an instance
    #[error("Instance {0} was not resolved")]
    Unresolved(InstanceId),

    /// Resolving the layout failed
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Result type for composition
pub type Result<T> = std::result::Result<T, CompositionError>;
