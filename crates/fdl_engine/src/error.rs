//! Error types for the layout pipeline

use fdl_asset::CatalogError;
use fdl_collision::CollisionError;
use fdl_event::EventError;
use fdl_layout::{ConstraintError, LayoutError};
use fdl_scene::CompositionError;
use thiserror::Error;

/// Anything that stops a pipeline run
///
/// Violations and warnings are not errors; they come back in the report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("scaling constraints: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("asset catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("collision detection: {0}")]
    Collision(#[from] CollisionError),

    #[error("scene composition: {0}")]
    Composition(#[from] CompositionError),

    #[error("event delivery: {0}")]
    Event(#[from] EventError),

    /// The scene writer failed
    #[error("scene writer: {0}")]
    Writer(String),
}

/// Result type for pipeline runs
pub type Result<T> = std::result::Result<T, PipelineError>;
