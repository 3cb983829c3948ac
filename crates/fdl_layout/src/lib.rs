//! # fdl_layout - Factory Layouts
//!
//! The layout document and everything that turns it into world-space
//! placements:
//! - [`model`]: site, areas, instances and global constraints
//! - [`ingest`]: one-time conversion into meters, degrees, Z-up, right-handed
//! - [`batch`]: grid, line and circle patterns expanded into instances
//! - [`resolve`]: world transforms of every area and instance
//! - [`constraints`]: scaling rules with field-wise instance overrides

pub mod batch;
pub mod constraints;
pub mod error;
pub mod ingest;
pub mod model;
pub mod resolve;

pub use batch::{generate, generate_into, BatchLayoutSpec, Pattern};
pub use constraints::{
    validate, validate_site, Axis, ScalingConstraint, ScalingOverride, ScalingViolation,
    ViolationKind,
};
pub use error::{BatchError, ConstraintError, LayoutError, Result};
pub use ingest::{normalize_asset, normalize_document, Normalizer};
pub use model::{
    Area, CollisionDetection, Connection, GeoLocation, GlobalConstraints, Instance, LayoutDocument,
    Site, TagOverride,
};
pub use resolve::{resolve, tag_world_position, ResolvedInstance, ResolvedLayout};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::batch::{BatchLayoutSpec, Pattern};
    pub use crate::constraints::{ScalingConstraint, ScalingOverride, ScalingViolation};
    pub use crate::error::LayoutError;
    pub use crate::model::{Area, GlobalConstraints, Instance, LayoutDocument, Site};
    pub use crate::resolve::{resolve, ResolvedLayout};
}
