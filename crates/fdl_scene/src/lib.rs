//! # fdl_scene - Scene Composition
//!
//! Turns a resolved layout into a hierarchical scene: one node per site,
//! area, instance and overridden tag. Instance nodes reference their asset
//! definition instead of copying geometry, and carry variant selections as
//! tokens. Writing the scene to an interchange format is left to a
//! [`SceneWriter`].

pub mod compose;
pub mod error;
pub mod graph;
pub mod node;
pub mod path;

pub use compose::{compose, compose_resolved, TAGS_NODE};
pub use error::{CompositionError, Result};
pub use graph::{SceneGraph, SceneWriter};
pub use node::{AssetReference, NodeKind, SceneNode};
pub use path::{sanitize_name, ScenePath};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::compose::{compose, compose_resolved};
    pub use crate::error::CompositionError;
    pub use crate::graph::{SceneGraph, SceneWriter};
    pub use crate::node::{NodeKind, SceneNode};
    pub use crate::path::ScenePath;
}
