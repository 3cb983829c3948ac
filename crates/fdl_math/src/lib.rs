//! # fdl_math - Layout Math
//!
//! Double-precision spatial primitives for factory layouts: local transforms
//! and their decomposition, the transform hierarchy, unit and axis
//! normalisation, bounding volumes and separating-axis tests.
//!
//! All resolver computation happens in the canonical frame (meters, degrees,
//! Z-up, right-handed). See [`units::UnitSystem::CANONICAL`].

pub mod bounds;
pub mod hierarchy;
pub mod intersect;
pub mod transform;
pub mod units;

pub use glam;

pub use bounds::{Aabb, BoundingVolume, Obb, VolumeDefect};
pub use hierarchy::{NodeKey, TransformHierarchy, TransformNode};
pub use intersect::{obb_intersects_obb, triangles_intersect, Triangle};
pub use transform::{
    conjugate_by_axes, decompose, euler_to_quat, mat3_to_euler, transform_point, wrap_degrees, Transform,
};
pub use units::{
    axis_realignment, convert_length, convert_point, AngleUnit, Handedness, LengthUnit, UnitSystem,
    UpAxis,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bounds::{Aabb, BoundingVolume, Obb};
    pub use crate::hierarchy::{NodeKey, TransformHierarchy, TransformNode};
    pub use crate::transform::{decompose, Transform};
    pub use crate::units::{LengthUnit, UnitSystem};
    pub use glam::{DMat4, DVec3};
}
