//! # fdl_collision - Collision & Clearance Detection
//!
//! Finds intersecting instances and instances closer than their required
//! clearance in a resolved layout.
//!
//! # Features
//!
//! - World boxes from instance or asset default volumes
//! - Brute-force and sweep-and-prune broadphase (identical candidate sets)
//! - Oriented-box or triangle-mesh narrowphase
//! - Clearance by box-to-box distance, larger requirement of a pair wins
//! - Bad data excluded with warnings rather than failing the pass
//! - Pair evaluation split across scoped worker threads
//!
//! # Architecture
//!
//! ```text
//!  Site + ResolvedLayout + AssetCatalog
//!                 │
//!                 ▼
//!        ┌─────────────────┐      DataQualityWarning
//!        │  CollisionBody  │ ───────────────────────┐
//!        └─────────────────┘                        │
//!                 │ world AABBs (+clearance)        │
//!                 ▼                                 │
//!        ┌─────────────────┐                        │
//!        │   Broadphase    │                        │
//!        └─────────────────┘                        │
//!                 │ candidate pairs                 │
//!         ┌───────┴────────┐                        │
//!         ▼                ▼                        │
//!   ┌───────────┐   ┌─────────────┐                 │
//!   │Narrowphase│   │  Clearance  │                 │
//!   └───────────┘   └─────────────┘                 │
//!         └───────┬────────┘                        │
//!                 ▼                                 │
//!          DetectionReport ◄────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fdl_collision::prelude::*;
//!
//! let detector = CollisionDetector::new(CollisionConfig::default().with_default_clearance(0.3));
//! let report = detector.detect_layout(&site, &resolved, &catalog)?;
//! for violation in &report.clearance_violations {
//!     println!("{}: short by {:.0} mm", violation.pair, violation.shortfall_in(LengthUnit::Millimeter));
//! }
//! ```

pub mod broad;
pub mod config;
pub mod detector;
pub mod error;
pub mod narrow;
pub mod report;
pub mod volume;

pub use broad::candidate_pairs;
pub use config::{BroadphaseStrategy, CollisionConfig, Narrowphase};
pub use detector::CollisionDetector;
pub use error::{CollisionError, Result};
pub use narrow::{meshes_intersect, refine, InMemoryMeshes, MeshSource, NoMeshes};
pub use report::{ClearanceViolation, CollisionPair, DataQualityWarning, DetectionReport, WarningReason};
pub use volume::{collect_bodies, local_volume, world_aabb, world_obb, CollisionBody, GeometryRef};

pub mod prelude {
    //! Common imports for collision detection
    pub use crate::config::{BroadphaseStrategy, CollisionConfig, Narrowphase};
    pub use crate::detector::CollisionDetector;
    pub use crate::error::{CollisionError, Result};
    pub use crate::narrow::MeshSource;
    pub use crate::report::{ClearanceViolation, CollisionPair, DataQualityWarning, DetectionReport};
    pub use crate::volume::CollisionBody;
    pub use fdl_math::LengthUnit;
}
