//! # fdl_engine - Factory Layout Engine
//!
//! The orchestration crate that ties the layout crates together:
//! - Layout validation, unit normalization and batch expansion
//! - World transform resolution and scaling rules
//! - Collision and clearance detection
//! - Scene graph composition
//! - Result events for an external bus
//!
//! ## Example
//!
//! ```ignore
//! use fdl_engine::prelude::*;
//!
//! let pipeline = LayoutPipeline::builder(catalog)
//!     .config(PipelineConfig::default().with_collision_mode(CollisionMode::Always))
//!     .event_sink(sink)
//!     .build();
//! let report = pipeline.run(&document)?;
//! if !report.is_valid() {
//!     for event in events_from_report(&report) {
//!         println!("{}", event.event_type());
//!     }
//! }
//! ```

// Re-export crates
pub use fdl_asset;
pub use fdl_collision;
pub use fdl_core;
pub use fdl_event;
pub use fdl_layout;
pub use fdl_math;
pub use fdl_scene;

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{CollisionMode, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{events_from_report, LayoutPipeline, PipelineBuilder, PipelineReport, PipelineStage};

/// Prelude - everything needed to run a layout
pub mod prelude {
    pub use crate::config::{CollisionMode, PipelineConfig};
    pub use crate::error::PipelineError;
    pub use crate::pipeline::{events_from_report, LayoutPipeline, PipelineReport, PipelineStage};

    pub use fdl_asset::{AssetCatalog, AssetDefinition, InMemoryCatalog};
    pub use fdl_collision::{CollisionConfig, DetectionReport, Narrowphase};
    pub use fdl_core::{AssetId, InstanceId};
    pub use fdl_event::{EventCollector, EventSink, LayoutEvent};
    pub use fdl_layout::{LayoutDocument, Site};
    pub use fdl_scene::{SceneGraph, SceneWriter};
}
