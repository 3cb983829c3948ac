//! # fdl_event - Layout Events
//!
//! Boundary adapter between the engine and an external event bus:
//! - [`LayoutEvent`]s built from detection and validation results
//! - Priority-based delivery order
//! - [`EventSink`] implementations: a crossbeam channel and an in-memory
//!   collector

pub mod adapter;
pub mod error;
pub mod event;
pub mod sink;

pub use adapter::{detection_events, scaling_events, EventPublisher};
pub use error::{EventError, Result};
pub use event::{EventEnvelope, LayoutEvent, Priority, EVENT_VERSION};
pub use sink::{ChannelSink, EventCollector, EventSink};

/// Prelude
pub mod prelude {
    pub use crate::{
        ChannelSink, EventCollector, EventEnvelope, EventPublisher, EventSink, LayoutEvent, Priority,
    };
}
