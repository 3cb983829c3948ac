//! # fdl_core - Layout Engine Core
//!
//! Identifiers and the configuration error taxonomy shared by every crate of
//! the factory layout engine.

pub mod error;
pub mod id;

pub use error::{ConfigError, Result};
pub use id::{AreaId, AssetId, EventId, InstanceId, SiteId, TagId};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ConfigError, Result};
    pub use crate::id::{AreaId, AssetId, EventId, InstanceId, SiteId, TagId};
}
