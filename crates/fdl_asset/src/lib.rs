//! # fdl_asset - Asset Catalog
//!
//! Immutable asset templates and the catalog they are looked up in:
//! - [`AssetDefinition`] with its geometry reference, default transform and
//!   declared units
//! - Attachment points ([`Tag`]) by local offset or by named node
//! - Variant sets passed through to the scene as selection tokens
//! - [`AssetCatalog`] trait and the lock-protected [`InMemoryCatalog`]
//!
//! Definitions are shared read-only through `Arc` by every instance that
//! places them.

pub mod catalog;
pub mod definition;
pub mod error;

pub use catalog::{AssetCatalog, InMemoryCatalog};
pub use definition::{AssetDefinition, Attachment, Tag, TagKind, VariantSet};
pub use error::{CatalogError, Result};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::catalog::{AssetCatalog, InMemoryCatalog};
    pub use crate::definition::{AssetDefinition, Attachment, Tag, TagKind, VariantSet};
    pub use crate::error::CatalogError;
}
