//! Catalog errors

use fdl_core::{AssetId, TagId};
use thiserror::Error;

/// Asset catalog errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("asset not found: {0}")]
    NotFound(AssetId),

    #[error("asset already registered: {0}")]
    AlreadyRegistered(AssetId),

    #[error("asset {asset} declares tag {tag} twice")]
    DuplicateTag { asset: AssetId, tag: TagId },

    /// Node path is relative or offset is not finite
    #[error("asset {asset} has a malformed attachment on tag {tag}")]
    InvalidAttachment { asset: AssetId, tag: TagId },

    #[error("variant set '{set}' has no option '{option}'")]
    UnknownVariant { set: String, option: String },
}

/// Result type alias
pub type Result<T> = core::result::Result<T, CatalogError>;
