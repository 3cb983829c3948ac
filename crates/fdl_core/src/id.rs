//! Identifiers for assets, tags, events, areas and instances
//!
//! Asset, tag and event identifiers are time-ordered UUIDv7 values so that catalogs
//! sort by creation time. Layout-scoped identifiers (instances, areas) are
//! plain names chosen by the layout author.

use core::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

macro_rules! time_ordered_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh time-ordered identifier
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID without checking its version
            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse a UUIDv7 string
            pub fn parse(text: &str) -> Result<Self, ConfigError> {
                let uuid = Uuid::parse_str(text)
                    .map_err(|_| ConfigError::InvalidIdentifier(text.to_string()))?;
                let id = Self(uuid);
                if !id.is_time_ordered() {
                    return Err(ConfigError::InvalidIdentifier(text.to_string()));
                }
                Ok(id)
            }

            /// The wrapped UUID
            #[inline]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Whether this is an RFC 4122 version 7 UUID
            pub fn is_time_ordered(&self) -> bool {
                self.0.get_version_num() == 7 && self.0.get_variant() == uuid::Variant::RFC4122
            }

            /// Unix timestamp in milliseconds stored in the leading 48 bits
            pub fn timestamp_ms(&self) -> u64 {
                let bytes = self.0.as_bytes();
                bytes[..6].iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

time_ordered_id!(
    /// Identifier of an asset definition in the catalog
    AssetId
);

time_ordered_id!(
    /// Identifier of an attachment point (tag) on an asset
    TagId
);

time_ordered_id!(
    /// Identifier of an outgoing layout event
    EventId
);

macro_rules! named_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Box<str>);

        impl $name {
            /// Create from a name
            pub fn new(name: impl Into<Box<str>>) -> Self {
                Self(name.into())
            }

            /// Get the name
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

named_id!(
    /// Identifier of an instance, unique within a layout
    InstanceId
);

named_id!(
    /// Identifier of an area within a site
    AreaId
);

named_id!(
    /// Identifier of a site
    SiteId
);
