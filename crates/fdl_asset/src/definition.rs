//! Asset definitions and their attachment points
//!
//! An [`AssetDefinition`] is an immutable template shared by every instance
//! placed from it. Geometry itself lives outside the engine; the definition
//! only carries a reference to it.

use std::collections::{BTreeMap, BTreeSet};

use fdl_core::{AssetId, TagId};
use fdl_math::glam::{DMat4, DVec3};
use fdl_math::{BoundingVolume, Transform, UnitSystem};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Kind of signal a tag represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Sensor,
    Actuator,
    Indicator,
    ControlPoint,
    Alarm,
    Setpoint,
    Status,
}

impl TagKind {
    /// Token as written in asset documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Actuator => "actuator",
            Self::Indicator => "indicator",
            Self::ControlPoint => "control_point",
            Self::Alarm => "alarm",
            Self::Setpoint => "setpoint",
            Self::Status => "status",
        }
    }
}

/// Where a tag sits on its asset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Attachment {
    /// Fixed offset in the asset's local frame
    #[serde(rename = "by_position")]
    Position { offset: DVec3 },
    /// Origin of a named node in the external geometry
    #[serde(rename = "by_node")]
    Node { path: String },
}

impl Attachment {
    /// Offset attachment
    #[inline]
    pub fn at(offset: DVec3) -> Self {
        Self::Position { offset }
    }

    /// Node attachment
    #[inline]
    pub fn node(path: impl Into<String>) -> Self {
        Self::Node { path: path.into() }
    }

    /// Node paths are absolute
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Position { offset } => offset.is_finite(),
            Self::Node { path } => path.starts_with('/'),
        }
    }
}

/// Attachment point on an asset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub kind: TagKind,
    /// Engineering unit such as `bar` or `m³/h`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eu_unit: Option<String>,
    /// Offset is already in world coordinates
    #[serde(default)]
    pub world_space: bool,
    #[serde(flatten)]
    pub attachment: Attachment,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Tag {
    pub fn new(id: TagId, name: impl Into<String>, kind: TagKind, attachment: Attachment) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            eu_unit: None,
            world_space: false,
            attachment,
            properties: BTreeMap::new(),
        }
    }

    /// Set the engineering unit (builder pattern)
    pub fn with_eu_unit(mut self, unit: impl Into<String>) -> Self {
        self.eu_unit = Some(unit.into());
        self
    }
}

/// Named set of mutually exclusive options (variants, LODs)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    pub name: String,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl VariantSet {
    #[inline]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Reusable asset template
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub id: AssetId,
    pub name: String,
    /// External geometry reference, opaque to the engine
    pub geometry: String,
    #[serde(default)]
    pub default_transform: Transform,
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Local bounds in the geometry frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_volume: Option<BoundingVolume>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantSet>,
}

impl AssetDefinition {
    /// Definition with a fresh id, identity transform and canonical units
    pub fn new(name: impl Into<String>, geometry: impl Into<String>) -> Self {
        Self {
            id: AssetId::new(),
            name: name.into(),
            geometry: geometry.into(),
            default_transform: Transform::IDENTITY,
            units: UnitSystem::CANONICAL,
            tags: Vec::new(),
            default_volume: None,
            variants: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: AssetId) -> Self {
        self.id = id;
        self
    }

    pub fn with_default_transform(mut self, transform: Transform) -> Self {
        self.default_transform = transform;
        self
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_default_volume(mut self, volume: impl Into<BoundingVolume>) -> Self {
        self.default_volume = Some(volume.into());
        self
    }

    pub fn with_variant_set(mut self, set: VariantSet) -> Self {
        self.variants.push(set);
        self
    }

    /// Find a tag by id
    pub fn tag(&self, id: &TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| &t.id == id)
    }

    /// Find a variant set by name
    pub fn variant_set(&self, name: &str) -> Option<&VariantSet> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Matrix of the default transform
    #[inline]
    pub fn default_matrix(&self) -> DMat4 {
        self.default_transform.to_matrix()
    }

    /// Check structural rules: unique tag ids, absolute node paths and
    /// variant defaults that name a declared option
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for tag in &self.tags {
            if !seen.insert(tag.id) {
                return Err(CatalogError::DuplicateTag { asset: self.id, tag: tag.id });
            }
            if !tag.attachment.is_well_formed() {
                return Err(CatalogError::InvalidAttachment { asset: self.id, tag: tag.id });
            }
        }
        for set in &self.variants {
            if let Some(default) = &set.default {
                if !set.has_option(default) {
                    return Err(CatalogError::UnknownVariant {
                        set: set.name.clone(),
                        option: default.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
