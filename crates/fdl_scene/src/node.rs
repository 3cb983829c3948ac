//! Scene nodes

use std::collections::BTreeMap;

use fdl_core::{AssetId, InstanceId};
use fdl_math::glam::DMat4;
use fdl_math::{decompose, Transform};
use serde::{Deserialize, Serialize};

use crate::path::ScenePath;

/// What a scene node stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Site,
    Area,
    Instance,
    /// Container of an instance's tag nodes
    TagGroup,
    Tag,
}

/// Stable reference from an instance node to its asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub asset: AssetId,
    /// Geometry reference copied from the asset definition
    pub geometry: String,
}

/// One node of the composed scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub path: ScenePath,
    pub kind: NodeKind,
    /// Transform relative to the parent node
    pub local: DMat4,
    /// Layout instance this node was composed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<AssetReference>,
    /// Variant set name to selected option
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Layout object the node was composed from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,
    /// Child paths in composition order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ScenePath>,
}

impl SceneNode {
    pub fn new(path: ScenePath, kind: NodeKind, local: DMat4) -> Self {
        Self {
            path,
            kind,
            local,
            instance: None,
            reference: None,
            variants: BTreeMap::new(),
            attributes: BTreeMap::new(),
            origin: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Name of the node (last path element)
    #[inline]
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Local transform as translate / rotation / scale
    pub fn decomposed(&self) -> fdl_core::Result<Transform> {
        decompose(&self.local)
    }
}
