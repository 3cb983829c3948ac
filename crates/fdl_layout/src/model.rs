//! Layout document model
//!
//! A [`LayoutDocument`] owns one [`Site`]; the site owns its areas and the
//! areas own their instances. Asset definitions are referenced by id only.

use std::collections::{BTreeMap, HashSet};

use fdl_asset::Attachment;
use fdl_core::{AreaId, AssetId, InstanceId, SiteId, TagId};
use fdl_math::{BoundingVolume, Transform, UnitSystem};
use serde::{Deserialize, Serialize};

use crate::batch::BatchLayoutSpec;
use crate::constraints::{ScalingConstraint, ScalingOverride};
use crate::error::{LayoutError, Result};

/// Document format version understood by this crate
pub const LAYOUT_VERSION: &str = "0.1";

fn default_version() -> String {
    LAYOUT_VERSION.to_string()
}

/// Collision detection switches from the document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionDetection {
    pub enabled: bool,
    /// Required gap between any two instances, in document length units
    pub clearance_distance: f64,
}

impl Default for CollisionDetection {
    fn default() -> Self {
        Self {
            enabled: false,
            clearance_distance: 0.0,
        }
    }
}

/// Constraints applying to every instance unless overridden
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConstraints {
    pub scaling: ScalingConstraint,
    pub collision_detection: CollisionDetection,
}

impl GlobalConstraints {
    pub fn with_scaling(mut self, scaling: ScalingConstraint) -> Self {
        self.scaling = scaling;
        self
    }

    /// Enable collision detection with a clearance requirement
    pub fn with_collision_detection(mut self, clearance_distance: f64) -> Self {
        self.collision_detection = CollisionDetection {
            enabled: true,
            clearance_distance,
        };
        self
    }
}

/// Geographic position of a site
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

/// Per-instance replacement of a tag's attachment or properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagOverride {
    pub tag_id: TagId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl TagOverride {
    pub fn new(tag_id: TagId) -> Self {
        Self {
            tag_id,
            attachment: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// One placed asset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub asset: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Local transform relative to the containing area
    #[serde(default)]
    pub transform: Transform,
    /// Local bounds in the instance frame, replacing the asset's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingVolume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ScalingOverride>,
    /// Required clearance around this instance, replacing the global default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_overrides: Vec<TagOverride>,
    /// Variant set name to selected option
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variant_selections: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Instance {
    pub fn new(id: impl Into<InstanceId>, asset: AssetId, transform: Transform) -> Self {
        Self {
            id: id.into(),
            asset,
            name: None,
            transform,
            bounds: None,
            scaling: None,
            clearance: None,
            tag_overrides: Vec::new(),
            variant_selections: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_bounds(mut self, bounds: impl Into<BoundingVolume>) -> Self {
        self.bounds = Some(bounds.into());
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingOverride) -> Self {
        self.scaling = Some(scaling);
        self
    }

    pub fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = Some(clearance);
        self
    }

    pub fn with_tag_override(mut self, tag_override: TagOverride) -> Self {
        self.tag_overrides.push(tag_override);
        self
    }

    pub fn with_variant(mut self, set: impl Into<String>, option: impl Into<String>) -> Self {
        self.variant_selections.insert(set.into(), option.into());
        self
    }

    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Link between two instances of an area (pipe, cable, conveyor)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub kind: String,
    pub from_instance: InstanceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_port: Option<String>,
    pub to_instance: InstanceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_port: Option<String>,
}

fn default_area_kind() -> String {
    "production".to_string()
}

/// Area of a site: production hall, storage, control room
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    #[serde(default = "default_area_kind")]
    pub kind: String,
    /// Local transform relative to the site
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
}

impl Area {
    pub fn new(id: impl Into<AreaId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: default_area_kind(),
            transform: Transform::IDENTITY,
            instances: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances.iter().find(|i| &i.id == id)
    }
}

/// Root of a layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl Site {
    pub fn new(id: impl Into<SiteId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
            areas: Vec::new(),
        }
    }

    pub fn with_area(mut self, area: Area) -> Self {
        self.areas.push(area);
        self
    }

    pub fn area(&self, id: &AreaId) -> Option<&Area> {
        self.areas.iter().find(|a| &a.id == id)
    }

    pub fn area_mut(&mut self, id: &AreaId) -> Option<&mut Area> {
        self.areas.iter_mut().find(|a| &a.id == id)
    }

    /// Every instance with its area, in document order
    pub fn instances(&self) -> impl Iterator<Item = (&Area, &Instance)> {
        self.areas
            .iter()
            .flat_map(|area| area.instances.iter().map(move |instance| (area, instance)))
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances().map(|(_, i)| i).find(|i| &i.id == id)
    }

    pub fn instance_count(&self) -> usize {
        self.areas.iter().map(|a| a.instances.len()).sum()
    }

    /// Check ids are unique and references resolve
    ///
    /// Instance ids must be unique across the whole site, not just per area.
    pub fn validate(&self) -> Result<()> {
        let mut areas = HashSet::new();
        let mut instances = HashSet::new();
        for area in &self.areas {
            if !areas.insert(&area.id) {
                return Err(LayoutError::DuplicateArea(area.id.clone()));
            }
            for instance in &area.instances {
                if !instances.insert(&instance.id) {
                    return Err(LayoutError::DuplicateInstance(instance.id.clone()));
                }
                if let Some(value) = instance.clearance {
                    if value < 0.0 || !value.is_finite() {
                        return Err(LayoutError::NegativeClearance { value });
                    }
                }
            }
        }
        for area in &self.areas {
            for connection in &area.connections {
                for end in [&connection.from_instance, &connection.to_instance] {
                    if area.instance(end).is_none() {
                        return Err(LayoutError::UnknownConnectionEndpoint {
                            connection: connection.id.clone(),
                            instance: end.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// A complete layout as loaded from disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default)]
    pub constraints: GlobalConstraints,
    pub site: Site,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub batch_layouts: Vec<BatchLayoutSpec>,
}

impl LayoutDocument {
    /// Document in canonical units with default constraints
    pub fn new(site: Site) -> Self {
        Self {
            version: default_version(),
            units: UnitSystem::CANONICAL,
            constraints: GlobalConstraints::default(),
            site,
            batch_layouts: Vec::new(),
        }
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    pub fn with_constraints(mut self, constraints: GlobalConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_batch_layout(mut self, spec: BatchLayoutSpec) -> Self {
        self.batch_layouts.push(spec);
        self
    }

    /// Check the site and the global clearance
    pub fn validate(&self) -> Result<()> {
        if self.version != LAYOUT_VERSION {
            log::warn!("layout version {} differs from {}", self.version, LAYOUT_VERSION);
        }
        let clearance = self.constraints.collision_detection.clearance_distance;
        if clearance < 0.0 || !clearance.is_finite() {
            return Err(LayoutError::NegativeClearance { value: clearance });
        }
        self.site.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdl_math::glam::DVec3;

    fn pump(id: &str) -> Instance {
        Instance::new(id, AssetId::new(), Transform::IDENTITY)
    }

    #[test]
    fn test_duplicate_instance_across_areas() {
        let site = Site::new("plant", "Plant")
            .with_area(Area::new("hall_a", "Hall A").with_instance(pump("P1")))
            .with_area(Area::new("hall_b", "Hall B").with_instance(pump("P1")));
        assert_eq!(
            site.validate().unwrap_err(),
            LayoutError::DuplicateInstance(InstanceId::from("P1"))
        );
    }

    #[test]
    fn test_dangling_connection() {
        let mut area = Area::new("hall", "Hall").with_instance(pump("P1"));
        area.connections.push(Connection {
            id: "pipe_1".into(),
            kind: "pipe".into(),
            from_instance: "P1".into(),
            from_port: None,
            to_instance: "T9".into(),
            to_port: None,
        });
        let site = Site::new("plant", "Plant").with_area(area);
        assert!(matches!(
            site.validate(),
            Err(LayoutError::UnknownConnectionEndpoint { .. })
        ));
    }

    #[test]
    fn test_document_deserialize_defaults() {
        let json = r#"{
            "site": {
                "id": "plant",
                "name": "Plant",
                "areas": [{
                    "id": "hall",
                    "name": "Hall",
                    "instances": [{
                        "id": "Pump_01",
                        "asset": "018c3f7e-8a2b-7c3d-9e4f-5a6b7c8d9e12",
                        "transform": { "translate": [1.0, 2.0, 0.0] }
                    }]
                }]
            }
        }"#;
        let doc: LayoutDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.version, LAYOUT_VERSION);
        assert!(doc.units.is_canonical());
        assert!(!doc.constraints.collision_detection.enabled);
        assert!(doc.constraints.scaling.allow_scaling);
        let area = &doc.site.areas[0];
        assert_eq!(area.kind, "production");
        assert_eq!(area.instances[0].transform.translate(), DVec3::new(1.0, 2.0, 0.0));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_negative_global_clearance() {
        let doc = LayoutDocument::new(Site::new("s", "S"))
            .with_constraints(GlobalConstraints::default().with_collision_detection(-1.0));
        assert!(matches!(doc.validate(), Err(LayoutError::NegativeClearance { .. })));
    }
}
