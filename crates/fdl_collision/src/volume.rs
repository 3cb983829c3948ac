//! Bounding volumes of placed instances
//!
//! An instance's own `bounds` are expressed in the instance frame. Without
//! them the asset's default volume is used, which lives in the asset geometry
//! frame and is therefore carried through the asset's default transform too.

use fdl_asset::{AssetCatalog, AssetDefinition};
use fdl_core::InstanceId;
use fdl_layout::{Instance, ResolvedLayout, Site};
use fdl_math::glam::DMat4;
use fdl_math::{Aabb, BoundingVolume, Obb};

use crate::report::{DataQualityWarning, WarningReason};

/// External geometry of a body and where it sits in the world
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryRef {
    /// Opaque geometry reference from the asset definition
    pub source: String,
    /// Asset geometry frame to world
    pub world: DMat4,
}

/// One instance as seen by the detector
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionBody {
    pub id: InstanceId,
    /// Volume frame to world
    pub world: DMat4,
    /// Volume in its own frame
    pub volume: BoundingVolume,
    /// Required clearance in meters, `None` for the configured default
    pub clearance: Option<f64>,
    pub geometry: Option<GeometryRef>,
}

impl CollisionBody {
    pub fn new(id: impl Into<InstanceId>, world: DMat4, volume: impl Into<BoundingVolume>) -> Self {
        Self {
            id: id.into(),
            world,
            volume: volume.into(),
            clearance: None,
            geometry: None,
        }
    }

    pub fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = Some(clearance);
        self
    }

    pub fn with_geometry(mut self, source: impl Into<String>, world: DMat4) -> Self {
        self.geometry = Some(GeometryRef { source: source.into(), world });
        self
    }

    /// Build the body of a placed instance
    ///
    /// `asset` is `None` when the catalog does not know the instance's asset;
    /// that only matters when the instance has no bounds of its own.
    pub fn from_instance(
        instance: &Instance,
        instance_world: DMat4,
        asset: Option<&AssetDefinition>,
    ) -> Result<Self, WarningReason> {
        let (volume, frame) = local_volume(instance, asset)?;
        let mut body = Self::new(instance.id.clone(), instance_world * frame, volume);
        body.clearance = instance.clearance;
        if let Some(asset) = asset {
            body = body.with_geometry(asset.geometry.clone(), instance_world * asset.default_matrix());
        }
        Ok(body)
    }

    /// Why this body cannot take part in detection, if it cannot
    pub fn defect(&self) -> Option<WarningReason> {
        if !self.world.is_finite() {
            return Some(WarningReason::NonFiniteTransform);
        }
        if let Some(defect) = self.volume.defect() {
            return Some(WarningReason::Volume(defect));
        }
        if !self.world_aabb().is_finite() {
            return Some(WarningReason::NonFiniteTransform);
        }
        None
    }

    /// World axis-aligned box
    #[inline]
    pub fn world_aabb(&self) -> Aabb {
        self.volume.world_aabb(&self.world)
    }

    /// World oriented box
    #[inline]
    pub fn world_obb(&self) -> Obb {
        self.volume.world_obb(&self.world)
    }
}

/// The volume an instance is tested with, and its frame relative to the
/// instance frame
pub fn local_volume(
    instance: &Instance,
    asset: Option<&AssetDefinition>,
) -> Result<(BoundingVolume, DMat4), WarningReason> {
    if let Some(bounds) = instance.bounds {
        return Ok((bounds, DMat4::IDENTITY));
    }
    let asset = asset.ok_or(WarningReason::UnknownAsset)?;
    let volume = asset.default_volume.ok_or(WarningReason::MissingVolume)?;
    Ok((volume, asset.default_matrix()))
}

/// World axis-aligned box of a placed instance
pub fn world_aabb(
    instance: &Instance,
    instance_world: &DMat4,
    asset: Option<&AssetDefinition>,
) -> Result<Aabb, WarningReason> {
    let (volume, frame) = local_volume(instance, asset)?;
    Ok(volume.world_aabb(&(*instance_world * frame)))
}

/// World oriented box of a placed instance
pub fn world_obb(
    instance: &Instance,
    instance_world: &DMat4,
    asset: Option<&AssetDefinition>,
) -> Result<Obb, WarningReason> {
    let (volume, frame) = local_volume(instance, asset)?;
    Ok(volume.world_obb(&(*instance_world * frame)))
}

/// Bodies of every resolved instance of a site, in document order
///
/// Instances that cannot be turned into a body are returned as warnings.
pub fn collect_bodies(
    site: &Site,
    resolved: &ResolvedLayout,
    catalog: &dyn AssetCatalog,
) -> (Vec<CollisionBody>, Vec<DataQualityWarning>) {
    let mut bodies = Vec::with_capacity(resolved.len());
    let mut warnings = Vec::new();

    for (_, instance) in site.instances() {
        let Some(world) = resolved.world(&instance.id) else {
            log::warn!("{} has no resolved transform, skipped", instance.id);
            continue;
        };
        let asset = catalog.get_asset(&instance.asset).ok();
        match CollisionBody::from_instance(instance, world, asset.as_deref()) {
            Ok(body) => bodies.push(body),
            Err(reason) => warnings.push(DataQualityWarning::new(instance.id.clone(), reason)),
        }
    }
    (bodies, warnings)
}
