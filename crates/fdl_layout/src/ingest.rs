//! Unit and axis normalisation at ingestion
//!
//! Layout documents and asset definitions declare their own units. Everything
//! is converted once, here, into the canonical frame (meters, degrees, Z-up,
//! right-handed) before any transform is resolved.
//!
//! Transforms are realigned by conjugation with the axis matrix `M`, so the
//! resolved hierarchy equals `M · world_source · M⁻¹` scaled to meters.

use fdl_asset::{AssetDefinition, Attachment};
use fdl_math::glam::{DMat3, DMat4, DVec3};
use fdl_math::{conjugate_by_axes, AngleUnit, BoundingVolume, Transform, UnitSystem};

use crate::error::Result;
use crate::model::{Instance, LayoutDocument};

/// Conversion from one declared unit system into the canonical frame
#[derive(Clone, Copy, Debug)]
pub struct Normalizer {
    source: UnitSystem,
    meters_per_unit: f64,
    axes: Option<DMat3>,
}

impl Normalizer {
    pub fn new(source: UnitSystem) -> Self {
        Self {
            source,
            meters_per_unit: source.length.meters_per_unit(),
            axes: source.needs_realignment().then(|| source.realignment_axes()),
        }
    }

    /// Source unit system
    #[inline]
    pub fn source(&self) -> UnitSystem {
        self.source
    }

    /// Scale a length to meters
    #[inline]
    pub fn length(&self, value: f64) -> f64 {
        value * self.meters_per_unit
    }

    /// Scale a point to meters and realign its axes
    pub fn point(&self, p: DVec3) -> DVec3 {
        let scaled = p * self.meters_per_unit;
        match &self.axes {
            Some(axes) => *axes * scaled,
            None => scaled,
        }
    }

    /// Matrix applying [`Normalizer::point`] to homogeneous points
    pub fn matrix(&self) -> DMat4 {
        let axes = self.axes.unwrap_or(DMat3::IDENTITY);
        DMat4::from_mat3(axes * DMat3::from_diagonal(DVec3::splat(self.meters_per_unit)))
    }

    /// Convert a local transform: meters, degrees wrapped to `[0, 360)`,
    /// canonical axes
    pub fn transform(&self, t: &Transform) -> Result<Transform> {
        let rotation = match self.source.angle {
            AngleUnit::Degree => t.rotation(),
            AngleUnit::Radian => {
                let r = t.rotation();
                DVec3::new(r.x.to_degrees(), r.y.to_degrees(), r.z.to_degrees())
            }
        };
        let converted = Transform::new(t.translate() * self.meters_per_unit, rotation, t.scale())?;
        let realigned = match &self.axes {
            Some(axes) => conjugate_by_axes(&converted, axes)?,
            None => converted,
        };
        Ok(realigned.wrapped())
    }

    /// Convert a bounding volume, keeping its variant
    pub fn volume(&self, volume: &BoundingVolume) -> BoundingVolume {
        volume.transformed(&self.matrix())
    }

    fn attachment(&self, attachment: &Attachment) -> Attachment {
        match attachment {
            Attachment::Position { offset } => Attachment::Position { offset: self.point(*offset) },
            Attachment::Node { path } => Attachment::Node { path: path.clone() },
        }
    }

    fn instance(&self, instance: &Instance) -> Result<Instance> {
        let mut out = instance.clone();
        out.transform = self.transform(&instance.transform)?;
        out.bounds = instance.bounds.as_ref().map(|b| self.volume(b));
        out.clearance = instance.clearance.map(|c| self.length(c));
        for tag_override in &mut out.tag_overrides {
            if let Some(attachment) = &tag_override.attachment {
                tag_override.attachment = Some(self.attachment(attachment));
            }
        }
        Ok(out)
    }
}

/// Convert a whole layout into the canonical frame
///
/// Pending batch layouts are expanded first, in source units, so that their
/// pattern planes are realigned with the rest of the document.
pub fn normalize_document(doc: &LayoutDocument) -> Result<LayoutDocument> {
    let mut out = doc.clone();
    if !out.batch_layouts.is_empty() {
        out.expand_batches()?;
    }
    if doc.units.is_canonical() {
        return Ok(out);
    }

    let n = Normalizer::new(doc.units);
    log::debug!(
        "normalising layout from {} / {:?} / {:?}-up / {:?}",
        doc.units.length,
        doc.units.angle,
        doc.units.up_axis,
        doc.units.handedness
    );
    for area in &mut out.site.areas {
        area.transform = n.transform(&area.transform)?;
        for instance in &mut area.instances {
            *instance = n.instance(instance)?;
        }
    }
    let collision = &mut out.constraints.collision_detection;
    collision.clearance_distance = n.length(collision.clearance_distance);
    out.units = UnitSystem::CANONICAL;
    Ok(out)
}

/// Convert an asset definition into the canonical frame
pub fn normalize_asset(asset: &AssetDefinition) -> Result<AssetDefinition> {
    let mut out = asset.clone();
    if asset.units.is_canonical() {
        return Ok(out);
    }

    let n = Normalizer::new(asset.units);
    out.default_transform = n.transform(&asset.default_transform)?;
    out.default_volume = asset.default_volume.as_ref().map(|v| n.volume(v));
    for tag in &mut out.tags {
        tag.attachment = n.attachment(&tag.attachment);
    }
    out.units = UnitSystem::CANONICAL;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Area, Site};
    use approx::assert_abs_diff_eq;
    use fdl_core::AssetId;
    use fdl_math::{Aabb, Handedness, LengthUnit, UpAxis};

    fn doc_with(units: UnitSystem, instance: Instance) -> LayoutDocument {
        LayoutDocument::new(Site::new("plant", "Plant").with_area(Area::new("hall", "Hall").with_instance(instance)))
            .with_units(units)
    }

    #[test]
    fn test_millimeters_to_meters() {
        let instance = Instance::new(
            "P1",
            AssetId::new(),
            Transform::from_translation(DVec3::new(1500.0, -250.0, 0.0)).unwrap(),
        )
        .with_bounds(Aabb::new(DVec3::ZERO, DVec3::new(1000.0, 500.0, 2000.0)))
        .with_clearance(300.0);

        let doc = doc_with(UnitSystem::with_length(LengthUnit::Millimeter), instance);
        let out = normalize_document(&doc).unwrap();
        let p = &out.site.areas[0].instances[0];
        assert!(p.transform.translate().abs_diff_eq(DVec3::new(1.5, -0.25, 0.0), 1e-12));
        assert_abs_diff_eq!(p.clearance.unwrap(), 0.3, epsilon = 1e-12);
        match p.bounds {
            Some(BoundingVolume::Aabb(b)) => assert!(b.max.abs_diff_eq(DVec3::new(1.0, 0.5, 2.0), 1e-12)),
            _ => panic!("bounds lost"),
        }
        assert!(out.units.is_canonical());
    }

    #[test]
    fn test_radians_to_wrapped_degrees() {
        let units = UnitSystem { angle: AngleUnit::Radian, ..UnitSystem::CANONICAL };
        let t = Transform::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -std::f64::consts::FRAC_PI_2), DVec3::ONE).unwrap();
        let out = Normalizer::new(units).transform(&t).unwrap();
        assert_abs_diff_eq!(out.rotation().z, 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_y_up_document_matches_conjugated_world() {
        let units = UnitSystem { up_axis: UpAxis::Y, ..UnitSystem::CANONICAL };
        let t = Transform::new(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 30.0, 0.0), DVec3::new(1.0, 2.0, 1.0)).unwrap();
        let n = Normalizer::new(units);
        let out = n.transform(&t).unwrap();

        let m = n.matrix();
        let expected = m * t.to_matrix() * m.inverse();
        assert!(out.to_matrix().abs_diff_eq(expected, 1e-9));
        assert!(out.translate().abs_diff_eq(DVec3::new(1.0, -3.0, 2.0), 1e-12));
        // source height scale lands on Z
        assert!(out.scale().abs_diff_eq(DVec3::new(1.0, 1.0, 2.0), 1e-12));
    }

    #[test]
    fn test_left_handed_volume_stays_valid() {
        let units = UnitSystem { handedness: Handedness::Left, ..UnitSystem::CANONICAL };
        let volume = BoundingVolume::Aabb(Aabb::new(DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 3.0, 1.0)));
        match Normalizer::new(units).volume(&volume) {
            BoundingVolume::Aabb(b) => {
                assert!(b.is_valid());
                assert_eq!(b.min, DVec3::new(0.0, -3.0, 0.0));
                assert_eq!(b.max, DVec3::new(1.0, -1.0, 1.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_asset_offsets_and_volume() {
        let asset = AssetDefinition::new("Pump", "pump.usd")
            .with_units(UnitSystem::with_length(LengthUnit::Centimeter))
            .with_default_volume(Aabb::new(DVec3::ZERO, DVec3::splat(100.0)))
            .with_tag(fdl_asset::Tag::new(
                fdl_core::TagId::new(),
                "Outlet",
                fdl_asset::TagKind::Sensor,
                Attachment::at(DVec3::new(50.0, 0.0, 80.0)),
            ));
        let out = normalize_asset(&asset).unwrap();
        match &out.tags[0].attachment {
            Attachment::Position { offset } => assert!(offset.abs_diff_eq(DVec3::new(0.5, 0.0, 0.8), 1e-12)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(out.units.is_canonical());
        assert!(matches!(out.default_volume, Some(BoundingVolume::Aabb(b)) if b.max.abs_diff_eq(DVec3::ONE, 1e-12)));
    }
}
