//! Bounding volumes for placement checks

use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Inverted box that any point expands
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::MAX),
        max: DVec3::splat(f64::MIN),
    };

    /// Create from min and max points
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Create from center and half-extents
    #[inline]
    pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box containing every point
    pub fn from_points(points: &[DVec3]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |aabb, &p| aabb.expand_to_include(p))
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Check min <= max on every axis
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Expand to include a point
    #[inline]
    pub fn expand_to_include(self, point: DVec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Union of two boxes
    #[inline]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow by a uniform margin in all directions
    #[inline]
    pub fn expand(&self, amount: f64) -> Self {
        Self {
            min: self.min - DVec3::splat(amount),
            max: self.max + DVec3::splat(amount),
        }
    }

    /// Closed containment test
    #[inline]
    pub fn contains_point(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Closed-interval overlap test; boxes sharing a face intersect
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Per-axis gap between two boxes, zero where they overlap
    #[inline]
    pub fn gap(&self, other: &Aabb) -> DVec3 {
        (other.min - self.max).max(self.min - other.max).max(DVec3::ZERO)
    }

    /// Minimum Euclidean distance between two boxes, zero when they touch
    #[inline]
    pub fn distance(&self, other: &Aabb) -> f64 {
        self.gap(other).length()
    }

    /// The 8 corners
    pub fn corners(&self) -> [DVec3; 8] {
        [
            DVec3::new(self.min.x, self.min.y, self.min.z),
            DVec3::new(self.max.x, self.min.y, self.min.z),
            DVec3::new(self.min.x, self.max.y, self.min.z),
            DVec3::new(self.max.x, self.max.y, self.min.z),
            DVec3::new(self.min.x, self.min.y, self.max.z),
            DVec3::new(self.max.x, self.min.y, self.max.z),
            DVec3::new(self.min.x, self.max.y, self.max.z),
            DVec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Axis-aligned box around the transformed corners
    pub fn transform(&self, matrix: &DMat4) -> Self {
        self.corners()
            .iter()
            .fold(Self::EMPTY, |aabb, c| aabb.expand_to_include(matrix.transform_point3(*c)))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Oriented bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obb {
    pub center: DVec3,
    /// Local X, Y and Z axes in the parent frame
    pub axes: [DVec3; 3],
    pub half_extents: DVec3,
}

impl Obb {
    #[inline]
    pub const fn new(center: DVec3, axes: [DVec3; 3], half_extents: DVec3) -> Self {
        Self { center, axes, half_extents }
    }

    /// Box with the parent frame's axes
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            center: aabb.center(),
            axes: [DVec3::X, DVec3::Y, DVec3::Z],
            half_extents: aabb.half_extents(),
        }
    }

    /// Half-edge vectors: each axis scaled by its half-extent
    #[inline]
    pub fn half_edges(&self) -> [DVec3; 3] {
        [
            self.axes[0] * self.half_extents.x,
            self.axes[1] * self.half_extents.y,
            self.axes[2] * self.half_extents.z,
        ]
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let [e0, e1, e2] = self.half_edges();
        let c = self.center;
        [
            c - e0 - e1 - e2,
            c + e0 - e1 - e2,
            c - e0 + e1 - e2,
            c + e0 + e1 - e2,
            c - e0 - e1 + e2,
            c + e0 - e1 + e2,
            c - e0 + e1 + e2,
            c + e0 + e1 + e2,
        ]
    }

    /// Tight axis-aligned box
    pub fn to_aabb(&self) -> Aabb {
        let [e0, e1, e2] = self.half_edges();
        let reach = e0.abs() + e1.abs() + e2.abs();
        Aabb::from_center_half_extents(self.center, reach)
    }

    /// Transform center and half-edges by a matrix
    ///
    /// Scale carried by the matrix moves into the half-extents so the axes
    /// stay unit length.
    pub fn transform(&self, matrix: &DMat4) -> Self {
        let linear = DMat3::from_mat4(*matrix);
        let edges = self.half_edges().map(|e| linear * e);
        let axes = edges.map(|e| e.normalize_or_zero());
        Self {
            center: matrix.transform_point3(self.center),
            axes,
            half_extents: DVec3::new(edges[0].length(), edges[1].length(), edges[2].length()),
        }
    }

    /// Project onto an axis, returning (center, radius) of the interval
    #[inline]
    pub fn project(&self, axis: DVec3) -> (f64, f64) {
        let radius = self.half_edges().iter().map(|e| e.dot(axis).abs()).sum();
        (self.center.dot(axis), radius)
    }
}

/// What makes a volume unusable for detection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeDefect {
    /// A coordinate is NaN or infinite
    NonFinite,
    /// An AABB has min > max on some axis
    Inverted,
    /// An OBB has a negative half-extent or collapsed axes
    Degenerate,
}

impl core::fmt::Display for VolumeDefect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NonFinite => f.write_str("non-finite coordinates"),
            Self::Inverted => f.write_str("inverted box (min > max)"),
            Self::Degenerate => f.write_str("degenerate oriented box"),
        }
    }
}

/// Tagged bounding volume as written in layout and asset documents
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoundingVolume {
    #[serde(rename = "AABB")]
    Aabb(Aabb),
    #[serde(rename = "OBB")]
    Obb(Obb),
}

impl BoundingVolume {
    /// Check the volume is usable
    pub fn defect(&self) -> Option<VolumeDefect> {
        match self {
            Self::Aabb(aabb) => {
                if !aabb.is_finite() {
                    Some(VolumeDefect::NonFinite)
                } else if !aabb.is_valid() {
                    Some(VolumeDefect::Inverted)
                } else {
                    None
                }
            }
            Self::Obb(obb) => {
                let finite = obb.center.is_finite()
                    && obb.half_extents.is_finite()
                    && obb.axes.iter().all(|a| a.is_finite());
                if !finite {
                    return Some(VolumeDefect::NonFinite);
                }
                let basis = DMat3::from_cols(obb.axes[0], obb.axes[1], obb.axes[2]);
                if obb.half_extents.min_element() < 0.0 || basis.determinant().abs() < 1e-9 {
                    Some(VolumeDefect::Degenerate)
                } else {
                    None
                }
            }
        }
    }

    /// World axis-aligned box: the 8 local corners through `matrix`
    pub fn world_aabb(&self, matrix: &DMat4) -> Aabb {
        match self {
            Self::Aabb(aabb) => aabb.transform(matrix),
            Self::Obb(obb) => Aabb::from_points(&obb.transform(matrix).corners()),
        }
    }

    /// World oriented box
    pub fn world_obb(&self, matrix: &DMat4) -> Obb {
        match self {
            Self::Aabb(aabb) => Obb::from_aabb(aabb).transform(matrix),
            Self::Obb(obb) => obb.transform(matrix),
        }
    }

    /// Same volume expressed through `matrix`, keeping the variant
    ///
    /// Boxes stay axis-aligned; this is exact for axis permutations and
    /// uniform scale.
    pub fn transformed(&self, matrix: &DMat4) -> Self {
        match self {
            Self::Aabb(aabb) => Self::Aabb(aabb.transform(matrix)),
            Self::Obb(obb) => Self::Obb(obb.transform(matrix)),
        }
    }
}

impl From<Aabb> for BoundingVolume {
    fn from(aabb: Aabb) -> Self {
        Self::Aabb(aabb)
    }
}

impl From<Obb> for BoundingVolume {
    fn from(obb: Obb) -> Self {
        Self::Obb(obb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::DQuat;

    fn unit_box() -> Aabb {
        Aabb::new(DVec3::ZERO, DVec3::ONE)
    }

    #[test]
    fn test_face_touching_intersects() {
        let a = unit_box();
        let b = Aabb::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert_eq!(a.distance(&b), 0.0);

        let c = Aabb::new(DVec3::new(1.0 + 1e-9, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_distance_between_boxes() {
        let a = unit_box();
        let b = Aabb::new(DVec3::new(1.25, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert_abs_diff_eq!(a.distance(&b), 0.25, epsilon = 1e-12);

        // diagonal gap: 3-4-5
        let c = Aabb::new(DVec3::new(4.0, 5.0, 0.0), DVec3::new(5.0, 6.0, 1.0));
        assert_abs_diff_eq!(a.distance(&c), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aabb_transform_rotated() {
        let m = DMat4::from_rotation_translation(
            DQuat::from_rotation_z(45f64.to_radians()),
            DVec3::new(10.0, 0.0, 0.0),
        );
        let world = Aabb::from_center_half_extents(DVec3::ZERO, DVec3::ONE).transform(&m);
        let r = 2f64.sqrt();
        assert!(world.min.abs_diff_eq(DVec3::new(10.0 - r, -r, -1.0), 1e-12));
        assert!(world.max.abs_diff_eq(DVec3::new(10.0 + r, r, 1.0), 1e-12));
    }

    #[test]
    fn test_obb_transform_moves_scale_into_extents() {
        let m = DMat4::from_scale_rotation_translation(
            DVec3::new(2.0, 1.0, 3.0),
            DQuat::from_rotation_z(90f64.to_radians()),
            DVec3::new(0.0, 0.0, 5.0),
        );
        let obb = Obb::from_aabb(&Aabb::from_center_half_extents(DVec3::ZERO, DVec3::splat(0.5)));
        let world = obb.transform(&m);
        assert!(world.center.abs_diff_eq(DVec3::new(0.0, 0.0, 5.0), 1e-12));
        assert!(world.half_extents.abs_diff_eq(DVec3::new(1.0, 0.5, 1.5), 1e-12));
        assert!(world.axes[0].abs_diff_eq(DVec3::Y, 1e-12));
        assert!(world.axes[1].abs_diff_eq(DVec3::NEG_X, 1e-12));
    }

    #[test]
    fn test_obb_to_aabb_matches_corners() {
        let obb = Obb::new(
            DVec3::new(1.0, 2.0, 3.0),
            [
                DVec3::new(1.0, 1.0, 0.0).normalize(),
                DVec3::new(-1.0, 1.0, 0.0).normalize(),
                DVec3::Z,
            ],
            DVec3::new(2.0, 1.0, 0.5),
        );
        let from_corners = Aabb::from_points(&obb.corners());
        let direct = obb.to_aabb();
        assert!(from_corners.min.abs_diff_eq(direct.min, 1e-12));
        assert!(from_corners.max.abs_diff_eq(direct.max, 1e-12));
    }

    #[test]
    fn test_volume_defects() {
        let inverted = BoundingVolume::Aabb(Aabb::new(DVec3::ONE, DVec3::ZERO));
        assert_eq!(inverted.defect(), Some(VolumeDefect::Inverted));

        let nan = BoundingVolume::Aabb(Aabb::new(DVec3::new(f64::NAN, 0.0, 0.0), DVec3::ONE));
        assert_eq!(nan.defect(), Some(VolumeDefect::NonFinite));

        let flat = BoundingVolume::Obb(Obb::new(DVec3::ZERO, [DVec3::X, DVec3::X, DVec3::Z], DVec3::ONE));
        assert_eq!(flat.defect(), Some(VolumeDefect::Degenerate));

        assert_eq!(BoundingVolume::Aabb(unit_box()).defect(), None);
    }

    #[test]
    fn test_volume_serde_tag() {
        let json = r#"{"type": "AABB", "min": [0.0, 0.0, 0.0], "max": [1.0, 2.0, 3.0]}"#;
        let volume: BoundingVolume = serde_json::from_str(json).unwrap();
        assert_eq!(volume, BoundingVolume::Aabb(Aabb::new(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0))));

        let text = serde_json::to_string(&volume).unwrap();
        assert!(text.contains("\"type\":\"AABB\""));
    }
}
