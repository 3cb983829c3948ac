//! Local transforms: translate, Euler rotation in degrees, positive scale
//!
//! The matrix form is `T · R · S` with `R = Rz · Ry · Rx`, so X rotation is
//! applied first. [`decompose`] inverts [`Transform::to_matrix`].

use fdl_core::{ConfigError, Result};
use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Below this, a basis column or a rotation cosine counts as zero
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Wrap an angle in degrees into `[0, 360)`
#[inline]
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rotation quaternion for Euler degrees applied X, then Y, then Z
pub fn euler_to_quat(rotation_degrees: DVec3) -> DQuat {
    let r = rotation_degrees;
    DQuat::from_rotation_z(r.z.to_radians())
        * DQuat::from_rotation_y(r.y.to_radians())
        * DQuat::from_rotation_x(r.x.to_radians())
}

/// Euler degrees (X, Y, Z) of a pure rotation matrix, wrapped to `[0, 360)`
pub fn mat3_to_euler(rotation: &DMat3) -> DVec3 {
    // r(row, col)
    let r = |row: usize, col: usize| rotation.col(col)[row];

    let pitch = (-r(2, 0)).atan2(r(0, 0).hypot(r(1, 0)));
    let (roll, yaw) = if pitch.cos() > DEGENERATE_EPSILON.sqrt() {
        (r(2, 1).atan2(r(2, 2)), r(1, 0).atan2(r(0, 0)))
    } else {
        // Gimbal lock: fold yaw into roll
        ((-r(1, 2)).atan2(r(1, 1)), 0.0)
    };

    DVec3::new(
        wrap_degrees(roll.to_degrees()),
        wrap_degrees(pitch.to_degrees()),
        wrap_degrees(yaw.to_degrees()),
    )
}

/// Local transform of a node relative to its parent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransformDesc", into = "TransformDesc")]
pub struct Transform {
    translate: DVec3,
    rotation: DVec3,
    scale: DVec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        translate: DVec3::ZERO,
        rotation: DVec3::ZERO,
        scale: DVec3::ONE,
    };

    /// Create a transform, rejecting non-finite values and non-positive scale
    ///
    /// Rotation is stored as given; see [`Transform::wrapped`].
    pub fn new(translate: DVec3, rotation: DVec3, scale: DVec3) -> Result<Self> {
        if !translate.is_finite() {
            return Err(ConfigError::NonFinite("translate"));
        }
        if !rotation.is_finite() {
            return Err(ConfigError::NonFinite("rotation"));
        }
        for (axis, value) in [('x', scale.x), ('y', scale.y), ('z', scale.z)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveScale { axis, value });
            }
        }
        Ok(Self { translate, rotation, scale })
    }

    /// Same transform with every rotation angle wrapped to `[0, 360)`
    pub fn wrapped(self) -> Self {
        Self {
            rotation: DVec3::new(
                wrap_degrees(self.rotation.x),
                wrap_degrees(self.rotation.y),
                wrap_degrees(self.rotation.z),
            ),
            ..self
        }
    }

    /// Pure translation
    pub fn from_translation(translate: DVec3) -> Result<Self> {
        Self::new(translate, DVec3::ZERO, DVec3::ONE)
    }

    /// Translation in meters
    #[inline]
    pub fn translate(&self) -> DVec3 {
        self.translate
    }

    /// Euler rotation in degrees
    #[inline]
    pub fn rotation(&self) -> DVec3 {
        self.rotation
    }

    /// Per-axis scale, all strictly positive
    #[inline]
    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    /// Whether scale is exactly (1, 1, 1)
    #[inline]
    pub fn is_unit_scale(&self) -> bool {
        self.scale == DVec3::ONE
    }

    /// Replace the translation
    pub fn with_translate(self, translate: DVec3) -> Result<Self> {
        Self::new(translate, self.rotation, self.scale)
    }

    /// Replace the rotation
    pub fn with_rotation(self, rotation: DVec3) -> Result<Self> {
        Self::new(self.translate, rotation, self.scale)
    }

    /// Replace the scale
    pub fn with_scale(self, scale: DVec3) -> Result<Self> {
        Self::new(self.translate, self.rotation, scale)
    }

    /// Rotation as a quaternion
    #[inline]
    pub fn rotation_quat(&self) -> DQuat {
        euler_to_quat(self.rotation)
    }

    /// Convert to a 4x4 matrix (`T · R · S`)
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.translate)
    }

    /// Inverse matrix (`S⁻¹ · R⁻¹ · T⁻¹`)
    pub fn inverse_matrix(&self) -> DMat4 {
        DMat4::from_scale(self.scale.recip())
            * DMat4::from_quat(self.rotation_quat().conjugate())
            * DMat4::from_translation(-self.translate)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Serialized form of a [`Transform`]; every field is optional
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
struct TransformDesc {
    translate: DVec3,
    rotation: DVec3,
    scale: DVec3,
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translate: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

impl TryFrom<TransformDesc> for Transform {
    type Error = ConfigError;

    fn try_from(desc: TransformDesc) -> Result<Self> {
        Transform::new(desc.translate, desc.rotation, desc.scale)
    }
}

impl From<Transform> for TransformDesc {
    fn from(t: Transform) -> Self {
        Self {
            translate: t.translate,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

/// Apply a matrix to a point (w = 1)
#[inline]
pub fn transform_point(point: DVec3, matrix: &DMat4) -> DVec3 {
    matrix.transform_point3(point)
}

/// Split a matrix into translate, Euler rotation and scale
///
/// Translation comes from the last column and scale from the length of each
/// basis column. Matrices with shear decompose to the nearest rotation.
pub fn decompose(matrix: &DMat4) -> Result<Transform> {
    if !matrix.is_finite() {
        return Err(ConfigError::NonFinite("matrix"));
    }

    let translate = matrix.w_axis.truncate();
    let basis = DMat3::from_mat4(*matrix);
    let scale = DVec3::new(
        basis.x_axis.length(),
        basis.y_axis.length(),
        basis.z_axis.length(),
    );
    for (axis, value) in [('x', scale.x), ('y', scale.y), ('z', scale.z)] {
        if value <= DEGENERATE_EPSILON {
            return Err(ConfigError::NonPositiveScale { axis, value });
        }
    }
    if basis.determinant() < 0.0 {
        return Err(ConfigError::Reflection);
    }

    let unscaled = DMat3::from_cols(
        basis.x_axis / scale.x,
        basis.y_axis / scale.y,
        basis.z_axis / scale.z,
    );
    let rotation = DMat3::from_quat(DQuat::from_mat3(&unscaled).normalize());

    Transform::new(translate, mat3_to_euler(&rotation), scale)
}

/// Same transform expressed through a signed-permutation change of axes
///
/// Computes `axes · T · R · S · axes⁻¹`. Translation and scale are permuted
/// exactly; only the rotation goes through Euler extraction.
pub fn conjugate_by_axes(transform: &Transform, axes: &DMat3) -> Result<Transform> {
    let translate = *axes * transform.translate;
    // axes · S · axes⁻¹ is diagonal: each output axis takes the scale of the
    // input axis it was permuted from
    let mut scale = DVec3::ONE;
    for row in 0..3 {
        for col in 0..3 {
            if axes.col(col)[row].abs() > 0.5 {
                scale[row] = transform.scale[col];
            }
        }
    }
    let rotation = *axes * DMat3::from_quat(transform.rotation_quat()) * axes.transpose();
    Transform::new(translate, mat3_to_euler(&rotation), scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn angle_delta(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let err = Transform::new(DVec3::ZERO, DVec3::ZERO, DVec3::new(1.0, 0.0, 1.0)).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveScale { axis: 'y', value: 0.0 });
        assert!(Transform::new(DVec3::ZERO, DVec3::ZERO, DVec3::new(1.0, 1.0, -2.0)).is_err());
        assert!(Transform::new(DVec3::ZERO, DVec3::ZERO, DVec3::new(f64::NAN, 1.0, 1.0)).is_err());
        assert!(matches!(
            Transform::new(DVec3::new(f64::INFINITY, 0.0, 0.0), DVec3::ZERO, DVec3::ONE),
            Err(ConfigError::NonFinite("translate"))
        ));
    }

    #[test]
    fn test_rotation_wraps() {
        let t = Transform::new(DVec3::ZERO, DVec3::new(-90.0, 720.0, 405.0), DVec3::ONE).unwrap();
        assert_eq!(t.rotation().x, -90.0);
        let t = t.wrapped();
        assert_abs_diff_eq!(t.rotation().x, 270.0);
        assert_abs_diff_eq!(t.rotation().y, 0.0);
        assert_abs_diff_eq!(t.rotation().z, 45.0);
        assert!(wrap_degrees(-1e-20) < 360.0);
    }

    #[test]
    fn test_rotation_order_x_first() {
        // X then Z: +Y -> +Z under Rx(90), and +Z stays under Rz(90)
        let t = Transform::new(DVec3::ZERO, DVec3::new(90.0, 0.0, 90.0), DVec3::ONE).unwrap();
        let p = transform_point(DVec3::Y, &t.to_matrix());
        assert!(p.abs_diff_eq(DVec3::Z, 1e-12));
        // +X -> +X under Rx, then +Y under Rz
        let q = transform_point(DVec3::X, &t.to_matrix());
        assert!(q.abs_diff_eq(DVec3::Y, 1e-12));
    }

    #[test]
    fn test_scale_before_rotation() {
        let t = Transform::new(
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 90.0),
            DVec3::new(2.0, 1.0, 1.0),
        )
        .unwrap();
        let p = transform_point(DVec3::X, &t.to_matrix());
        assert!(p.abs_diff_eq(DVec3::new(10.0, 2.0, 0.0), 1e-12));
    }

    #[test]
    fn test_inverse_matrix() {
        let t = Transform::new(
            DVec3::new(1.5, -2.0, 3.0),
            DVec3::new(12.0, 34.0, 56.0),
            DVec3::new(1.0, 2.0, 0.5),
        )
        .unwrap();
        let product = t.to_matrix() * t.inverse_matrix();
        assert!(product.abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn test_decompose_round_trip() {
        let cases = [
            (DVec3::new(1000.0, -250.0, 3.0), DVec3::new(10.0, 20.0, 30.0), DVec3::new(1.0, 2.0, 3.0)),
            (DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 270.0), DVec3::ONE),
            (DVec3::new(-4.0, 5.5, 0.25), DVec3::new(350.0, 80.0, 181.0), DVec3::splat(0.001)),
            (DVec3::new(12.0, 0.0, -7.0), DVec3::new(45.0, 135.0, 300.0), DVec3::new(4.0, 0.5, 1.0)),
        ];
        for (translate, rotation, scale) in cases {
            let original = Transform::new(translate, rotation, scale).unwrap();
            let back = decompose(&original.to_matrix()).unwrap();
            assert!(back.translate().abs_diff_eq(original.translate(), 1e-6));
            assert!(back.scale().abs_diff_eq(original.scale(), 1e-6));
            // Euler triples are not unique; compare the resulting matrices
            assert!(back.to_matrix().abs_diff_eq(original.to_matrix(), 1e-6));
        }
    }

    #[test]
    fn test_decompose_recovers_angles() {
        let original = Transform::new(DVec3::ZERO, DVec3::new(15.0, 25.0, 35.0), DVec3::ONE).unwrap();
        let back = decompose(&original.to_matrix()).unwrap();
        assert!(angle_delta(back.rotation().x, 15.0) < 1e-3);
        assert!(angle_delta(back.rotation().y, 25.0) < 1e-3);
        assert!(angle_delta(back.rotation().z, 35.0) < 1e-3);
    }

    #[test]
    fn test_decompose_gimbal_lock() {
        let original = Transform::new(DVec3::ZERO, DVec3::new(30.0, 90.0, 0.0), DVec3::ONE).unwrap();
        let back = decompose(&original.to_matrix()).unwrap();
        assert!(back.to_matrix().abs_diff_eq(original.to_matrix(), 1e-6));
    }

    #[test]
    fn test_decompose_rejects_reflection() {
        let mirror = DMat4::from_scale(DVec3::new(1.0, 1.0, -1.0));
        assert_eq!(decompose(&mirror).unwrap_err(), ConfigError::Reflection);
    }

    #[test]
    fn test_conjugate_by_axes_matches_matrix() {
        // +Y -> +Z, +Z -> -Y
        let axes = DMat3::from_cols(DVec3::X, DVec3::Z, DVec3::NEG_Y);
        let t = Transform::new(
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(30.0, 0.0, 45.0),
            DVec3::new(1.0, 2.0, 4.0),
        )
        .unwrap();
        let conjugated = conjugate_by_axes(&t, &axes).unwrap();
        let m = DMat4::from_mat3(axes);
        let expected = m * t.to_matrix() * m.transpose();
        assert!(conjugated.to_matrix().abs_diff_eq(expected, 1e-9));
        assert_eq!(conjugated.scale(), DVec3::new(1.0, 4.0, 2.0));
        assert_eq!(conjugated.translate(), DVec3::new(1.0, -3.0, 2.0));
    }

    #[test]
    fn test_deserialize_defaults() {
        let t: Transform = serde_json::from_str(r#"{"translate": [1.0, 2.0, 3.0]}"#).unwrap();
        assert_eq!(t.translate(), DVec3::new(1.0, 2.0, 3.0));
        assert!(t.is_unit_scale());

        let bad = serde_json::from_str::<Transform>(r#"{"scale": [1.0, 0.0, 1.0]}"#);
        assert!(bad.is_err());
    }
}
