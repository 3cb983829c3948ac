//! Scaling constraint validation
//!
//! The effective constraint of an instance is the global constraint with the
//! fields the instance sets explicitly laid over it. Rule breaches are data:
//! they come back as [`ScalingViolation`] values, never as errors.

use core::fmt;

use fdl_core::InstanceId;
use fdl_math::glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;
use crate::model::{Instance, Site};

/// Document-level scaling rules
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConstraint {
    pub allow_scaling: bool,
    pub allow_non_uniform_scaling: bool,
    /// Lower bound per component; unset means unbounded
    pub min_scale: Option<f64>,
    /// Upper bound per component; unset means unbounded
    pub max_scale: Option<f64>,
}

impl Default for ScalingConstraint {
    fn default() -> Self {
        Self {
            allow_scaling: true,
            allow_non_uniform_scaling: true,
            min_scale: None,
            max_scale: None,
        }
    }
}

impl ScalingConstraint {
    /// Scaling forbidden entirely
    pub fn fixed() -> Self {
        Self {
            allow_scaling: false,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_scale = Some(min);
        self.max_scale = Some(max);
        self
    }

    pub fn with_uniform_only(mut self) -> Self {
        self.allow_non_uniform_scaling = false;
        self
    }

    /// Lay explicitly set override fields over this constraint
    pub fn merged(&self, instance: Option<&ScalingOverride>) -> Self {
        let Some(o) = instance else {
            return *self;
        };
        Self {
            allow_scaling: o.allow_scaling.unwrap_or(self.allow_scaling),
            allow_non_uniform_scaling: o
                .allow_non_uniform_scaling
                .unwrap_or(self.allow_non_uniform_scaling),
            min_scale: o.min_scale.or(self.min_scale),
            max_scale: o.max_scale.or(self.max_scale),
        }
    }

    fn check_well_formed(&self, instance: &InstanceId) -> Result<(), ConstraintError> {
        for value in [self.min_scale, self.max_scale].into_iter().flatten() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConstraintError::InvalidBound { instance: instance.clone(), value });
            }
        }
        if let (Some(min), Some(max)) = (self.min_scale, self.max_scale) {
            if min > max {
                return Err(ConstraintError::InvertedRange { instance: instance.clone(), min, max });
            }
        }
        Ok(())
    }
}

/// Instance-level scaling rules; only fields that are set take effect
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_scaling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_non_uniform_scaling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f64>,
}

/// Scale axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        })
    }
}

/// Which rule a scale broke
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Scaling disallowed but scale is not exactly (1, 1, 1)
    ScalingNotPermitted { scale: DVec3 },
    /// One component outside `[min_scale, max_scale]`
    ScaleOutOfRange {
        axis: Axis,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Uniform scaling required but components differ
    NonUniformScaling { scale: DVec3 },
}

/// A scaling rule breach on one instance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalingViolation {
    pub instance: InstanceId,
    pub kind: ViolationKind,
}

impl fmt::Display for ScalingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::ScalingNotPermitted { scale } => {
                write!(f, "{}: scaling not permitted (scale {:?})", self.instance, scale)
            }
            ViolationKind::ScaleOutOfRange { axis, value, min, max } => write!(
                f,
                "{}: scale {} = {} out of range [{}, {}]",
                self.instance,
                axis,
                value,
                min.map_or("-inf".to_string(), |v| v.to_string()),
                max.map_or("inf".to_string(), |v| v.to_string()),
            ),
            ViolationKind::NonUniformScaling { scale } => {
                write!(f, "{}: non-uniform scaling not permitted (scale {:?})", self.instance, scale)
            }
        }
    }
}

/// Check an instance's local scale against the merged constraint
///
/// Every rule is evaluated; one instance can produce several violations.
pub fn validate(
    instance: &Instance,
    global: &ScalingConstraint,
) -> Result<Vec<ScalingViolation>, ConstraintError> {
    let effective = global.merged(instance.scaling.as_ref());
    effective.check_well_formed(&instance.id)?;

    let scale = instance.transform.scale();
    let mut violations = Vec::new();
    let mut push = |kind| {
        violations.push(ScalingViolation {
            instance: instance.id.clone(),
            kind,
        })
    };

    if !effective.allow_scaling {
        if scale != DVec3::ONE {
            push(ViolationKind::ScalingNotPermitted { scale });
        }
    } else {
        for (axis, value) in [(Axis::X, scale.x), (Axis::Y, scale.y), (Axis::Z, scale.z)] {
            let below = effective.min_scale.is_some_and(|min| value < min);
            let above = effective.max_scale.is_some_and(|max| value > max);
            if below || above {
                push(ViolationKind::ScaleOutOfRange {
                    axis,
                    value,
                    min: effective.min_scale,
                    max: effective.max_scale,
                });
            }
        }
    }

    if !effective.allow_non_uniform_scaling && !(scale.x == scale.y && scale.y == scale.z) {
        push(ViolationKind::NonUniformScaling { scale });
    }

    Ok(violations)
}

/// Validate every instance of a site, in document order
pub fn validate_site(
    site: &Site,
    global: &ScalingConstraint,
) -> Result<Vec<ScalingViolation>, ConstraintError> {
    let mut all = Vec::new();
    for (_, instance) in site.instances() {
        all.extend(validate(instance, global)?);
    }
    if !all.is_empty() {
        log::info!("{} scaling violation(s) in site {}", all.len(), site.id);
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdl_core::AssetId;
    use fdl_math::Transform;

    fn scaled(x: f64, y: f64, z: f64) -> Instance {
        Instance::new(
            "Tank_01",
            AssetId::new(),
            Transform::new(DVec3::ZERO, DVec3::ZERO, DVec3::new(x, y, z)).unwrap(),
        )
    }

    #[test]
    fn test_fixed_scale_accepts_identity() {
        let v = validate(&scaled(1.0, 1.0, 1.0), &ScalingConstraint::fixed()).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn test_fixed_scale_single_violation() {
        let v = validate(&scaled(1.0, 1.0, 1.01), &ScalingConstraint::fixed()).unwrap();
        assert_eq!(v.len(), 1);
        assert!(matches!(v[0].kind, ViolationKind::ScalingNotPermitted { .. }));
    }

    #[test]
    fn test_out_of_range_per_axis() {
        let global = ScalingConstraint::default().with_range(0.5, 2.0);
        let v = validate(&scaled(0.4, 1.0, 3.0), &global).unwrap();
        assert_eq!(v.len(), 2);
        assert!(matches!(v[0].kind, ViolationKind::ScaleOutOfRange { axis: Axis::X, .. }));
        assert!(matches!(v[1].kind, ViolationKind::ScaleOutOfRange { axis: Axis::Z, .. }));
    }

    #[test]
    fn test_rules_do_not_short_circuit() {
        let global = ScalingConstraint::default().with_range(0.5, 2.0).with_uniform_only();
        let v = validate(&scaled(1.0, 1.0, 3.0), &global).unwrap();
        assert_eq!(v.len(), 2);
        assert!(matches!(v[1].kind, ViolationKind::NonUniformScaling { .. }));
    }

    #[test]
    fn test_override_only_replaces_set_fields() {
        let global = ScalingConstraint::default().with_range(0.5, 2.0).with_uniform_only();
        let instance = scaled(3.0, 3.0, 3.0).with_scaling(ScalingOverride {
            max_scale: Some(4.0),
            ..Default::default()
        });
        let merged = global.merged(instance.scaling.as_ref());
        assert_eq!(merged.min_scale, Some(0.5));
        assert_eq!(merged.max_scale, Some(4.0));
        assert!(!merged.allow_non_uniform_scaling);
        assert!(validate(&instance, &global).unwrap().is_empty());
    }

    #[test]
    fn test_override_can_forbid_scaling() {
        let instance = scaled(2.0, 2.0, 2.0).with_scaling(ScalingOverride {
            allow_scaling: Some(false),
            ..Default::default()
        });
        let v = validate(&instance, &ScalingConstraint::default()).unwrap();
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_malformed_constraint_is_error() {
        let global = ScalingConstraint::default().with_range(2.0, 1.0);
        assert!(matches!(
            validate(&scaled(1.0, 1.0, 1.0), &global),
            Err(ConstraintError::InvertedRange { .. })
        ));

        let global = ScalingConstraint::default().with_range(0.0, 1.0);
        assert!(matches!(
            validate(&scaled(1.0, 1.0, 1.0), &global),
            Err(ConstraintError::InvalidBound { .. })
        ));
    }

    #[test]
    fn test_unbounded_by_default() {
        let v = validate(&scaled(0.01, 50.0, 7.0), &ScalingConstraint::default()).unwrap();
        assert!(v.is_empty());
    }
}
