//! Unit systems and axis conventions
//!
//! Everything downstream of ingestion works in one canonical frame: meters,
//! degrees, Z-up, right-handed. Sources declare their own [`UnitSystem`] and
//! are converted exactly once.

use core::fmt;
use core::str::FromStr;

use fdl_core::ConfigError;
use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// Length unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "cm")]
    Centimeter,
    #[default]
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "ft")]
    Foot,
}

impl LengthUnit {
    /// Size of one unit in meters
    #[inline]
    pub const fn meters_per_unit(self) -> f64 {
        match self {
            Self::Millimeter => 0.001,
            Self::Centimeter => 0.01,
            Self::Meter => 1.0,
            Self::Inch => 0.0254,
            Self::Foot => 0.3048,
        }
    }

    /// Unit symbol as written in layout documents
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Meter => "m",
            Self::Inch => "in",
            Self::Foot => "ft",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mm" => Ok(Self::Millimeter),
            "cm" => Ok(Self::Centimeter),
            "m" => Ok(Self::Meter),
            "in" => Ok(Self::Inch),
            "ft" => Ok(Self::Foot),
            other => Err(ConfigError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Angle unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AngleUnit {
    #[default]
    #[serde(rename = "deg")]
    Degree,
    #[serde(rename = "rad")]
    Radian,
}

impl AngleUnit {
    /// Convert a value in this unit to degrees
    #[inline]
    pub fn to_degrees(self, value: f64) -> f64 {
        match self {
            Self::Degree => value,
            Self::Radian => value.to_degrees(),
        }
    }
}

impl FromStr for AngleUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deg" => Ok(Self::Degree),
            "rad" => Ok(Self::Radian),
            other => Err(ConfigError::UnknownUnit(other.to_string())),
        }
    }
}

/// Up axis of a source coordinate system
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpAxis {
    X,
    Y,
    #[default]
    Z,
}

impl FromStr for UpAxis {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" | "x" => Ok(Self::X),
            "Y" | "y" => Ok(Self::Y),
            "Z" | "z" => Ok(Self::Z),
            other => Err(ConfigError::UnknownUnit(other.to_string())),
        }
    }
}

/// Handedness of a source coordinate system
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

impl FromStr for Handedness {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "right" => Ok(Self::Right),
            "left" => Ok(Self::Left),
            other => Err(ConfigError::UnknownUnit(other.to_string())),
        }
    }
}

/// Complete unit system declared by a layout document or asset definition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSystem {
    pub length: LengthUnit,
    pub angle: AngleUnit,
    pub up_axis: UpAxis,
    pub handedness: Handedness,
}

impl UnitSystem {
    /// Meters, degrees, Z-up, right-handed
    pub const CANONICAL: Self = Self {
        length: LengthUnit::Meter,
        angle: AngleUnit::Degree,
        up_axis: UpAxis::Z,
        handedness: Handedness::Right,
    };

    /// Canonical system with a different length unit
    pub fn with_length(length: LengthUnit) -> Self {
        Self { length, ..Self::CANONICAL }
    }

    /// Whether no conversion is needed
    pub fn is_canonical(&self) -> bool {
        *self == Self::CANONICAL
    }

    /// Whether the axis convention differs from Z-up right-handed
    pub fn needs_realignment(&self) -> bool {
        self.up_axis != UpAxis::Z || self.handedness != Handedness::Right
    }

    /// Matrix taking this system's axes to the canonical axes
    pub fn realignment(&self) -> DMat4 {
        axis_realignment(self.up_axis, self.handedness, UpAxis::Z, Handedness::Right)
    }

    /// Linear part of [`UnitSystem::realignment`]
    pub fn realignment_axes(&self) -> DMat3 {
        DMat3::from_mat4(self.realignment())
    }
}

/// Convert a length between units
#[inline]
pub fn convert_length(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.meters_per_unit() / to.meters_per_unit()
}

/// Convert every component of a point between units
#[inline]
pub fn convert_point(point: DVec3, from: LengthUnit, to: LengthUnit) -> DVec3 {
    DVec3::new(
        convert_length(point.x, from, to),
        convert_length(point.y, from, to),
        convert_length(point.z, from, to),
    )
}

// Signed permutation taking (up, handedness) axes onto Z-up right-handed.
// Left-handed sources mirror their depth axis before rotating.
fn canonical_basis(up: UpAxis, handedness: Handedness) -> DMat3 {
    let rotation = match up {
        UpAxis::Z => DMat3::IDENTITY,
        // +Y -> +Z, +Z -> -Y
        UpAxis::Y => DMat3::from_cols(DVec3::X, DVec3::Z, DVec3::NEG_Y),
        // +X -> +Z, +Z -> -X
        UpAxis::X => DMat3::from_cols(DVec3::Z, DVec3::Y, DVec3::NEG_X),
    };
    let mirror = match (handedness, up) {
        (Handedness::Right, _) => DMat3::IDENTITY,
        (Handedness::Left, UpAxis::Y) => DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0)),
        (Handedness::Left, UpAxis::X | UpAxis::Z) => {
            DMat3::from_diagonal(DVec3::new(1.0, -1.0, 1.0))
        }
    };
    rotation * mirror
}

/// Fixed rotation/reflection between two axis conventions
///
/// The matrix maps coordinates expressed in the source convention onto the
/// target convention. Y-up to Z-up turns the frame by -90° about X, which
/// carries the source `+Y` (up) onto the target `+Z`.
pub fn axis_realignment(
    from_up: UpAxis,
    from_handedness: Handedness,
    to_up: UpAxis,
    to_handedness: Handedness,
) -> DMat4 {
    let from = canonical_basis(from_up, from_handedness);
    let to = canonical_basis(to_up, to_handedness);
    // Signed permutations are orthogonal: inverse == transpose.
    DMat4::from_mat3(to.transpose() * from)
}
