//! Detection results
//!
//! Everything here is derived, read-only data. Lists are sorted by the
//! lexicographic instance id pair so that a report is independent of
//! broadphase strategy and thread count.

use std::fmt;

use fdl_core::InstanceId;
use fdl_math::{convert_length, LengthUnit, VolumeDefect};
use serde::{Deserialize, Serialize};

/// Two instances, stored with the smaller id first
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollisionPair {
    pub a: InstanceId,
    pub b: InstanceId,
}

impl CollisionPair {
    pub fn new(first: InstanceId, second: InstanceId) -> Self {
        if second < first {
            Self { a: second, b: first }
        } else {
            Self { a: first, b: second }
        }
    }

    /// Whether the pair involves `id`
    pub fn involves(&self, id: &InstanceId) -> bool {
        &self.a == id || &self.b == id
    }
}

impl fmt::Display for CollisionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}

/// Two instances closer than their required clearance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearanceViolation {
    pub pair: CollisionPair,
    /// Distance between the world boxes, meters
    pub actual: f64,
    /// Required clearance, meters
    pub required: f64,
}

impl ClearanceViolation {
    /// Missing distance in meters
    #[inline]
    pub fn shortfall(&self) -> f64 {
        self.required - self.actual
    }

    /// Missing distance in `unit`
    pub fn shortfall_in(&self, unit: LengthUnit) -> f64 {
        convert_length(self.shortfall(), LengthUnit::Meter, unit)
    }
}

/// Why an instance was left out of detection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// World transform has NaN or infinite entries
    NonFiniteTransform,
    /// Local volume is unusable
    Volume(VolumeDefect),
    /// Neither the instance nor its asset declares a volume
    MissingVolume,
    /// The referenced asset is not in the catalog
    UnknownAsset,
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteTransform => f.write_str("non-finite world transform"),
            Self::Volume(defect) => write!(f, "bad bounding volume: {defect}"),
            Self::MissingVolume => f.write_str("no bounding volume"),
            Self::UnknownAsset => f.write_str("asset not in catalog"),
        }
    }
}

/// An instance excluded from detection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub instance: InstanceId,
    pub reason: WarningReason,
}

impl DataQualityWarning {
    pub fn new(instance: InstanceId, reason: WarningReason) -> Self {
        Self { instance, reason }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} excluded from collision detection: {}", self.instance, self.reason)
    }
}

/// Everything one detection pass found
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Intersecting pairs after narrowphase
    pub collisions: Vec<CollisionPair>,
    pub clearance_violations: Vec<ClearanceViolation>,
    pub warnings: Vec<DataQualityWarning>,
    /// Pairs whose world boxes overlap
    pub candidates: usize,
    /// Bodies that took part
    pub bodies: usize,
}

impl DetectionReport {
    /// No collisions and no clearance violations
    pub fn is_clear(&self) -> bool {
        self.collisions.is_empty() && self.clearance_violations.is_empty()
    }

    pub fn collides(&self, a: &InstanceId, b: &InstanceId) -> bool {
        let pair = CollisionPair::new(a.clone(), b.clone());
        self.collisions.binary_search(&pair).is_ok()
    }

    pub(crate) fn sort(&mut self) {
        self.collisions.sort();
        self.clearance_violations.sort_by(|x, y| x.pair.cmp(&y.pair));
        self.warnings.sort_by(|x, y| x.instance.cmp(&y.instance));
    }
}
