//! Batch layout generation
//!
//! Expands grid, line and circle patterns into ordered instances. Generation
//! is deterministic: the same batch layout always yields the same ids and positions.

use std::collections::HashSet;

use fdl_core::{AreaId, AssetId, InstanceId};
use fdl_math::glam::DVec3;
use fdl_math::{wrap_degrees, Transform};
use serde::{Deserialize, Serialize};

use crate::error::{BatchError, LayoutError, Result};
use crate::model::{Instance, LayoutDocument};

/// Placement pattern with its parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Pattern {
    /// `rows × columns` in the XY plane, row-major
    Grid {
        rows: i64,
        columns: i64,
        spacing_x: f64,
        spacing_y: f64,
        #[serde(default)]
        origin: DVec3,
    },
    /// `count` points from `start` to `end`, both inclusive
    Line { count: i64, start: DVec3, end: DVec3 },
    /// `count` points on a circle in the XY plane, facing outward
    Circle {
        count: i64,
        center: DVec3,
        radius: f64,
        /// Degrees, measured from +X toward +Y
        #[serde(default)]
        start_angle: f64,
    },
}

fn default_prefix() -> String {
    "Asset".to_string()
}

/// A pattern of instances of one asset, destined for one area
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchLayoutSpec {
    pub layout_id: String,
    /// Area receiving the generated instances
    pub area: AreaId,
    pub ref_asset: AssetId,
    pub pattern: Pattern,
    #[serde(default = "default_prefix")]
    pub naming_prefix: String,
}

impl BatchLayoutSpec {
    pub fn new(
        layout_id: impl Into<String>,
        area: impl Into<AreaId>,
        ref_asset: AssetId,
        pattern: Pattern,
    ) -> Self {
        Self {
            layout_id: layout_id.into(),
            area: area.into(),
            ref_asset,
            pattern,
            naming_prefix: default_prefix(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.naming_prefix = prefix.into();
        self
    }

    fn check(&self) -> std::result::Result<(), BatchError> {
        let non_finite = |parameter| BatchError::NonFinite {
            layout: self.layout_id.clone(),
            parameter,
        };
        match &self.pattern {
            Pattern::Grid { spacing_x, spacing_y, origin, .. } => {
                if !spacing_x.is_finite() {
                    return Err(non_finite("spacing_x"));
                }
                if !spacing_y.is_finite() {
                    return Err(non_finite("spacing_y"));
                }
                if !origin.is_finite() {
                    return Err(non_finite("origin"));
                }
            }
            Pattern::Line { start, end, .. } => {
                if !start.is_finite() {
                    return Err(non_finite("start"));
                }
                if !end.is_finite() {
                    return Err(non_finite("end"));
                }
            }
            Pattern::Circle { center, radius, start_angle, .. } => {
                if !center.is_finite() {
                    return Err(non_finite("center"));
                }
                if !radius.is_finite() {
                    return Err(non_finite("radius"));
                }
                if !start_angle.is_finite() {
                    return Err(non_finite("start_angle"));
                }
                if *radius < 0.0 {
                    return Err(BatchError::NegativeRadius {
                        layout: self.layout_id.clone(),
                        radius: *radius,
                    });
                }
            }
        }
        Ok(())
    }

    fn instance(
        &self,
        id: String,
        position: DVec3,
        rotation_z: f64,
    ) -> std::result::Result<Instance, BatchError> {
        let transform = Transform::new(position, DVec3::new(0.0, 0.0, rotation_z), DVec3::ONE)
            .map_err(|source| BatchError::Transform {
                layout: self.layout_id.clone(),
                source,
            })?;
        Ok(Instance::new(id.as_str(), self.ref_asset, transform).with_name(id))
    }
}

/// Expand a pattern into instances
///
/// Counts of zero or less produce an empty sequence.
pub fn generate(spec: &BatchLayoutSpec) -> std::result::Result<Vec<Instance>, BatchError> {
    spec.check()?;
    let prefix = &spec.naming_prefix;

    let mut out = Vec::new();
    match spec.pattern {
        Pattern::Grid { rows, columns, spacing_x, spacing_y, origin } => {
            if rows <= 0 || columns <= 0 {
                return Ok(out);
            }
            for row in 0..rows {
                for col in 0..columns {
                    let position =
                        origin + DVec3::new(col as f64 * spacing_x, row as f64 * spacing_y, 0.0);
                    out.push(spec.instance(format!("{prefix}_{row:02}_{col:02}"), position, 0.0)?);
                }
            }
        }
        Pattern::Line { count, start, end } => {
            if count <= 0 {
                return Ok(out);
            }
            for index in 0..count {
                let position = if count == 1 {
                    start
                } else {
                    start.lerp(end, index as f64 / (count - 1) as f64)
                };
                out.push(spec.instance(format!("{prefix}_{index:02}"), position, 0.0)?);
            }
        }
        Pattern::Circle { count, center, radius, start_angle } => {
            if count <= 0 {
                return Ok(out);
            }
            let step = 360.0 / count as f64;
            for index in 0..count {
                let angle = start_angle + step * index as f64;
                let (sin, cos) = angle.to_radians().sin_cos();
                let position = center + DVec3::new(radius * cos, radius * sin, 0.0);
                out.push(spec.instance(
                    format!("{prefix}_{index:02}"),
                    position,
                    wrap_degrees(angle),
                )?);
            }
        }
    }

    log::debug!("batch layout '{}' generated {} instance(s)", spec.layout_id, out.len());
    Ok(out)
}

/// Expand a pattern, renaming ids that are already taken
///
/// A taken id gets the smallest free suffix `_k` with `k >= 2`. Names given
/// to generated instances follow their final id.
pub fn generate_into(
    spec: &BatchLayoutSpec,
    existing: &HashSet<InstanceId>,
) -> std::result::Result<Vec<Instance>, BatchError> {
    let mut taken: HashSet<InstanceId> = existing.clone();
    let mut out = generate(spec)?;
    for instance in &mut out {
        if taken.contains(&instance.id) {
            let base = instance.id.as_str().to_string();
            let mut k = 2u64;
            let renamed = loop {
                let candidate = InstanceId::from(format!("{base}_{k}"));
                if !taken.contains(&candidate) {
                    break candidate;
                }
                k += 1;
            };
            log::debug!("batch id {} taken, using {}", base, renamed);
            instance.name = Some(renamed.as_str().to_string());
            instance.id = renamed;
        }
        taken.insert(instance.id.clone());
    }
    Ok(out)
}

impl LayoutDocument {
    /// Move every batch layout's instances into its target area
    ///
    /// Either all batches expand or the document is left untouched. Returns
    /// the number of instances added.
    pub fn expand_batches(&mut self) -> Result<usize> {
        for spec in &self.batch_layouts {
            if self.site.area(&spec.area).is_none() {
                return Err(LayoutError::UnknownArea {
                    layout: spec.layout_id.clone(),
                    area: spec.area.clone(),
                });
            }
        }

        let mut taken: HashSet<InstanceId> =
            self.site.instances().map(|(_, i)| i.id.clone()).collect();
        let mut expanded = Vec::with_capacity(self.batch_layouts.len());
        for spec in &self.batch_layouts {
            let instances = generate_into(spec, &taken)?;
            taken.extend(instances.iter().map(|i| i.id.clone()));
            expanded.push((spec.area.clone(), instances));
        }

        let mut added = 0;
        for (area_id, instances) in expanded {
            if let Some(area) = self.site.area_mut(&area_id) {
                added += instances.len();
                area.instances.extend(instances);
            }
        }
        self.batch_layouts.clear();
        Ok(added)
    }
}
