//! Collision and clearance detection over a snapshot of bodies

use std::sync::Arc;

use crossbeam_utils::thread;
use fdl_asset::AssetCatalog;
use fdl_layout::{ResolvedLayout, Site};
use fdl_math::Aabb;

use crate::broad::candidate_pairs;
use crate::config::CollisionConfig;
use crate::error::{CollisionError, Result};
use crate::narrow::{refine, MeshSource, NoMeshes};
use crate::report::{ClearanceViolation, CollisionPair, DataQualityWarning, DetectionReport};
use crate::volume::{collect_bodies, CollisionBody};

/// Stateless detector: every call works on the bodies it is given
pub struct CollisionDetector {
    config: CollisionConfig,
    meshes: Arc<dyn MeshSource>,
}

/// Results of one slice of candidate pairs
#[derive(Default)]
struct Partial {
    candidates: usize,
    collisions: Vec<CollisionPair>,
    violations: Vec<ClearanceViolation>,
}

impl Partial {
    fn merge(&mut self, other: Partial) {
        self.candidates += other.candidates;
        self.collisions.extend(other.collisions);
        self.violations.extend(other.violations);
    }
}

impl CollisionDetector {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            meshes: Arc::new(NoMeshes),
        }
    }

    /// Use external geometry for [`crate::Narrowphase::Mesh`]
    pub fn with_mesh_source(mut self, meshes: Arc<dyn MeshSource>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Detect collisions and clearance violations among placed instances
    pub fn detect_layout(
        &self,
        site: &Site,
        resolved: &ResolvedLayout,
        catalog: &dyn AssetCatalog,
    ) -> Result<DetectionReport> {
        let (bodies, warnings) = collect_bodies(site, resolved, catalog);
        self.run(bodies.iter().collect(), warnings)
    }

    /// Detect collisions and clearance violations among bodies
    ///
    /// Bodies with a bad transform or volume are left out and reported as
    /// warnings.
    pub fn detect(&self, bodies: &[CollisionBody]) -> Result<DetectionReport> {
        self.run(bodies.iter().collect(), Vec::new())
    }

    fn run(&self, bodies: Vec<&CollisionBody>, mut warnings: Vec<DataQualityWarning>) -> Result<DetectionReport> {
        self.check_clearance(&bodies)?;

        let mut valid = Vec::with_capacity(bodies.len());
        for body in bodies {
            match body.defect() {
                Some(reason) => warnings.push(DataQualityWarning::new(body.id.clone(), reason)),
                None => valid.push(body),
            }
        }
        for warning in &warnings {
            log::warn!("{warning}");
        }

        let boxes: Vec<Aabb> = valid.iter().map(|b| b.world_aabb()).collect();
        let margins: Vec<f64> = valid
            .iter()
            .map(|b| b.clearance.unwrap_or(self.config.default_clearance))
            .collect();
        // a pair closer than max(c_a, c_b) overlaps once each box grows by its own clearance
        let reach: Vec<Aabb> = boxes.iter().zip(&margins).map(|(b, &m)| b.expand(m)).collect();
        let pairs = candidate_pairs(&reach, self.config.broadphase);

        let partial = self.evaluate_all(&pairs, &valid, &boxes, &margins)?;
        let mut report = DetectionReport {
            collisions: partial.collisions,
            clearance_violations: partial.violations,
            warnings,
            candidates: partial.candidates,
            bodies: valid.len(),
        };
        report.sort();

        log::debug!(
            "collision pass: {} bodies, {} candidates, {} collisions, {} clearance violations, {} excluded",
            report.bodies,
            report.candidates,
            report.collisions.len(),
            report.clearance_violations.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    fn check_clearance(&self, bodies: &[&CollisionBody]) -> Result<()> {
        let default = self.config.default_clearance;
        if !default.is_finite() || default < 0.0 {
            return Err(CollisionError::InvalidClearance {
                instance: "<default>".to_string(),
                value: default,
            });
        }
        for body in bodies {
            if let Some(value) = body.clearance.filter(|c| !c.is_finite() || *c < 0.0) {
                return Err(CollisionError::InvalidClearance {
                    instance: body.id.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    fn evaluate_all(
        &self,
        pairs: &[(usize, usize)],
        bodies: &[&CollisionBody],
        boxes: &[Aabb],
        margins: &[f64],
    ) -> Result<Partial> {
        let workers = self.config.worker_threads.max(1);
        if workers == 1 || pairs.len() < self.config.parallel_threshold.max(1) {
            return Ok(self.evaluate(pairs, bodies, boxes, margins));
        }

        let chunk = pairs.len().div_ceil(workers);
        log::trace!("splitting {} pair(s) across {workers} worker(s)", pairs.len());
        let parts = thread::scope(|scope| {
            let handles: Vec<_> = pairs
                .chunks(chunk)
                .map(|slice| scope.spawn(move |_| self.evaluate(slice, bodies, boxes, margins)))
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(worker, handle)| handle.join().map_err(|_| CollisionError::WorkerPanicked { worker }))
                .collect::<Result<Vec<_>>>()
        })
        .map_err(|_| CollisionError::WorkerPanicked { worker: 0 })??;

        let mut merged = Partial::default();
        for part in parts {
            merged.merge(part);
        }
        Ok(merged)
    }

    fn evaluate(&self, pairs: &[(usize, usize)], bodies: &[&CollisionBody], boxes: &[Aabb], margins: &[f64]) -> Partial {
        let mut out = Partial::default();
        for &(i, j) in pairs {
            let (a, b) = (bodies[i], bodies[j]);

            if boxes[i].intersects(&boxes[j]) {
                out.candidates += 1;
                if refine(a, b, self.config.narrowphase, self.meshes.as_ref()) {
                    out.collisions.push(CollisionPair::new(a.id.clone(), b.id.clone()));
                }
            }

            let required = margins[i].max(margins[j]);
            if required > 0.0 {
                let actual = boxes[i].distance(&boxes[j]);
                if actual < required {
                    out.violations.push(ClearanceViolation {
                        pair: CollisionPair::new(a.id.clone(), b.id.clone()),
                        actual,
                        required,
                    });
                }
            }
        }
        out
    }
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BroadphaseStrategy, Narrowphase};
    use crate::report::WarningReason;
    use approx::assert_abs_diff_eq;
    use fdl_core::InstanceId;
    use fdl_math::glam::{DMat4, DVec3};
    use fdl_math::VolumeDefect;

    fn cube_at(id: &str, x: f64, y: f64) -> CollisionBody {
        CollisionBody::new(id, DMat4::from_translation(DVec3::new(x, y, 0.0)), Aabb::new(DVec3::ZERO, DVec3::ONE))
    }

    #[test]
    fn test_face_touching_collides() {
        let report = CollisionDetector::new(CollisionConfig::reference())
            .detect(&[cube_at("B", 1.0, 0.0), cube_at("A", 0.0, 0.0)])
            .unwrap();
        assert_eq!(report.collisions, vec![CollisionPair::new("A".into(), "B".into())]);
        assert_eq!(report.candidates, 1);
        assert!(report.collides(&InstanceId::from("B"), &InstanceId::from("A")));
    }

    #[test]
    fn test_clearance_shortfall() {
        // 250 mm apart, 300 mm required
        let bodies = [cube_at("A", 0.0, 0.0), cube_at("B", 1.25, 0.0)];
        let detector = CollisionDetector::new(CollisionConfig::default().with_default_clearance(0.3));
        let report = detector.detect(&bodies).unwrap();

        assert!(report.collisions.is_empty());
        assert_eq!(report.candidates, 0);
        assert_eq!(report.clearance_violations.len(), 1);
        let violation = &report.clearance_violations[0];
        assert_abs_diff_eq!(violation.actual, 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(violation.required, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(violation.shortfall_in(fdl_math::LengthUnit::Millimeter), 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_larger_clearance_wins() {
        let bodies = [cube_at("A", 0.0, 0.0).with_clearance(0.1), cube_at("B", 1.25, 0.0).with_clearance(0.4)];
        let report = CollisionDetector::default().detect(&bodies).unwrap();
        assert_eq!(report.clearance_violations.len(), 1);
        assert_abs_diff_eq!(report.clearance_violations[0].required, 0.4, epsilon = 1e-12);

        let relaxed = [cube_at("A", 0.0, 0.0).with_clearance(0.1), cube_at("B", 1.25, 0.0).with_clearance(0.2)];
        assert!(CollisionDetector::default().detect(&relaxed).unwrap().is_clear());
    }

    #[test]
    fn test_bad_bodies_are_excluded() {
        let nan = CollisionBody::new("N", DMat4::IDENTITY, Aabb::new(DVec3::splat(f64::NAN), DVec3::ONE));
        let report = CollisionDetector::default()
            .detect(&[cube_at("A", 0.0, 0.0), nan, cube_at("B", 0.5, 0.0)])
            .unwrap();
        assert_eq!(report.bodies, 2);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(
            report.warnings,
            vec![DataQualityWarning::new("N".into(), WarningReason::Volume(VolumeDefect::NonFinite))]
        );
    }

    #[test]
    fn test_invalid_clearance_is_an_error() {
        let bodies = [cube_at("A", 0.0, 0.0).with_clearance(-1.0)];
        let err = CollisionDetector::default().detect(&bodies).unwrap_err();
        assert!(matches!(err, CollisionError::InvalidClearance { .. }));

        let detector = CollisionDetector::new(CollisionConfig::default().with_default_clearance(f64::NAN));
        assert!(detector.detect(&[]).is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut bodies = Vec::new();
        for i in 0..40 {
            let x = f64::from(i % 8) * 0.9;
            let y = f64::from(i / 8) * 1.1;
            bodies.push(cube_at(&format!("C{i:02}"), x, y).with_clearance(0.15));
        }
        let sequential = CollisionDetector::new(CollisionConfig::reference()).detect(&bodies).unwrap();
        let parallel = CollisionDetector::new(
            CollisionConfig::default()
                .with_broadphase(BroadphaseStrategy::SweepAndPrune)
                .with_worker_threads(4)
                .with_parallel_threshold(1),
        )
        .detect(&bodies)
        .unwrap();

        assert!(!sequential.collisions.is_empty());
        assert!(!sequential.clearance_violations.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_disabled_narrowphase_reports_candidates() {
        let config = CollisionConfig::broadphase_only().with_worker_threads(1);
        assert_eq!(config.narrowphase, Narrowphase::Disabled);
        let report = CollisionDetector::new(config)
            .detect(&[cube_at("A", 0.0, 0.0), cube_at("B", 0.5, 0.5), cube_at("C", 3.0, 0.0)])
            .unwrap();
        assert_eq!(report.collisions.len(), report.candidates);
        assert_eq!(report.collisions.len(), 1);
    }
}
