//! Collision detection configuration

use serde::{Deserialize, Serialize};

/// How broadphase candidates are refined
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Narrowphase {
    /// Broadphase candidates are the result
    Disabled,
    /// Separating-axis test on world oriented boxes
    #[default]
    Obb,
    /// Triangle-level test when a mesh source knows both bodies' geometry,
    /// oriented boxes otherwise
    Mesh,
}

/// How broadphase candidates are gathered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadphaseStrategy {
    /// Every pair is tested
    BruteForce,
    /// Sort by `min.x` and sweep
    #[default]
    SweepAndPrune,
}

/// Collision and clearance detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Candidate refinement
    pub narrowphase: Narrowphase,

    /// Candidate gathering
    pub broadphase: BroadphaseStrategy,

    /// Required clearance in meters for bodies without their own (0 = none)
    pub default_clearance: f64,

    /// Worker threads for pair evaluation (1 = evaluate on the caller)
    pub worker_threads: usize,

    /// Minimum number of candidate pairs before work is split
    pub parallel_threshold: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            narrowphase: Narrowphase::Obb,
            broadphase: BroadphaseStrategy::SweepAndPrune,
            default_clearance: 0.0,
            worker_threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            parallel_threshold: 512,
        }
    }
}

impl CollisionConfig {
    /// Single-threaded, brute-force configuration for reference runs
    pub fn reference() -> Self {
        Self {
            broadphase: BroadphaseStrategy::BruteForce,
            worker_threads: 1,
            ..Default::default()
        }
    }

    /// Box-only configuration: broadphase candidates are reported as is
    pub fn broadphase_only() -> Self {
        Self {
            narrowphase: Narrowphase::Disabled,
            ..Default::default()
        }
    }

    pub fn with_narrowphase(mut self, narrowphase: Narrowphase) -> Self {
        self.narrowphase = narrowphase;
        self
    }

    pub fn with_broadphase(mut self, broadphase: BroadphaseStrategy) -> Self {
        self.broadphase = broadphase;
        self
    }

    /// Set the default required clearance (meters)
    pub fn with_default_clearance(mut self, clearance: f64) -> Self {
        self.default_clearance = clearance;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}
