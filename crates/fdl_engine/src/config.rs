//! Pipeline configuration

use fdl_collision::CollisionConfig;
use serde::{Deserialize, Serialize};

/// When collision and clearance detection runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// As the document's `collision_detection.enabled` says
    #[default]
    FollowDocument,
    Always,
    Never,
}

/// Layout pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detector settings; the document's clearance is applied on top
    pub collision: CollisionConfig,

    pub collision_mode: CollisionMode,

    /// Build the scene graph
    pub compose_scene: bool,

    /// Event source name; the site id when unset
    pub event_source: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collision: CollisionConfig::default(),
            collision_mode: CollisionMode::FollowDocument,
            compose_scene: true,
            event_source: None,
        }
    }
}

impl PipelineConfig {
    /// Validation only: every check, no scene
    pub fn validation_only() -> Self {
        Self {
            collision_mode: CollisionMode::Always,
            compose_scene: false,
            ..Default::default()
        }
    }

    pub fn with_collision(mut self, collision: CollisionConfig) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_collision_mode(mut self, mode: CollisionMode) -> Self {
        self.collision_mode = mode;
        self
    }

    pub fn with_compose_scene(mut self, compose: bool) -> Self {
        self.compose_scene = compose;
        self
    }

    pub fn with_event_source(mut self, source: impl Into<String>) -> Self {
        self.event_source = Some(source.into());
        self
    }
}
