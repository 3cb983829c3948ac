//! The layout pipeline
//!
//! ```text
//! LayoutDocument ─► validate ─► normalize (batches expanded) ─► resolve
//!                                                                 │
//!            ┌───────────────────────┬────────────────────────────┤
//!            ▼                       ▼                            ▼
//!     scaling rules        collision / clearance            scene composer
//!            └───────────────────────┴──────────► PipelineReport ─► events
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use fdl_asset::{AssetCatalog, InMemoryCatalog};
use fdl_collision::{CollisionDetector, DetectionReport, MeshSource};
use fdl_event::{detection_events, scaling_events, EventPublisher, EventSink, LayoutEvent};
use fdl_layout::{
    normalize_asset, normalize_document, resolve, validate_site, LayoutDocument, ResolvedLayout,
    ScalingViolation, Site,
};
use fdl_scene::{compose_resolved, SceneGraph, SceneWriter};

use crate::config::{CollisionMode, PipelineConfig};
use crate::error::{PipelineError, Result};

/// Steps of a pipeline run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Validate,
    Normalize,
    Resolve,
    Scaling,
    Collision,
    Compose,
    Publish,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Normalize => "normalize",
            Self::Resolve => "resolve",
            Self::Scaling => "scaling",
            Self::Collision => "collision",
            Self::Compose => "compose",
            Self::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Everything one run produced
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Document in the canonical frame with batches expanded
    pub document: LayoutDocument,
    pub resolved: ResolvedLayout,
    /// Batch layouts expanded during normalization
    pub batch_layouts: usize,
    /// Instances generated from batch layouts
    pub batch_instances: usize,
    pub scaling_violations: Vec<ScalingViolation>,
    /// `None` when detection did not run
    pub detection: Option<DetectionReport>,
    /// `None` when composition is switched off
    pub scene: Option<SceneGraph>,
    /// Stages in the order they ran
    pub stages: Vec<PipelineStage>,
    pub events_published: usize,
}

impl PipelineReport {
    /// No scaling violations, collisions or clearance violations
    pub fn is_valid(&self) -> bool {
        self.scaling_violations.is_empty() && self.detection.as_ref().map_or(true, DetectionReport::is_clear)
    }

    #[inline]
    pub fn site(&self) -> &Site {
        &self.document.site
    }
}

/// Events describing a report, in report order
pub fn events_from_report(report: &PipelineReport) -> Vec<LayoutEvent> {
    let mut events = Vec::new();
    if report.batch_instances > 0 {
        events.push(LayoutEvent::BatchExpanded {
            layouts: report.batch_layouts,
            instances: report.batch_instances,
        });
    }
    events.extend(scaling_events(&report.scaling_violations));
    if let Some(detection) = &report.detection {
        events.extend(detection_events(detection));
    }
    if let Some(scene) = &report.scene {
        events.push(LayoutEvent::SceneComposed {
            site: report.document.site.id.clone(),
            nodes: scene.len(),
        });
    }
    events
}

/// Runs layout documents against an asset catalog
pub struct LayoutPipeline {
    config: PipelineConfig,
    catalog: Arc<dyn AssetCatalog>,
    meshes: Option<Arc<dyn MeshSource>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl LayoutPipeline {
    /// Pipeline with default configuration
    pub fn new(catalog: Arc<dyn AssetCatalog>) -> Self {
        Self::builder(catalog).build()
    }

    pub fn builder(catalog: Arc<dyn AssetCatalog>) -> PipelineBuilder {
        PipelineBuilder::new(catalog)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over a document
    pub fn run(&self, doc: &LayoutDocument) -> Result<PipelineReport> {
        let mut stages = Vec::with_capacity(7);

        enter(&mut stages, PipelineStage::Validate);
        doc.validate()?;
        let authored = doc.site.instance_count();
        let batch_layouts = doc.batch_layouts.len();

        enter(&mut stages, PipelineStage::Normalize);
        let document = normalize_document(doc)?;
        let batch_instances = document.site.instance_count().saturating_sub(authored);
        let catalog = self.normalized_catalog(&document.site)?;

        enter(&mut stages, PipelineStage::Resolve);
        let resolved = resolve(&document.site)?;

        enter(&mut stages, PipelineStage::Scaling);
        let scaling_violations = validate_site(&document.site, &document.constraints.scaling)?;
        for violation in &scaling_violations {
            log::info!("{violation}");
        }

        let detect = match self.config.collision_mode {
            CollisionMode::FollowDocument => document.constraints.collision_detection.enabled,
            CollisionMode::Always => true,
            CollisionMode::Never => false,
        };
        let detection = if detect {
            enter(&mut stages, PipelineStage::Collision);
            Some(self.detect(&document, &resolved, &catalog)?)
        } else {
            None
        };

        let scene = if self.config.compose_scene {
            enter(&mut stages, PipelineStage::Compose);
            Some(compose_resolved(&document.site, &resolved, &catalog)?)
        } else {
            None
        };

        let mut report = PipelineReport {
            document,
            resolved,
            batch_layouts,
            batch_instances,
            scaling_violations,
            detection,
            scene,
            stages,
            events_published: 0,
        };

        if let Some(sink) = &self.sink {
            enter(&mut report.stages, PipelineStage::Publish);
            let source = self
                .config
                .event_source
                .clone()
                .unwrap_or_else(|| report.document.site.id.to_string());
            let publisher = EventPublisher::new(sink.as_ref(), source);
            report.events_published = publisher.publish_all(events_from_report(&report))?;
        }

        log::info!(
            "layout {}: {} instance(s), valid = {}",
            report.document.site.id,
            report.resolved.len(),
            report.is_valid()
        );
        Ok(report)
    }

    /// Run, then hand the composed scene to `writer`
    pub fn run_and_write<W: SceneWriter>(&self, doc: &LayoutDocument, writer: &mut W) -> Result<PipelineReport> {
        let report = self.run(doc)?;
        if let Some(scene) = &report.scene {
            let written = scene.write(writer).map_err(|e| PipelineError::Writer(e.to_string()))?;
            log::debug!("wrote {written} scene node(s)");
        }
        Ok(report)
    }

    /// Referenced assets converted to the canonical frame
    ///
    /// Unknown assets are left out; the detector and the composer report them.
    fn normalized_catalog(&self, site: &Site) -> Result<InMemoryCatalog> {
        let referenced: BTreeSet<_> = site.instances().map(|(_, i)| i.asset).collect();
        let normalized = InMemoryCatalog::new();
        for id in referenced {
            match self.catalog.get_asset(&id) {
                Ok(asset) => {
                    normalized.register(normalize_asset(&asset)?)?;
                }
                Err(e) => log::warn!("{e}"),
            }
        }
        Ok(normalized)
    }

    fn detect(
        &self,
        document: &LayoutDocument,
        resolved: &ResolvedLayout,
        catalog: &InMemoryCatalog,
    ) -> Result<DetectionReport> {
        // the stricter of configured and document clearance applies
        let clearance = document
            .constraints
            .collision_detection
            .clearance_distance
            .max(self.config.collision.default_clearance);
        let config = self.config.collision.clone().with_default_clearance(clearance);

        let mut detector = CollisionDetector::new(config);
        if let Some(meshes) = &self.meshes {
            detector = detector.with_mesh_source(Arc::clone(meshes));
        }
        Ok(detector.detect_layout(&document.site, resolved, catalog)?)
    }
}

fn enter(stages: &mut Vec<PipelineStage>, stage: PipelineStage) {
    log::debug!("pipeline stage: {stage}");
    stages.push(stage);
}

/// Builder for [`LayoutPipeline`]
pub struct PipelineBuilder {
    config: PipelineConfig,
    catalog: Arc<dyn AssetCatalog>,
    meshes: Option<Arc<dyn MeshSource>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl PipelineBuilder {
    pub fn new(catalog: Arc<dyn AssetCatalog>) -> Self {
        Self {
            config: PipelineConfig::default(),
            catalog,
            meshes: None,
            sink: None,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// External geometry for mesh narrowphase
    pub fn mesh_source(mut self, meshes: Arc<dyn MeshSource>) -> Self {
        self.meshes = Some(meshes);
        self
    }

    /// Publish results as events after every run
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> LayoutPipeline {
        LayoutPipeline {
            config: self.config,
            catalog: self.catalog,
            meshes: self.meshes,
            sink: self.sink,
        }
    }
}
