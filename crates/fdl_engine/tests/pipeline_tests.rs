//! End-to-end pipeline runs

use std::convert::Infallible;
use std::sync::Arc;

use fdl_core::InstanceId;
use fdl_engine::fdl_event::{ChannelSink, EventError, Priority};
use fdl_engine::fdl_scene::{CompositionError, SceneNode};
use fdl_engine::prelude::*;
use fdl_layout::ViolationKind;

const TANK_JSON: &str = r#"{
    "id": "018c3f7e-8a2b-7c3d-9e4f-5a6b7c8d9e13",
    "name": "Tank",
    "geometry": "assets/tank.usd",
    "units": { "length": "mm" },
    "default_volume": { "type": "AABB", "min": [0.0, 0.0, 0.0], "max": [1000.0, 1000.0, 2000.0] }
}"#;

// Three batch tanks 200 mm apart against a 300 mm clearance, plus an
// authored tank whose id the batch has to step around.
const PLANT_JSON: &str = r#"{
    "units": { "length": "mm" },
    "constraints": {
        "scaling": { "allow_non_uniform_scaling": false },
        "collision_detection": { "enabled": true, "clearance_distance": 300.0 }
    },
    "site": {
        "id": "plant_01",
        "name": "Plant 01",
        "areas": [{
            "id": "tank_farm",
            "name": "Tank Farm",
            "instances": [
                { "id": "Tank_00", "asset": "018c3f7e-8a2b-7c3d-9e4f-5a6b7c8d9e13",
                  "transform": { "translate": [10000.0, 0.0, 0.0], "scale": [1.0, 1.0, 1.5] } }
            ]
        }]
    },
    "batch_layouts": [{
        "layout_id": "tank_row",
        "area": "tank_farm",
        "ref_asset": "018c3f7e-8a2b-7c3d-9e4f-5a6b7c8d9e13",
        "naming_prefix": "Tank",
        "pattern": { "type": "line", "count": 3, "start": [0.0, 0.0, 0.0], "end": [2400.0, 0.0, 0.0] }
    }]
}"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> Arc<InMemoryCatalog> {
    let tank: AssetDefinition = serde_json::from_str(TANK_JSON).unwrap();
    Arc::new(InMemoryCatalog::from_assets([tank]).unwrap())
}

fn plant() -> LayoutDocument {
    serde_json::from_str(PLANT_JSON).unwrap()
}

#[test]
fn test_full_run() {
    init_logging();
    let collector = Arc::new(EventCollector::new());
    let pipeline = LayoutPipeline::builder(catalog()).event_sink(collector.clone()).build();

    let report = pipeline.run(&plant()).unwrap();
    assert_eq!(
        report.stages,
        vec![
            PipelineStage::Validate,
            PipelineStage::Normalize,
            PipelineStage::Resolve,
            PipelineStage::Scaling,
            PipelineStage::Collision,
            PipelineStage::Compose,
            PipelineStage::Publish,
        ]
    );
    assert_eq!(report.batch_layouts, 1);
    assert_eq!(report.batch_instances, 3);
    assert_eq!(report.resolved.len(), 4);
    assert!(report.site().instance(&InstanceId::from("Tank_00_2")).is_some());

    assert_eq!(report.scaling_violations.len(), 1);
    assert_eq!(report.scaling_violations[0].instance.as_str(), "Tank_00");
    assert!(matches!(report.scaling_violations[0].kind, ViolationKind::NonUniformScaling { .. }));

    let detection = report.detection.as_ref().unwrap();
    assert!(detection.collisions.is_empty());
    let pairs: Vec<(&str, &str)> = detection
        .clearance_violations
        .iter()
        .map(|v| (v.pair.a.as_str(), v.pair.b.as_str()))
        .collect();
    assert_eq!(pairs, vec![("Tank_00_2", "Tank_01"), ("Tank_01", "Tank_02")]);
    for violation in &detection.clearance_violations {
        assert!((violation.actual - 0.2).abs() < 1e-9);
        assert!((violation.required - 0.3).abs() < 1e-12);
    }
    assert!(!report.is_valid());

    // site, area and four instances
    assert_eq!(report.scene.as_ref().unwrap().len(), 6);

    assert_eq!(report.events_published, 5);
    let events = collector.events();
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "ScalingViolated",
            "ClearanceViolated",
            "ClearanceViolated",
            "BatchExpanded",
            "SceneComposed",
        ]
    );
    assert_eq!(events[0].priority, Priority::Normal);
    assert!(events.iter().all(|e| e.source == "plant_01"));
}

#[test]
fn test_stages_follow_config() {
    init_logging();
    let config = PipelineConfig::default()
        .with_collision_mode(CollisionMode::Never)
        .with_compose_scene(false);
    let pipeline = LayoutPipeline::builder(catalog()).config(config).build();

    let report = pipeline.run(&plant()).unwrap();
    assert_eq!(
        report.stages,
        vec![
            PipelineStage::Validate,
            PipelineStage::Normalize,
            PipelineStage::Resolve,
            PipelineStage::Scaling,
        ]
    );
    assert!(report.detection.is_none());
    assert!(report.scene.is_none());
    assert_eq!(report.events_published, 0);

    let types: Vec<&str> = events_from_report(&report).iter().map(LayoutEvent::event_type).collect();
    assert_eq!(types, vec!["BatchExpanded", "ScalingViolated"]);
}

#[test]
fn test_configured_clearance_tightens_document() {
    init_logging();
    let mut doc = plant();
    doc.constraints.collision_detection.clearance_distance = 0.0;

    let relaxed = LayoutPipeline::new(catalog()).run(&doc).unwrap();
    assert!(relaxed.detection.unwrap().clearance_violations.is_empty());

    let config = PipelineConfig::default()
        .with_collision(CollisionConfig::default().with_default_clearance(0.25));
    let strict = LayoutPipeline::builder(catalog()).config(config).build().run(&doc).unwrap();
    assert_eq!(strict.detection.unwrap().clearance_violations.len(), 2);
}

#[test]
fn test_unknown_asset() {
    init_logging();
    let mut doc = plant();
    doc.site.areas[0].instances[0].asset = AssetId::new();

    let err = LayoutPipeline::new(catalog()).run(&doc).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Composition(CompositionError::DanglingAsset { ref instance, .. })
            if instance.as_str() == "Tank_00"
    ));

    // without a scene the instance is only excluded from detection
    let pipeline = LayoutPipeline::builder(catalog())
        .config(PipelineConfig::validation_only())
        .build();
    let report = pipeline.run(&doc).unwrap();
    let detection = report.detection.unwrap();
    assert_eq!(detection.bodies, 3);
    assert_eq!(detection.warnings.len(), 1);
    assert_eq!(detection.warnings[0].instance.as_str(), "Tank_00");
}

#[test]
fn test_invalid_document_stops_early() {
    let mut doc = plant();
    doc.constraints.collision_detection.clearance_distance = -1.0;
    let collector = Arc::new(EventCollector::new());
    let pipeline = LayoutPipeline::builder(catalog()).event_sink(collector.clone()).build();

    assert!(matches!(pipeline.run(&doc), Err(PipelineError::Layout(_))));
    assert!(collector.is_empty());
}

#[test]
fn test_full_channel() {
    init_logging();
    let (sink, _receiver) = ChannelSink::bounded(1);
    let pipeline = LayoutPipeline::builder(catalog()).event_sink(Arc::new(sink)).build();

    assert!(matches!(pipeline.run(&plant()), Err(PipelineError::Event(EventError::Full))));
}

#[derive(Default)]
struct PathWriter {
    paths: Vec<String>,
    finished: bool,
}

impl SceneWriter for PathWriter {
    type Error = Infallible;

    fn write_node(&mut self, node: &SceneNode) -> Result<(), Infallible> {
        self.paths.push(node.path.as_str().to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Infallible> {
        self.finished = true;
        Ok(())
    }
}

#[test]
fn test_run_and_write() {
    init_logging();
    let mut writer = PathWriter::default();
    let report = LayoutPipeline::new(catalog()).run_and_write(&plant(), &mut writer).unwrap();

    assert!(writer.finished);
    assert_eq!(writer.paths.len(), report.scene.unwrap().len());
    assert_eq!(writer.paths[0], "/plant_01");
    assert_eq!(writer.paths[1], "/plant_01/tank_farm");
}
