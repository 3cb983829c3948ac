//! Catalog integration tests

use std::sync::Arc;
use std::thread;

use fdl_asset::prelude::*;
use fdl_core::AssetId;
use fdl_math::{BoundingVolume, LengthUnit};

const PUMP_JSON: &str = r#"{
    "id": "018c3f7e-8a2b-7c3d-9e4f-5a6b7c8d9e12",
    "name": "Centrifugal Pump",
    "geometry": "assets/pump_p100.usd",
    "units": { "length": "mm" },
    "default_transform": { "rotation": [0.0, 0.0, 90.0] },
    "default_volume": { "type": "AABB", "min": [-500.0, -300.0, 0.0], "max": [500.0, 300.0, 800.0] },
    "tags": [
        {
            "id": "018c3f7e-9b3c-7d4e-8f5a-6b7c8d9e0f1b",
            "name": "Discharge Pressure",
            "kind": "sensor",
            "eu_unit": "bar",
            "strategy": "by_position",
            "offset": [450.0, 0.0, 600.0]
        }
    ],
    "variants": [ { "name": "lod", "options": ["high", "low"], "default": "high" } ]
}"#;

#[test]
fn test_definition_from_json() {
    let asset: AssetDefinition = serde_json::from_str(PUMP_JSON).unwrap();
    assert_eq!(asset.units.length, LengthUnit::Millimeter);
    assert_eq!(asset.default_transform.rotation().z, 90.0);
    assert!(matches!(asset.default_volume, Some(BoundingVolume::Aabb(_))));
    assert_eq!(asset.tags[0].eu_unit.as_deref(), Some("bar"));
    assert_eq!(asset.variant_set("lod").and_then(|v| v.default.as_deref()), Some("high"));
    assert!(asset.validate().is_ok());
}

#[test]
fn test_concurrent_readers() {
    let asset: AssetDefinition = serde_json::from_str(PUMP_JSON).unwrap();
    let id = asset.id;
    let catalog = Arc::new(InMemoryCatalog::from_assets([asset]).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = catalog.clone();
            thread::spawn(move || catalog.get_asset(&id).map(|a| a.name.clone()))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "Centrifugal Pump");
    }
}

#[test]
fn test_catalog_through_trait_object() {
    let catalog: Arc<dyn AssetCatalog> = Arc::new(InMemoryCatalog::new());
    let missing = AssetId::new();
    assert!(matches!(catalog.get_asset(&missing), Err(CatalogError::NotFound(_))));
}
