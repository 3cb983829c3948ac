//! Asset catalog
//!
//! The engine reads definitions through [`AssetCatalog`]; where they are
//! stored is up to the caller. [`InMemoryCatalog`] is the shared in-process
//! implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use fdl_core::AssetId;
use parking_lot::RwLock;

use crate::definition::AssetDefinition;
use crate::error::{CatalogError, Result};

/// Read-only source of asset definitions
pub trait AssetCatalog: Send + Sync {
    /// Look up a definition
    fn get_asset(&self, id: &AssetId) -> Result<Arc<AssetDefinition>>;

    /// Whether a definition exists
    fn contains(&self, id: &AssetId) -> bool {
        self.get_asset(id).is_ok()
    }
}

/// Catalog backed by a locked map
#[derive(Default)]
pub struct InMemoryCatalog {
    assets: RwLock<BTreeMap<AssetId, Arc<AssetDefinition>>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from definitions, rejecting the first invalid or repeated one
    pub fn from_assets(assets: impl IntoIterator<Item = AssetDefinition>) -> Result<Self> {
        let catalog = Self::new();
        for asset in assets {
            catalog.register(asset)?;
        }
        Ok(catalog)
    }

    /// Validate and add a definition
    pub fn register(&self, asset: AssetDefinition) -> Result<Arc<AssetDefinition>> {
        asset.validate()?;
        let mut assets = self.assets.write();
        if assets.contains_key(&asset.id) {
            return Err(CatalogError::AlreadyRegistered(asset.id));
        }
        let id = asset.id;
        let shared = Arc::new(asset);
        assets.insert(id, shared.clone());
        log::debug!("registered asset {} ({})", shared.name, id);
        Ok(shared)
    }

    /// Validate and add or replace a definition
    ///
    /// Instances already holding the old `Arc` keep seeing the old version.
    pub fn upsert(&self, asset: AssetDefinition) -> Result<Option<Arc<AssetDefinition>>> {
        asset.validate()?;
        Ok(self.assets.write().insert(asset.id, Arc::new(asset)))
    }

    /// Remove a definition
    pub fn remove(&self, id: &AssetId) -> Option<Arc<AssetDefinition>> {
        self.assets.write().remove(id)
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    /// All ids, oldest first (UUIDv7 order)
    pub fn ids(&self) -> Vec<AssetId> {
        self.assets.read().keys().copied().collect()
    }
}

impl AssetCatalog for InMemoryCatalog {
    fn get_asset(&self, id: &AssetId) -> Result<Arc<AssetDefinition>> {
        self.assets
            .read()
            .get(id)
            .cloned()
            .ok_or(CatalogError::NotFound(*id))
    }

    fn contains(&self, id: &AssetId) -> bool {
        self.assets.read().contains_key(id)
    }
}

impl<C: AssetCatalog + ?Sized> AssetCatalog for Arc<C> {
    fn get_asset(&self, id: &AssetId) -> Result<Arc<AssetDefinition>> {
        (**self).get_asset(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get_shares_arc() {
        let catalog = InMemoryCatalog::new();
        let stored = catalog.register(AssetDefinition::new("Pump", "pump.usd")).unwrap();
        let fetched = catalog.get_asset(&stored.id).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
    }

    #[test]
    fn test_missing_asset() {
        let catalog = InMemoryCatalog::new();
        let id = AssetId::new();
        assert_eq!(catalog.get_asset(&id).unwrap_err(), CatalogError::NotFound(id));
        assert!(!catalog.contains(&id));
    }

    #[test]
    fn test_duplicate_registration() {
        let catalog = InMemoryCatalog::new();
        let asset = AssetDefinition::new("Pump", "pump.usd");
        catalog.register(asset.clone()).unwrap();
        assert!(matches!(catalog.register(asset), Err(CatalogError::AlreadyRegistered(_))));
    }

    #[test]
    fn test_upsert_keeps_old_arcs_alive() {
        let catalog = InMemoryCatalog::new();
        let first = catalog.register(AssetDefinition::new("Pump", "pump_v1.usd")).unwrap();
        let mut second = (*first).clone();
        second.geometry = "pump_v2.usd".into();
        let replaced = catalog.upsert(second).unwrap();

        assert_eq!(replaced.unwrap().geometry, "pump_v1.usd");
        assert_eq!(first.geometry, "pump_v1.usd");
        assert_eq!(catalog.get_asset(&first.id).unwrap().geometry, "pump_v2.usd");
    }

    #[test]
    fn test_ids_in_creation_order() {
        let a = AssetDefinition::new("A", "a.usd");
        let b = AssetDefinition::new("B", "b.usd");
        let (a_id, b_id) = (a.id, b.id);
        let catalog = InMemoryCatalog::from_assets([b, a]).unwrap();
        let ids = catalog.ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a_id) && ids.contains(&b_id));
        assert!(ids[0] <= ids[1]);
    }
}
