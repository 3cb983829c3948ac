//! Narrowphase refinement of broadphase candidates

use std::collections::HashMap;
use std::sync::Arc;

use fdl_math::{obb_intersects_obb, triangles_intersect, Aabb, Triangle};
use parking_lot::RwLock;

use crate::config::Narrowphase;
use crate::volume::{CollisionBody, GeometryRef};

/// Full-fidelity geometry supplied from outside the engine
///
/// Triangles are in the asset geometry frame, in meters.
pub trait MeshSource: Send + Sync {
    /// Triangles of a geometry reference, `None` when unknown
    fn triangles(&self, source: &str) -> Option<Arc<[Triangle]>>;
}

/// Mesh source that knows no geometry
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMeshes;

impl MeshSource for NoMeshes {
    fn triangles(&self, _source: &str) -> Option<Arc<[Triangle]>> {
        None
    }
}

/// Mesh source backed by a locked map
#[derive(Default)]
pub struct InMemoryMeshes {
    meshes: RwLock<HashMap<String, Arc<[Triangle]>>>,
}

impl InMemoryMeshes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the triangles of a geometry reference
    pub fn insert(&self, source: impl Into<String>, triangles: impl Into<Arc<[Triangle]>>) {
        self.meshes.write().insert(source.into(), triangles.into());
    }

    pub fn len(&self) -> usize {
        self.meshes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.read().is_empty()
    }
}

impl MeshSource for InMemoryMeshes {
    fn triangles(&self, source: &str) -> Option<Arc<[Triangle]>> {
        self.meshes.read().get(source).cloned()
    }
}

/// Whether two broadphase candidates really intersect
pub fn refine(a: &CollisionBody, b: &CollisionBody, mode: Narrowphase, meshes: &dyn MeshSource) -> bool {
    match mode {
        Narrowphase::Disabled => true,
        Narrowphase::Obb => obb_intersects_obb(&a.world_obb(), &b.world_obb()),
        Narrowphase::Mesh => match (world_mesh(a, meshes), world_mesh(b, meshes)) {
            (Some(ta), Some(tb)) => meshes_intersect(&ta, &tb),
            _ => obb_intersects_obb(&a.world_obb(), &b.world_obb()),
        },
    }
}

fn world_mesh(body: &CollisionBody, meshes: &dyn MeshSource) -> Option<Vec<Triangle>> {
    let GeometryRef { source, world } = body.geometry.as_ref()?;
    let local = meshes.triangles(source)?;
    Some(
        local
            .iter()
            .map(|t| t.map(|p| world.transform_point3(p)))
            .collect(),
    )
}

/// Surface intersection of two triangle soups
///
/// A mesh fully enclosed by the other without touching surfaces does not
/// count.
pub fn meshes_intersect(a: &[Triangle], b: &[Triangle]) -> bool {
    let bounds_b: Vec<Aabb> = b.iter().map(|t| Aabb::from_points(t)).collect();
    let all_b = bounds_b.iter().fold(Aabb::EMPTY, |acc, bb| acc.union(bb));

    a.iter().any(|ta| {
        let bound_a = Aabb::from_points(ta);
        bound_a.intersects(&all_b)
            && b
                .iter()
                .zip(&bounds_b)
                .any(|(tb, bound_b)| bound_a.intersects(bound_b) && triangles_intersect(ta, tb))
    })
}
