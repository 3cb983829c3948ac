//! World transform resolution for a site
//!
//! Builds the Site → Area → Instance hierarchy in a [`TransformHierarchy`] and
//! snapshots the world matrix of every area and instance in document order.

use std::collections::HashMap;

use fdl_asset::{AssetDefinition, Attachment};
use fdl_core::{AreaId, AssetId, ConfigError, InstanceId, TagId};
use fdl_math::glam::{DMat4, DVec3};
use fdl_math::{NodeKey, Transform, TransformHierarchy, TransformNode};

use crate::error::{LayoutError, Result};
use crate::model::{Instance, Site};

/// World placement of one instance
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedInstance {
    pub id: InstanceId,
    pub area: AreaId,
    pub asset: AssetId,
    pub world: DMat4,
}

/// Immutable snapshot of resolved world transforms
#[derive(Clone, Debug, Default)]
pub struct ResolvedLayout {
    areas: Vec<(AreaId, DMat4)>,
    instances: Vec<ResolvedInstance>,
    index: HashMap<InstanceId, usize>,
}

impl ResolvedLayout {
    /// Instances in document order
    #[inline]
    pub fn instances(&self) -> &[ResolvedInstance] {
        &self.instances
    }

    /// Areas with their world matrices, in document order
    #[inline]
    pub fn areas(&self) -> &[(AreaId, DMat4)] {
        &self.areas
    }

    pub fn get(&self, id: &InstanceId) -> Option<&ResolvedInstance> {
        self.index.get(id).map(|&i| &self.instances[i])
    }

    /// World matrix of an instance
    pub fn world(&self, id: &InstanceId) -> Option<DMat4> {
        self.get(id).map(|r| r.world)
    }

    /// World matrix of an area
    pub fn area_world(&self, id: &AreaId) -> Option<DMat4> {
        self.areas.iter().find(|(a, _)| a == id).map(|(_, m)| *m)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Resolve world transforms of every area and instance of a site
///
/// The site itself sits at the world origin. Instance ids must be unique
/// across the site.
pub fn resolve(site: &Site) -> Result<ResolvedLayout> {
    let mut hierarchy = TransformHierarchy::new();
    let root = hierarchy.insert(TransformNode::new(site.id.as_str(), Transform::IDENTITY))?;

    let mut area_keys = Vec::with_capacity(site.areas.len());
    let mut instance_keys = Vec::with_capacity(site.instance_count());
    let mut index = HashMap::with_capacity(site.instance_count());

    for area in &site.areas {
        let area_key = hierarchy
            .insert(TransformNode::new(area.id.as_str(), area.transform).with_parent(root))?;
        area_keys.push((area.id.clone(), area_key));

        for instance in &area.instances {
            if index.insert(instance.id.clone(), instance_keys.len()).is_some() {
                return Err(LayoutError::DuplicateInstance(instance.id.clone()));
            }
            let key = hierarchy.insert(
                TransformNode::new(instance.id.as_str(), instance.transform).with_parent(area_key),
            )?;
            instance_keys.push((area.id.clone(), instance, key));
        }
    }

    let worlds = hierarchy.resolve_all()?;
    let lookup = |key: NodeKey| {
        worlds
            .get(&key)
            .copied()
            .ok_or_else(|| LayoutError::Config(ConfigError::UnknownNode(key.to_string())))
    };

    let areas = area_keys
        .into_iter()
        .map(|(id, key)| Ok((id, lookup(key)?)))
        .collect::<Result<Vec<_>>>()?;
    let instances = instance_keys
        .into_iter()
        .map(|(area, instance, key)| {
            Ok(ResolvedInstance {
                id: instance.id.clone(),
                area,
                asset: instance.asset,
                world: lookup(key)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("resolved {} area(s), {} instance(s)", areas.len(), instances.len());
    Ok(ResolvedLayout { areas, instances, index })
}

/// World position of a tag on a placed instance
///
/// An instance override of the tag's attachment wins over the asset's. An
/// offset attachment resolves to `instance_world · asset_default · offset`
/// (or the offset itself for world-space tags); a node attachment resolves to
/// the origin of the named node, whose transform in the asset geometry frame
/// is supplied by `locate_node`.
pub fn tag_world_position(
    instance_world: &DMat4,
    asset: &AssetDefinition,
    instance: &Instance,
    tag_id: &TagId,
    locate_node: impl Fn(&str) -> Option<DMat4>,
) -> Result<DVec3> {
    let tag = asset.tag(tag_id).ok_or_else(|| LayoutError::UnknownTag {
        instance: instance.id.clone(),
        tag: *tag_id,
    })?;
    let attachment = instance
        .tag_overrides
        .iter()
        .find(|o| &o.tag_id == tag_id)
        .and_then(|o| o.attachment.as_ref())
        .unwrap_or(&tag.attachment);

    let asset_world = *instance_world * asset.default_matrix();
    match attachment {
        Attachment::Position { offset } if tag.world_space => Ok(*offset),
        Attachment::Position { offset } => Ok(asset_world.transform_point3(*offset)),
        Attachment::Node { path } => {
            let node = locate_node(path).ok_or_else(|| LayoutError::UnresolvedNode {
                tag: *tag_id,
                path: path.clone(),
            })?;
            Ok((asset_world * node).transform_point3(DVec3::ZERO))
        }
    }
}
