//! Composition of a layout into a scene graph
//!
//! Output hierarchy: `/<Site>/<Area>/<Instance>[/Tags/<tag>]`. Instance nodes
//! reference their asset and carry variant tokens; tag overrides become child
//! nodes keyed by tag id. Every node's local transform is relative to its
//! parent in the output, so re-deriving world matrices from the scene gives
//! back the resolved layout.

use std::collections::BTreeMap;
use std::sync::Arc;

use fdl_asset::{AssetCatalog, AssetDefinition, Attachment};
use fdl_layout::{resolve, Instance, ResolvedLayout, Site, TagOverride};
use fdl_math::glam::DMat4;

use crate::error::{CompositionError, Result};
use crate::graph::SceneGraph;
use crate::node::{AssetReference, NodeKind, SceneNode};
use crate::path::ScenePath;

/// Name of the per-instance tag container
pub const TAGS_NODE: &str = "Tags";

/// Resolve a site and compose it
pub fn compose(site: &Site, catalog: &dyn AssetCatalog) -> Result<SceneGraph> {
    let resolved = resolve(site)?;
    compose_resolved(site, &resolved, catalog)
}

/// Compose a site whose world transforms are already resolved
///
/// Fails without output on the first dangling asset, unknown tag or name
/// collision.
pub fn compose_resolved(site: &Site, resolved: &ResolvedLayout, catalog: &dyn AssetCatalog) -> Result<SceneGraph> {
    let assets = lookup_assets(site, catalog)?;
    let mut scene = SceneGraph::new();

    let site_path = ScenePath::root(site.id.as_str());
    let mut site_node = SceneNode::new(site_path.clone(), NodeKind::Site, DMat4::IDENTITY)
        .with_attribute("name", site.name.clone());
    if let Some(location) = &site.location {
        site_node = site_node
            .with_attribute("latitude", location.latitude.to_string())
            .with_attribute("longitude", location.longitude.to_string());
    }
    scene.insert(site_node, site.id.as_str())?;

    for area in &site.areas {
        let area_world = resolved
            .area_world(&area.id)
            .unwrap_or_else(|| area.transform.to_matrix());
        let area_path = site_path.child(area.id.as_str());
        let area_node = SceneNode::new(area_path.clone(), NodeKind::Area, area_world)
            .with_attribute("name", area.name.clone())
            .with_attribute("kind", area.kind.clone());
        scene.insert(area_node, area.id.as_str())?;

        let parent_inverse = area_world.inverse();
        for instance in &area.instances {
            let world = resolved
                .world(&instance.id)
                .ok_or_else(|| CompositionError::Unresolved(instance.id.clone()))?;
            let asset = assets
                .get(&instance.id)
                .ok_or_else(|| CompositionError::Unresolved(instance.id.clone()))?;
            compose_instance(&mut scene, &area_path, parent_inverse * world, world, instance, asset)?;
        }
    }

    log::debug!("composed {} scene node(s) for site {}", scene.len(), site.id);
    Ok(scene)
}

/// Fetch every referenced asset up front so a dangling reference fails
/// before anything is built
fn lookup_assets(
    site: &Site,
    catalog: &dyn AssetCatalog,
) -> Result<BTreeMap<fdl_core::InstanceId, Arc<AssetDefinition>>> {
    site.instances()
        .map(|(_, instance)| {
            catalog
                .get_asset(&instance.asset)
                .map(|asset| (instance.id.clone(), asset))
                .map_err(|_| CompositionError::DanglingAsset {
                    instance: instance.id.clone(),
                    asset: instance.asset,
                })
        })
        .collect()
}

fn compose_instance(
    scene: &mut SceneGraph,
    area_path: &ScenePath,
    local: DMat4,
    world: DMat4,
    instance: &Instance,
    asset: &AssetDefinition,
) -> Result<()> {
    let path = area_path.child(instance.id.as_str());

    let mut node = SceneNode::new(path.clone(), NodeKind::Instance, local)
        .with_attribute("name", instance.display_name().to_string());
    node.instance = Some(instance.id.clone());
    node.reference = Some(AssetReference {
        asset: asset.id,
        geometry: asset.geometry.clone(),
    });
    node.variants = variant_tokens(instance, asset);
    node.attributes
        .extend(instance.metadata.iter().map(|(k, v)| (format!("meta:{k}"), v.clone())));
    scene.insert(node, instance.id.as_str())?;

    if instance.tag_overrides.is_empty() {
        return Ok(());
    }
    let tags_path = path.child(TAGS_NODE);
    scene.insert(SceneNode::new(tags_path.clone(), NodeKind::TagGroup, DMat4::IDENTITY), TAGS_NODE)?;

    let world_inverse = world.inverse();
    for tag_override in &instance.tag_overrides {
        let tag_node = compose_tag(&tags_path, &world_inverse, instance, asset, tag_override)?;
        let origin = tag_override.tag_id.to_string();
        scene.insert(tag_node, &origin)?;
    }
    Ok(())
}

fn compose_tag(
    tags_path: &ScenePath,
    world_inverse: &DMat4,
    instance: &Instance,
    asset: &AssetDefinition,
    tag_override: &TagOverride,
) -> Result<SceneNode> {
    let tag = asset
        .tag(&tag_override.tag_id)
        .ok_or_else(|| CompositionError::UnknownTag {
            instance: instance.id.clone(),
            tag: tag_override.tag_id,
        })?;
    let attachment = tag_override.attachment.as_ref().unwrap_or(&tag.attachment);

    // position relative to the instance node
    let (local, attach_node) = match attachment {
        Attachment::Position { offset } if tag.world_space => {
            (DMat4::from_translation(world_inverse.transform_point3(*offset)), None)
        }
        Attachment::Position { offset } => {
            (DMat4::from_translation(asset.default_matrix().transform_point3(*offset)), None)
        }
        Attachment::Node { path } => (DMat4::IDENTITY, Some(path.clone())),
    };

    let path = tags_path.child(&format!("Tag_{}", tag.id));
    let mut node = SceneNode::new(path, NodeKind::Tag, local)
        .with_attribute("tag_id", tag.id.to_string())
        .with_attribute("name", tag.name.clone())
        .with_attribute("kind", tag.kind.as_str());
    if let Some(unit) = &tag.eu_unit {
        node = node.with_attribute("eu_unit", unit.clone());
    }
    if let Some(attach_node) = attach_node {
        node = node.with_attribute("attach_node", attach_node);
    }
    let properties = tag.properties.iter().chain(&tag_override.properties);
    node.attributes
        .extend(properties.map(|(k, v)| (format!("prop:{k}"), v.clone())));
    Ok(node)
}

/// Instance selection per variant set, else the asset's default
fn variant_tokens(instance: &Instance, asset: &AssetDefinition) -> BTreeMap<String, String> {
    let mut tokens: BTreeMap<String, String> = asset
        .variants
        .iter()
        .filter_map(|set| set.default.as_ref().map(|d| (set.name.clone(), d.clone())))
        .collect();
    tokens.extend(instance.variant_selections.iter().map(|(k, v)| (k.clone(), v.clone())));
    tokens
}
