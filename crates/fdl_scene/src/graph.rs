//! Composed scene graph
//!
//! Nodes are keyed by path, so two compositions of the same site compare
//! equal node for node. Sibling order is kept in each node's `children`.

use std::collections::BTreeMap;

use fdl_core::InstanceId;
use fdl_math::glam::DMat4;
use serde::Serialize;

use crate::error::{CompositionError, Result};
use crate::node::{NodeKind, SceneNode};
use crate::path::ScenePath;

/// Receiver of a composed scene, e.g. a scene-description file writer
pub trait SceneWriter {
    type Error: std::error::Error;

    /// Called once per node, parents before children, siblings in
    /// composition order
    fn write_node(&mut self, node: &SceneNode) -> std::result::Result<(), Self::Error>;

    /// Called after the last node
    fn finish(&mut self) -> std::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Hierarchical scene produced by composition
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SceneGraph {
    root: Option<ScenePath>,
    nodes: BTreeMap<ScenePath, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under its parent path
    ///
    /// `source` names what the node was made from and is only used to
    /// report name collisions.
    pub(crate) fn insert(&mut self, mut node: SceneNode, source: &str) -> Result<()> {
        if let Some(existing) = self.nodes.get(&node.path) {
            return Err(CompositionError::NameCollision {
                path: node.path.clone(),
                first: existing.origin.clone(),
                second: source.to_string(),
            });
        }

        match node.path.parent() {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    parent.children.push(node.path.clone());
                }
            }
            None => self.root = Some(node.path.clone()),
        }
        node.origin = source.to_string();
        self.nodes.insert(node.path.clone(), node);
        Ok(())
    }

    /// The site node
    pub fn root(&self) -> Option<&SceneNode> {
        self.root.as_ref().and_then(|p| self.nodes.get(p))
    }

    pub fn get(&self, path: &ScenePath) -> Option<&SceneNode> {
        self.nodes.get(path)
    }

    /// Look up by path text
    pub fn find(&self, path: &str) -> Option<&SceneNode> {
        self.nodes.get(path)
    }

    /// Node composed from a layout instance
    pub fn instance_node(&self, id: &InstanceId) -> Option<&SceneNode> {
        self.nodes
            .values()
            .find(|n| n.kind == NodeKind::Instance && n.instance.as_ref() == Some(id))
    }

    /// Child nodes in composition order
    pub fn children(&self, path: &ScenePath) -> impl Iterator<Item = &SceneNode> {
        self.nodes
            .get(path)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|c| self.nodes.get(c))
    }

    /// All nodes in path order
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// World matrix of a node, re-derived from the output hierarchy
    pub fn world_transform(&self, path: &ScenePath) -> Option<DMat4> {
        let node = self.nodes.get(path)?;
        match path.parent() {
            Some(parent) => Some(self.world_transform(&parent)? * node.local),
            None => Some(node.local),
        }
    }

    /// Nodes depth-first, parents before children
    pub fn preorder(&self) -> Vec<&SceneNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&ScenePath> = self.root.iter().collect();
        while let Some(path) = stack.pop() {
            if let Some(node) = self.nodes.get(path) {
                out.push(node);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Hand every node to a writer; returns the number of nodes written
    pub fn write<W: SceneWriter>(&self, writer: &mut W) -> std::result::Result<usize, W::Error> {
        let nodes = self.preorder();
        for node in &nodes {
            writer.write_node(node)?;
        }
        writer.finish()?;
        Ok(nodes.len())
    }
}
