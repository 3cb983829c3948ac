//! Transform hierarchy arena
//!
//! Nodes live in a generational arena and reference their parent by key.
//! World transforms are composed root-to-leaf; ancestor walks keep a visited
//! set so a corrupted parent chain surfaces as [`ConfigError::CyclicHierarchy`]
//! instead of looping forever.

use std::collections::{HashMap, HashSet};

use fdl_core::{ConfigError, Result};
use glam::DMat4;

use crate::transform::Transform;

/// Key of a node in a [`TransformHierarchy`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    index: u32,
    generation: u32,
}

impl NodeKey {
    /// Raw slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl core::fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeKey({}v{})", self.index, self.generation)
    }
}

impl core::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A node: local transform plus optional parent
#[derive(Clone, Debug, PartialEq)]
pub struct TransformNode {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeKey>,
}

impl TransformNode {
    /// Root node with the given transform
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            parent: None,
        }
    }

    /// Set the parent (builder pattern)
    pub fn with_parent(mut self, parent: NodeKey) -> Self {
        self.parent = Some(parent);
        self
    }
}

struct Slot {
    node: Option<TransformNode>,
    generation: u32,
}

/// Arena of transform nodes
#[derive(Default)]
pub struct TransformHierarchy {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    len: usize,
}

impl TransformHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no nodes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a node; its parent, if any, must already exist
    pub fn insert(&mut self, node: TransformNode) -> Result<NodeKey> {
        if let Some(parent) = node.parent {
            if !self.contains(parent) {
                return Err(ConfigError::UnknownNode(parent.to_string()));
            }
        }

        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            Ok(NodeKey { index, generation: slot.generation })
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { node: Some(node), generation: 0 });
            Ok(NodeKey { index, generation: 0 })
        }
    }

    /// Whether the key refers to a live node
    #[inline]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.get(key).is_some()
    }

    /// Look up a node
    pub fn get(&self, key: NodeKey) -> Option<&TransformNode> {
        let slot = self.slots.get(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Look up a node mutably
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut TransformNode> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Re-parent a node
    ///
    /// Cycles are not rejected here; they are reported when the chain is
    /// resolved.
    pub fn set_parent(&mut self, key: NodeKey, parent: Option<NodeKey>) -> Result<()> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(ConfigError::UnknownNode(parent.to_string()));
            }
        }
        let node = self
            .get_mut(key)
            .ok_or_else(|| ConfigError::UnknownNode(key.to_string()))?;
        node.parent = parent;
        Ok(())
    }

    /// Direct children of a node
    pub fn children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.iter()
            .filter(|(_, node)| node.parent == Some(key))
            .map(|(child, _)| child)
            .collect()
    }

    /// Remove a node and its whole subtree, returning how many were removed
    pub fn remove(&mut self, key: NodeKey) -> Result<usize> {
        if !self.contains(key) {
            return Err(ConfigError::UnknownNode(key.to_string()));
        }

        let mut doomed = vec![key];
        let mut seen: HashSet<NodeKey> = HashSet::from([key]);
        let mut cursor = 0;
        while cursor < doomed.len() {
            for child in self.children(doomed[cursor]) {
                if seen.insert(child) {
                    doomed.push(child);
                }
            }
            cursor += 1;
        }

        for k in &doomed {
            let slot = &mut self.slots[k.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(k.index);
            self.len -= 1;
        }
        log::debug!("removed {} node(s) rooted at {}", doomed.len(), key);
        Ok(doomed.len())
    }

    /// Iterate live nodes in slot order
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &TransformNode)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|node| {
                (NodeKey { index: index as u32, generation: slot.generation }, node)
            })
        })
    }

    /// Ancestor chain of a node, leaf first
    fn chain(&self, key: NodeKey) -> Result<Vec<NodeKey>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(key);

        while let Some(k) = current {
            let node = self
                .get(k)
                .ok_or_else(|| ConfigError::UnknownNode(k.to_string()))?;
            if !visited.insert(k) {
                return Err(ConfigError::CyclicHierarchy { node: node.name.clone() });
            }
            chain.push(k);
            current = node.parent;
        }
        Ok(chain)
    }

    /// World matrix of a node: `parent_world · T · R · S`, root to leaf
    pub fn world_transform(&self, key: NodeKey) -> Result<DMat4> {
        let chain = self.chain(key)?;
        let mut world = DMat4::IDENTITY;
        for k in chain.iter().rev() {
            if let Some(node) = self.get(*k) {
                world *= node.transform.to_matrix();
            }
        }
        Ok(world)
    }

    /// World matrix of every node, composing each ancestor only once
    pub fn resolve_all(&self) -> Result<HashMap<NodeKey, DMat4>> {
        let mut resolved: HashMap<NodeKey, DMat4> = HashMap::with_capacity(self.len);

        for (key, _) in self.iter() {
            if resolved.contains_key(&key) {
                continue;
            }
            let chain = self.chain(key)?;
            // Start from the nearest ancestor already resolved
            let mut world = DMat4::IDENTITY;
            let mut pending = chain.len();
            for (i, k) in chain.iter().enumerate() {
                if let Some(m) = resolved.get(k) {
                    world = *m;
                    pending = i;
                    break;
                }
            }
            for k in chain[..pending].iter().rev() {
                if let Some(node) = self.get(*k) {
                    world *= node.transform.to_matrix();
                    resolved.insert(*k, world);
                }
            }
        }
        Ok(resolved)
    }
}
