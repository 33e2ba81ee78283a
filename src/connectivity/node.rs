//! Connectivity graph vertices and the arena that owns them
//!
//! Nodes are addressed by generation-tagged ids. A released slot is reused
//! with a bumped generation, so an id kept past its node's removal resolves
//! to `None` instead of to whatever node took the slot.

use serde::Serialize;

use super::types::{ItemKind, ItemRef};
use crate::geometry::BBox;

/// Stable handle of a node in a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// One graph vertex: a pad, track, via or a single zone subpolygon
#[derive(Clone, Debug)]
pub struct ConnectivityNode {
    parent: ItemRef,
    kind: ItemKind,
    subpolygon: Option<usize>,
    bbox: Option<BBox>,
    can_change_net: bool,
    adjacency: Vec<NodeId>,
    visited: bool,
    valid: bool,
}

impl ConnectivityNode {
    pub fn new(parent: ItemRef, kind: ItemKind) -> Self {
        Self {
            parent,
            kind,
            subpolygon: None,
            bbox: None,
            can_change_net: kind.can_change_net(),
            adjacency: Vec::new(),
            visited: false,
            valid: true,
        }
    }

    /// Node for subpolygon `index` of a zone's filled result
    pub fn zone(parent: ItemRef, index: usize, bbox: Option<BBox>) -> Self {
        Self {
            subpolygon: Some(index),
            bbox,
            ..Self::new(parent, ItemKind::Zone)
        }
    }

    pub fn parent(&self) -> ItemRef {
        self.parent
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn subpolygon(&self) -> Option<usize> {
        self.subpolygon
    }

    /// Bounding box of a zone subpolygon at the time it was added
    pub fn bbox(&self) -> Option<&BBox> {
        self.bbox.as_ref()
    }

    pub fn can_change_net(&self) -> bool {
        self.can_change_net
    }

    pub fn adjacency(&self) -> &[NodeId] {
        &self.adjacency
    }

    pub fn clear_connections(&mut self) {
        self.adjacency.clear();
    }

    pub fn visited(&self) -> bool {
        self.visited
    }

    pub fn set_visited(&mut self, visited: bool) {
        self.visited = visited;
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<ConnectivityNode>,
}

/// Flat owner of every node of one connectivity algorithm
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: ConnectivityNode) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            return NodeId { index, generation: slot.generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, node: Some(node) });
        NodeId { index, generation: 0 }
    }

    /// Drop a node and make its slot reusable
    pub fn release(&mut self, id: NodeId) -> Option<ConnectivityNode> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }

        let node = slot.node.take();
        if node.is_some() {
            self.free.push(id.index);
        }
        node
    }

    pub fn get(&self, id: NodeId) -> Option<&ConnectivityNode> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ConnectivityNode> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Live and not invalidated
    pub fn is_valid(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.valid())
    }

    /// Add a symmetric edge. Not idempotent: connecting a pair twice
    /// stores the edge twice.
    pub fn connect(&mut self, a: NodeId, b: NodeId) {
        if self.get(a).is_none() || self.get(b).is_none() {
            return;
        }

        if let Some(node) = self.get_mut(a) {
            node.adjacency.push(b);
        }
        if let Some(node) = self.get_mut(b) {
            node.adjacency.push(a);
        }
    }

    /// Number of slots ever allocated, live or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
