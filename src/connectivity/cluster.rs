//! Clusters: maximal sets of electrically connected nodes

use super::node::{ConnectivityNode, NodeArena, NodeId};
use super::types::{ItemKind, ItemRef, NetCode};

/// One connected copper island found by a clustering pass
#[derive(Clone, Debug, Default)]
pub struct Cluster {
    items: Vec<NodeId>,
    origin_net: Option<NetCode>,
    origin_pad: Option<NodeId>,
    origin_net_name: Option<String>,
    pad_nets: Vec<NetCode>,
    conflicting: bool,
}

impl Cluster {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(64),
            ..Self::default()
        }
    }

    /// Fold one member into the cluster. The first pad fixes the origin
    /// net; any later pad on another net marks the cluster conflicting.
    /// Until a pad shows up, the first member's net stands in as a
    /// provisional origin so padless copper can still be grouped by net.
    pub fn add(&mut self, id: NodeId, node: &ConnectivityNode, net: NetCode) {
        self.items.push(id);

        if node.kind() != ItemKind::Pad {
            if self.origin_net.is_none() {
                self.origin_net = Some(net);
            }
            return;
        }

        if let Err(pos) = self.pad_nets.binary_search(&net) {
            self.pad_nets.insert(pos, net);
        }

        if self.origin_pad.is_none() {
            self.origin_pad = Some(id);
            self.origin_net = Some(net);
        } else if self.origin_net != Some(net) {
            self.conflicting = true;
        }
    }

    pub fn set_origin_net_name(&mut self, name: String) {
        self.origin_net_name = Some(name);
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn origin_net(&self) -> Option<NetCode> {
        self.origin_net
    }

    pub fn origin_pad(&self) -> Option<NodeId> {
        self.origin_pad
    }

    pub fn origin_net_name(&self) -> &str {
        match (&self.origin_pad, &self.origin_net_name) {
            (Some(_), Some(name)) => name,
            _ => "<none>",
        }
    }

    /// Distinct nets of the member pads, ascending
    pub fn pad_nets(&self) -> &[NetCode] {
        &self.pad_nets
    }

    /// The origin net was established by a pad rather than provisionally
    pub fn has_valid_net(&self) -> bool {
        self.origin_pad.is_some() && self.origin_net.is_some()
    }

    /// No pad reachable: dead or undriven copper
    pub fn is_orphaned(&self) -> bool {
        self.origin_pad.is_none()
    }

    /// Pads of different nets are joined: a short
    pub fn is_conflicting(&self) -> bool {
        self.conflicting
    }

    /// Origin pad, or the first member for a padless cluster
    pub fn representative(&self) -> Option<NodeId> {
        self.origin_pad.or_else(|| self.items.first().copied())
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.items.contains(&id)
    }

    pub fn contains_item(&self, item: ItemRef, arena: &NodeArena) -> bool {
        self.items
            .iter()
            .any(|id| arena.get(*id).is_some_and(|n| n.parent() == item))
    }
}
