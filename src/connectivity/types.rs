//! Connectivity data types
//!
//! Ids, item kinds, settings and the report records handed back to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Point;

/// Net code as assigned by the board; 0 is the "no net" net
pub type NetCode = u32;

/// Opaque id of an externally owned board item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(pub u64);

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a connected board item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Pad,
    Track,
    Via,
    Zone,
}

impl ItemKind {
    /// Pads and zones carry an authoritative net; tracks and vias inherit one
    pub fn can_change_net(self) -> bool {
        matches!(self, ItemKind::Track | ItemKind::Via)
    }
}

/// Tunables for connection detection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivitySettings {
    /// Extra reach for neighbour queries and the track-to-track threshold, in internal units
    pub connection_tolerance: i64,
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        Self {
            connection_tolerance: 0,
        }
    }
}

/// A net whose copper is split into more than one cluster
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisjointNetEntry {
    pub net: NetCode,
    pub net_name: String,
    /// Origin pad of one cluster
    pub item_a: ItemRef,
    /// Origin pad of the next cluster of the same net
    pub item_b: ItemRef,
    pub anchor_a: Point,
    pub anchor_b: Point,
}

/// A cluster whose pads disagree on their net
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetConflict {
    /// Distinct pad nets found in the cluster, ascending
    pub nets: Vec<NetCode>,
    pub items: Vec<ItemRef>,
}

/// Outcome of a net propagation run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PropagationReport {
    /// Number of track/via items whose net code was written
    pub updated_items: usize,
    pub conflicts: Vec<NetConflict>,
    pub orphaned_clusters: usize,
}
