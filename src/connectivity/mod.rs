//! Electrical connectivity engine
//!
//! Finds which pads, tracks, vias and filled zone subpolygons touch, groups
//! them into connected clusters, propagates pad nets onto tracks and vias,
//! finds isolated zone islands and reports nets split over several clusters.
//!
//! # Submodules
//! - `types` - Ids, item kinds, settings and report records
//! - `item` - Board boundary traits
//! - `node` - Graph vertices and their generation-tagged arena
//! - `item_list` - Anchors and per-kind spatial item lists
//! - `lists` - The four item lists of one algorithm
//! - `cluster` - Connected clusters and their origin net
//! - `search` - Connection detection rules
//! - `clustering` - Breadth-first cluster search
//! - `algo` - The algorithm and its public operations

mod types;
mod item;
mod node;
mod item_list;
mod lists;
mod cluster;
mod search;
mod clustering;
mod algo;

pub use types::{
    ConnectivitySettings, DisjointNetEntry, ItemKind, ItemRef, NetCode, NetConflict,
    PropagationReport,
};

pub use item::{BoardAccess, ConnectedItem};
pub use node::{ConnectivityNode, NodeArena, NodeId};
pub use item_list::{Anchor, SpatialItemList};
pub use lists::ItemLists;
pub use cluster::Cluster;
pub use algo::ConnectivityAlgo;
