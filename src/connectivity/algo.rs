//! Connectivity algorithm: item bookkeeping and the public operations
//!
//! Every public operation reruns connection search and clustering from
//! scratch, so results always reflect the latest `add`/`remove` calls.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, trace, warn};

use super::cluster::Cluster;
use super::clustering::search_clusters;
use super::item::{BoardAccess, ConnectedItem};
use super::lists::ItemLists;
use super::node::{ConnectivityNode, NodeArena, NodeId};
use super::search::search_connections;
use super::types::{
    ConnectivitySettings, DisjointNetEntry, ItemKind, ItemRef, NetCode, NetConflict,
    PropagationReport,
};
use crate::error::{ConnectivityError, Result};
use crate::geometry::{Outline, Point};

/// Connectivity state for one board
#[derive(Clone, Debug, Default)]
pub struct ConnectivityAlgo {
    settings: ConnectivitySettings,
    arena: NodeArena,
    lists: ItemLists,
    clusters: Vec<Cluster>,
}

impl ConnectivityAlgo {
    pub fn new(settings: ConnectivitySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &ConnectivitySettings {
        &self.settings
    }

    /// Start tracking an item; a footprint adds all of its pads.
    /// Returns the nodes created.
    pub fn add<B: BoardAccess + ?Sized>(&mut self, board: &B, item: ItemRef) -> Result<Vec<NodeId>> {
        if let Some(pads) = board.footprint_pads(item) {
            let mut added = Vec::new();
            for pad in pads {
                added.extend(self.add_item(board, pad)?);
            }
            return Ok(added);
        }

        self.add_item(board, item)
    }

    fn add_item<B: BoardAccess + ?Sized>(&mut self, board: &B, item: ItemRef) -> Result<Vec<NodeId>> {
        let obj = board.item(item).ok_or(ConnectivityError::UnknownItem(item))?;
        let nodes = self.lists.get_mut(obj.kind()).add(&mut self.arena, item, obj);
        Ok(nodes)
    }

    /// Stop tracking an item; a footprint removes all of its pads.
    /// Nodes are invalidated now and purged by the next search.
    pub fn remove<B: BoardAccess + ?Sized>(&mut self, board: &B, item: ItemRef) -> bool {
        if let Some(pads) = board.footprint_pads(item) {
            let mut removed = false;
            for pad in pads {
                removed |= self.lists.remove(&mut self.arena, pad);
            }
            return removed;
        }

        self.lists.remove(&mut self.arena, item)
    }

    /// Track every connected item of a board
    pub fn set_board<B: BoardAccess + ?Sized>(&mut self, board: &B) -> Result<usize> {
        let mut count = 0;
        for item in board.connected_items() {
            count += self.add(board, item)?.len();
        }

        debug!(
            "[CN] set-board: zones: {}, pads: {}, vias: {}, tracks: {}",
            self.lists.zones.len(),
            self.lists.pads.len(),
            self.lists.vias.len(),
            self.lists.tracks.len()
        );

        Ok(count)
    }

    pub fn node(&self, id: NodeId) -> Option<&ConnectivityNode> {
        self.arena.get(id)
    }

    pub fn nodes_of(&self, item: ItemRef) -> Vec<NodeId> {
        self.lists
            .iter()
            .flat_map(|list| list.nodes_of(item).iter().copied())
            .collect()
    }

    /// Valid nodes of the lists a pass with `include_zones` would cover
    pub fn valid_nodes(&self, include_zones: bool) -> Vec<NodeId> {
        self.lists
            .iter()
            .filter(|list| include_zones || list.kind() != ItemKind::Zone)
            .flat_map(|list| list.items().iter().copied())
            .filter(|id| self.arena.is_valid(*id))
            .collect()
    }

    /// Clusters of the most recent clustering pass
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Board items owning the members of `cluster`, deduplicated, in member order
    pub fn cluster_items(&self, cluster: &Cluster) -> Vec<ItemRef> {
        let mut items: Vec<ItemRef> = Vec::with_capacity(cluster.size());
        for id in cluster.items() {
            if let Some(node) = self.arena.get(*id) {
                if !items.contains(&node.parent()) {
                    items.push(node.parent());
                }
            }
        }
        items
    }

    pub fn search_connections<B: BoardAccess + ?Sized>(&mut self, board: &B, include_zones: bool) -> usize {
        search_connections(&mut self.arena, &mut self.lists, board, include_zones, &self.settings)
    }

    pub fn search_clusters<B: BoardAccess + ?Sized>(&mut self, board: &B, include_zones: bool) -> &[Cluster] {
        self.clusters = search_clusters(&mut self.arena, &self.lists, board, include_zones);
        &self.clusters
    }

    fn rebuild<B: BoardAccess + ?Sized>(&mut self, board: &B, include_zones: bool) {
        self.search_connections(board, include_zones);
        self.search_clusters(board, include_zones);
    }

    /// Give every track and via the net of the pads it is connected to.
    ///
    /// Conflicting clusters are reported and left untouched, orphaned ones
    /// are skipped. Pads and zones are never written.
    pub fn propagate_nets<B: BoardAccess + ?Sized>(&mut self, board: &mut B) -> PropagationReport {
        let start = Instant::now();
        self.rebuild(&*board, false);

        let mut report = PropagationReport::default();
        let mut writes: Vec<(ItemRef, NetCode)> = Vec::new();

        for (index, cluster) in self.clusters.iter().enumerate() {
            if cluster.is_conflicting() {
                warn!(
                    "[CN] Conflicting nets {:?} in cluster {} ({} items)",
                    cluster.pad_nets(),
                    index,
                    cluster.size()
                );
                report.conflicts.push(NetConflict {
                    nets: cluster.pad_nets().to_vec(),
                    items: self.cluster_items(cluster),
                });
            } else if cluster.is_orphaned() {
                trace!("[CN] Skipping orphaned cluster {} [net: {}]", index, cluster.origin_net_name());
                report.orphaned_clusters += 1;
            } else if let Some(net) = cluster.origin_net().filter(|_| cluster.has_valid_net()) {
                let before = writes.len();

                for id in cluster.items() {
                    if let Some(node) = self.arena.get(*id).filter(|n| n.can_change_net()) {
                        writes.push((node.parent(), net));
                    }
                }

                if writes.len() > before {
                    trace!("[CN] Cluster {} : net : {} {}", index, net, cluster.origin_net_name());
                } else {
                    trace!("[CN] Cluster {} : nothing to propagate", index);
                }
            }
        }

        for (item, net) in writes {
            if board.set_net_code(item, net) {
                report.updated_items += 1;
            }
        }

        debug!(
            "[CN] propagate-nets: {} items updated, {} conflicts, {} orphaned clusters in {:?}",
            report.updated_items,
            report.conflicts.len(),
            report.orphaned_clusters,
            start.elapsed()
        );

        report
    }

    /// Indices of the filled subpolygons of `zone` that no pad reaches,
    /// ascending. An unfilled zone yields no islands.
    pub fn find_isolated_copper_islands<B: BoardAccess + ?Sized>(
        &mut self,
        board: &B,
        zone: ItemRef,
    ) -> Result<Vec<usize>> {
        let obj = board.item(zone).ok_or(ConnectivityError::UnknownItem(zone))?;
        if obj.kind() != ItemKind::Zone {
            return Err(ConnectivityError::NotAZone { item: zone, kind: obj.kind() });
        }
        if obj.filled_polygons().is_empty() {
            return Ok(Vec::new());
        }

        // Refresh the zone's subpolygon nodes from its current fill
        self.lists.zones.remove(&mut self.arena, zone);
        self.lists.zones.add(&mut self.arena, zone, obj);

        self.rebuild(board, true);

        let mut islands = Vec::new();
        for cluster in &self.clusters {
            if !cluster.is_orphaned() || !cluster.contains_item(zone, &self.arena) {
                continue;
            }

            for id in cluster.items() {
                if let Some(node) = self.arena.get(*id).filter(|n| n.parent() == zone) {
                    islands.extend(node.subpolygon());
                }
            }
        }
        islands.sort_unstable();

        debug!("[CN] Found {} isolated islands in zone {}", islands.len(), zone);
        Ok(islands)
    }

    /// Report every net whose copper is split over more than one cluster.
    /// Read-only: nothing on the board is modified.
    pub fn check_connectivity<B: BoardAccess + ?Sized>(&mut self, board: &B) -> Vec<DisjointNetEntry> {
        self.rebuild(board, true);

        let mut report = Vec::new();

        for (net, group) in self.clusters_by_net() {
            if group.len() < 2 {
                continue;
            }

            let net_name = board.net_name(net);
            warn!(
                "[CN] Net {} [{}] is not completely routed ({} disjoint clusters)",
                net,
                net_name,
                group.len()
            );

            let reps: Vec<(ItemRef, Point)> = group
                .iter()
                .filter_map(|cluster| {
                    let node = self.arena.get(cluster.representative()?)?;
                    let pos = board.item(node.parent()).map(|i| node_anchor(node, i)).unwrap_or_default();
                    Some((node.parent(), pos))
                })
                .collect();

            for pair in reps.windows(2) {
                report.push(DisjointNetEntry {
                    net,
                    net_name: net_name.clone(),
                    item_a: pair[0].0,
                    item_b: pair[1].0,
                    anchor_a: pair[0].1,
                    anchor_b: pair[1].1,
                });
            }
        }

        report
    }

    /// Number of extra clusters over all nets > 0: zero on a fully routed board
    pub fn unconnected_count<B: BoardAccess + ?Sized>(&mut self, board: &B) -> usize {
        self.rebuild(board, true);

        let count = self
            .clusters_by_net()
            .values()
            .map(|group| group.len().saturating_sub(1))
            .sum();

        debug!("[CN] unconnected: {}", count);
        count
    }

    /// Clusters of the last pass grouped by origin net, skipping net 0
    fn clusters_by_net(&self) -> BTreeMap<NetCode, Vec<&Cluster>> {
        let mut groups: BTreeMap<NetCode, Vec<&Cluster>> = BTreeMap::new();
        for cluster in &self.clusters {
            if let Some(net) = cluster.origin_net().filter(|&n| n > 0) {
                groups.entry(net).or_default().push(cluster);
            }
        }
        groups
    }
}

/// Where a report should point for `node`: its own subpolygon for a zone
fn node_anchor(node: &ConnectivityNode, item: &dyn ConnectedItem) -> Point {
    node.subpolygon()
        .and_then(|index| item.filled_polygons().get(index))
        .and_then(Outline::anchor)
        .unwrap_or_else(|| item.position())
}
