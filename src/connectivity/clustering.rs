//! Cluster search
//!
//! Breadth-first search over node adjacency. Nodes waiting for a cluster sit
//! in a doubly linked pending list threaded through arena slot indices, so a
//! node discovered by the search is unlinked in O(1) and the next cluster
//! root is always the list head.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, trace};

use super::cluster::Cluster;
use super::item::BoardAccess;
use super::lists::ItemLists;
use super::node::{NodeArena, NodeId};

const NIL: usize = usize::MAX;

/// Intrusive free list of nodes not yet assigned to a cluster
struct PendingList {
    ids: Vec<Option<NodeId>>,
    prev: Vec<usize>,
    next: Vec<usize>,
    head: usize,
    tail: usize,
    len: usize,
}

impl PendingList {
    fn with_capacity(slots: usize) -> Self {
        Self {
            ids: vec![None; slots],
            prev: vec![NIL; slots],
            next: vec![NIL; slots],
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    fn contains(&self, id: NodeId) -> bool {
        self.ids.get(id.index()).is_some_and(|slot| *slot == Some(id))
    }

    fn push_back(&mut self, id: NodeId) {
        let i = id.index();
        if self.contains(id) {
            return;
        }

        self.ids[i] = Some(id);
        self.prev[i] = self.tail;
        self.next[i] = NIL;

        if self.tail == NIL {
            self.head = i;
        } else {
            self.next[self.tail] = i;
        }
        self.tail = i;
        self.len += 1;
    }

    /// Splice `id` out of the list; false if it was not linked
    fn unlink(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }

        let i = id.index();
        let (p, n) = (self.prev[i], self.next[i]);

        if p == NIL {
            self.head = n;
        } else {
            self.next[p] = n;
        }
        if n == NIL {
            self.tail = p;
        } else {
            self.prev[n] = p;
        }

        self.ids[i] = None;
        self.prev[i] = NIL;
        self.next[i] = NIL;
        self.len -= 1;
        true
    }

    fn pop_front(&mut self) -> Option<NodeId> {
        let id = self.ids.get(self.head).copied().flatten()?;
        self.unlink(id);
        Some(id)
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Partition every valid node (zones optional) into connected clusters,
/// sorted by origin net with padless-and-netless clusters first
pub fn search_clusters<B: BoardAccess + ?Sized>(
    arena: &mut NodeArena,
    lists: &ItemLists,
    board: &B,
    include_zones: bool,
) -> Vec<Cluster> {
    let start = Instant::now();
    let mut pending = PendingList::with_capacity(arena.capacity());

    let walked = [&lists.pads, &lists.tracks, &lists.vias, &lists.zones];
    let walked = if include_zones { &walked[..] } else { &walked[..3] };

    for list in walked {
        for &id in list.items() {
            if let Some(node) = arena.get_mut(id).filter(|n| n.valid()) {
                node.set_visited(false);
                pending.push_back(id);
            }
        }
    }

    let total = pending.len();
    let mut clusters = Vec::new();
    let mut queue = VecDeque::new();

    while let Some(root) = pending.pop_front() {
        let mut cluster = Cluster::new();

        if let Some(node) = arena.get_mut(root) {
            node.set_visited(true);
        }
        queue.clear();
        queue.push_back(root);

        while let Some(current) = queue.pop_front() {
            let Some(node) = arena.get(current) else {
                continue;
            };

            let net = board.item(node.parent()).map_or(0, |item| item.net_code());
            cluster.add(current, node, net);

            let neighbours = node.adjacency().to_vec();
            for n in neighbours {
                // Only nodes entered into this pass are eligible
                if !pending.contains(n) {
                    continue;
                }
                let Some(neighbour) = arena.get_mut(n) else {
                    continue;
                };
                if neighbour.visited() || !neighbour.valid() {
                    continue;
                }

                neighbour.set_visited(true);
                pending.unlink(n);
                queue.push_back(n);
            }
        }

        if let Some(net) = cluster.origin_net() {
            cluster.set_origin_net_name(board.net_name(net));
        }

        trace!(
            "[CN] cluster: {} items, net {:?} [{}], orphaned: {}, conflicting: {}",
            cluster.size(),
            cluster.origin_net(),
            cluster.origin_net_name(),
            cluster.is_orphaned(),
            cluster.is_conflicting()
        );

        clusters.push(cluster);
    }

    // Stable: equal nets keep discovery order
    clusters.sort_by_key(Cluster::origin_net);

    debug!(
        "[CN] search-clusters: {} nodes -> {} clusters, zones: {} in {:?}",
        total,
        clusters.len(),
        include_zones,
        start.elapsed()
    );

    clusters
}
