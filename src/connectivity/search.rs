//! Connection detection
//!
//! Populates node adjacency from geometry. Each reference node queries the
//! lists it can touch; every candidate anchor found by the box pre-filter is
//! then run through the rule for the reference kind:
//!
//! | reference | candidates        | rule                                        |
//! |-----------|-------------------|---------------------------------------------|
//! | pad, via  | pad, track, via   | candidate anchor hits the reference shape   |
//! | track     | track, via        | anchor closer to an endpoint than the half-width sum |
//! | zone      | pad, track, via   | same net and anchor inside the subpolygon   |
//! | zone      | zone              | same net and either outline reaches into the other |
//!
//! Pairs from the same parent item or on disjoint layers are rejected first.

use std::time::Instant;

use rstar::Envelope;
use tracing::debug;

use super::item::{BoardAccess, ConnectedItem};
use super::item_list::{Anchor, SpatialItemList};
use super::lists::ItemLists;
use super::node::{ConnectivityNode, NodeArena, NodeId};
use super::types::{ConnectivitySettings, ItemKind};
use crate::geometry::{point_distance, Outline};

/// Rebuild the adjacency of every valid node; returns the number of edges found
pub fn search_connections<B: BoardAccess + ?Sized>(
    arena: &mut NodeArena,
    lists: &mut ItemLists,
    board: &B,
    include_zones: bool,
    settings: &ConnectivitySettings,
) -> usize {
    let start = Instant::now();

    let purged = lists.remove_invalid(arena);

    for list in lists.iter() {
        for &id in list.items() {
            if let Some(node) = arena.get_mut(id) {
                node.clear_connections();
            }
        }
    }

    lists.ensure_sorted();

    let tolerance = settings.connection_tolerance;
    let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
    let search = Search { arena: &*arena, board, tolerance };

    for &ref_id in lists.pads.items() {
        search.from_pad_or_via(ref_id, [&lists.pads, &lists.tracks, &lists.vias], &mut edges);
    }

    for &ref_id in lists.tracks.items() {
        search.from_track(ref_id, [&lists.tracks, &lists.vias], &mut edges);
    }

    for &ref_id in lists.vias.items() {
        search.from_pad_or_via(ref_id, [&lists.pads, &lists.tracks, &lists.vias], &mut edges);
    }

    if include_zones {
        for &ref_id in lists.zones.items() {
            search.from_zone(ref_id, [&lists.pads, &lists.tracks, &lists.vias], &lists.zones, &mut edges);
        }
    }

    for &(a, b) in &edges {
        arena.connect(a, b);
    }

    debug!(
        "[CN] search-connections: {} nodes ({} purged), {} connections, zones: {} in {:?}",
        lists.iter().map(SpatialItemList::len).sum::<usize>(),
        purged,
        edges.len(),
        include_zones,
        start.elapsed()
    );

    edges.len()
}

struct Search<'a, B: ?Sized> {
    arena: &'a NodeArena,
    board: &'a B,
    tolerance: i64,
}

impl<'a, B: BoardAccess + ?Sized> Search<'a, B> {
    /// Live node and the board item behind it
    fn resolve(&self, id: NodeId) -> Option<(&'a ConnectivityNode, &'a dyn ConnectedItem)> {
        let node = self.arena.get(id).filter(|n| n.valid())?;
        let item = self.board.item(node.parent())?;
        Some((node, item))
    }

    fn from_pad_or_via(
        &self,
        ref_id: NodeId,
        candidates: [&SpatialItemList; 3],
        edges: &mut Vec<(NodeId, NodeId)>,
    ) {
        let Some((reference, ref_item)) = self.resolve(ref_id) else {
            return;
        };

        let center = ref_item.position();
        let radius = ref_item.bounding_radius() + self.tolerance;

        for list in candidates {
            list.find_nearby_sorted(center, radius, |anchor| {
                let Some((candidate, cand_item)) = self.resolve(anchor.node()) else {
                    return;
                };

                if !pre_filter(reference, ref_item, candidate, cand_item) {
                    return;
                }

                if ref_item.hit_test(anchor.pos()) {
                    edges.push((ref_id, anchor.node()));
                }
            });
        }
    }

    fn from_track(
        &self,
        ref_id: NodeId,
        candidates: [&SpatialItemList; 2],
        edges: &mut Vec<(NodeId, NodeId)>,
    ) {
        let Some((reference, ref_item)) = self.resolve(ref_id) else {
            return;
        };

        if is_zero_length(ref_item) {
            return;
        }

        for list in candidates {
            let reach = ref_item.width() / 2 + list.max_half_width() + self.tolerance + 1;

            // One query per endpoint; an anchor near both is only tested once
            let mut seen: Vec<Anchor> = Vec::new();
            for endpoint in [ref_item.position(), ref_item.end()] {
                list.find_nearby_sorted(endpoint, reach, |anchor| {
                    if !seen.contains(anchor) {
                        seen.push(*anchor);
                    }
                });
            }

            for anchor in &seen {
                let Some((candidate, cand_item)) = self.resolve(anchor.node()) else {
                    continue;
                };

                if !pre_filter(reference, ref_item, candidate, cand_item) {
                    continue;
                }

                if track_endpoint_touches(ref_item, cand_item, anchor, self.tolerance) {
                    edges.push((ref_id, anchor.node()));
                }
            }
        }
    }

    fn from_zone(
        &self,
        ref_id: NodeId,
        candidates: [&SpatialItemList; 3],
        zones: &SpatialItemList,
        edges: &mut Vec<(NodeId, NodeId)>,
    ) {
        let Some((reference, ref_item)) = self.resolve(ref_id) else {
            return;
        };
        let Some(outline) = subpolygon(reference, ref_item) else {
            return;
        };
        let Some(bbox) = reference.bbox() else {
            return;
        };

        for list in candidates {
            list.find_nearby_bbox(bbox, |anchor| {
                let Some((candidate, cand_item)) = self.resolve(anchor.node()) else {
                    return;
                };

                if !pre_filter(reference, ref_item, candidate, cand_item) {
                    return;
                }

                if cand_item.net_code() == ref_item.net_code() && outline.contains(anchor.pos()) {
                    edges.push((ref_id, anchor.node()));
                }
            });
        }

        zones.for_each_anchor(|anchor| {
            if anchor.node() == ref_id {
                return;
            }
            let Some((candidate, cand_item)) = self.resolve(anchor.node()) else {
                return;
            };
            if !candidate.bbox().is_some_and(|b| b.intersects(bbox)) {
                return;
            }

            if zones_touch(reference, ref_item, outline, candidate, cand_item, anchor) {
                edges.push((ref_id, anchor.node()));
            }
        });
    }
}

/// Cheap rejections shared by every non zone-to-zone rule
fn pre_filter(
    reference: &ConnectivityNode,
    ref_item: &dyn ConnectedItem,
    candidate: &ConnectivityNode,
    cand_item: &dyn ConnectedItem,
) -> bool {
    reference.parent() != candidate.parent()
        && ref_item.layer_set().intersects(&cand_item.layer_set())
}

fn is_zero_length(item: &dyn ConnectedItem) -> bool {
    item.kind() == ItemKind::Track && item.position() == item.end()
}

/// Track rule: the candidate anchor lies closer to one of the reference
/// endpoints than the two half widths (plus tolerance)
fn track_endpoint_touches(
    ref_item: &dyn ConnectedItem,
    cand_item: &dyn ConnectedItem,
    anchor: &Anchor,
    tolerance: i64,
) -> bool {
    if is_zero_length(cand_item) {
        return false;
    }

    let limit = (ref_item.width() + cand_item.width()) as f64 / 2.0 + tolerance as f64;
    let p = anchor.pos();

    point_distance(ref_item.position(), p) < limit || point_distance(ref_item.end(), p) < limit
}

fn subpolygon<'a>(node: &ConnectivityNode, item: &'a dyn ConnectedItem) -> Option<&'a Outline> {
    item.filled_polygons().get(node.subpolygon()?)
}

/// Zone-to-zone rule: same net, shared layer, and either the candidate's
/// anchor lies inside the reference or a reference vertex lies inside the
/// candidate. Subpolygons of the same zone are allowed to connect.
fn zones_touch(
    reference: &ConnectivityNode,
    ref_item: &dyn ConnectedItem,
    ref_outline: &Outline,
    candidate: &ConnectivityNode,
    cand_item: &dyn ConnectedItem,
    anchor: &Anchor,
) -> bool {
    if candidate.kind() != ItemKind::Zone {
        return false;
    }
    if reference.parent() == candidate.parent() && reference.subpolygon() == candidate.subpolygon() {
        return false;
    }
    if cand_item.net_code() != ref_item.net_code() {
        return false;
    }
    if !ref_item.layer_set().intersects(&cand_item.layer_set()) {
        return false;
    }

    if ref_outline.contains(anchor.pos()) {
        return true;
    }

    let Some(cand_outline) = subpolygon(candidate, cand_item) else {
        return false;
    };

    ref_outline.vertices().iter().any(|&v| cand_outline.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardItem, Pad, PadShape, Track, Zone};
    use crate::connectivity::types::ItemRef;
    use crate::geometry::{LayerSet, Point};

    fn track(id: u64, start: (i64, i64), end: (i64, i64), layer: u8) -> BoardItem {
        BoardItem::Track(Track {
            id: ItemRef(id),
            start: Point::new(start.0, start.1),
            end: Point::new(end.0, end.1),
            width: 2,
            layer,
            net: 0,
        })
    }

    fn square_zone(id: u64, x: i64, net: u32) -> BoardItem {
        BoardItem::Zone(Zone {
            id: ItemRef(id),
            name: String::new(),
            layers: LayerSet::single(0),
            net,
            filled: vec![Outline::new(vec![
                Point::new(x, 0),
                Point::new(x + 100, 0),
                Point::new(x + 100, 100),
                Point::new(x, 100),
            ])],
        })
    }

    fn edges_of(board: &Board, include_zones: bool) -> (NodeArena, ItemLists, usize) {
        let mut arena = NodeArena::new();
        let mut lists = ItemLists::new();
        for item in board.connected_items() {
            if let Some(obj) = board.item(item) {
                lists.get_mut(obj.kind()).add(&mut arena, item, obj);
            }
        }
        let edges = search_connections(&mut arena, &mut lists, board, include_zones, &ConnectivitySettings::default());
        (arena, lists, edges)
    }

    #[test]
    fn test_zero_length_track_never_connects() {
        let mut board = Board::new();
        board.insert(track(1, (0, 0), (10, 0), 0)).unwrap();
        board.insert(track(2, (10, 0), (10, 0), 0)).unwrap();

        let (_, _, edges) = edges_of(&board, false);
        assert_eq!(edges, 0);
    }

    #[test]
    fn test_tracks_on_other_layers_do_not_connect() {
        let mut board = Board::new();
        board.insert(track(1, (0, 0), (10, 0), 0)).unwrap();
        board.insert(track(2, (10, 0), (20, 0), 31)).unwrap();
        board.insert(track(3, (20, 0), (30, 0), 31)).unwrap();

        let (arena, lists, edges) = edges_of(&board, false);
        assert!(edges > 0);

        let t1 = lists.tracks.nodes_of(ItemRef(1))[0];
        assert!(arena.get(t1).is_some_and(|n| n.adjacency().is_empty()));
    }

    #[test]
    fn test_overlapping_zones_need_same_net() {
        let mut board = Board::new();
        board.insert(square_zone(1, 0, 1)).unwrap();
        board.insert(square_zone(2, 50, 2)).unwrap();

        let (_, _, edges) = edges_of(&board, true);
        assert_eq!(edges, 0);

        board.remove(ItemRef(2));
        board.insert(square_zone(2, 50, 1)).unwrap();
        let (arena, lists, edges) = edges_of(&board, true);
        assert!(edges > 0);

        let z1 = lists.zones.nodes_of(ItemRef(1))[0];
        let z2 = lists.zones.nodes_of(ItemRef(2))[0];
        assert!(arena.get(z1).is_some_and(|n| n.adjacency().contains(&z2)));
    }

    fn circle_pad(id: u64, x: i64, net: u32) -> BoardItem {
        BoardItem::Pad(Pad {
            id: ItemRef(id),
            position: Point::new(x, 0),
            shape: PadShape::Circle { diameter: 10 },
            rotation: 0.0,
            layers: LayerSet::single(0),
            net,
        })
    }

    #[test]
    fn test_pads_connect_only_through_centres() {
        // Copper overlaps between x=3 and x=5, but neither centre is inside the other pad
        let mut board = Board::new();
        board.insert(circle_pad(1, 0, 1)).unwrap();
        board.insert(circle_pad(2, 8, 2)).unwrap();

        let (_, _, edges) = edges_of(&board, false);
        assert_eq!(edges, 0);

        board.remove(ItemRef(2));
        board.insert(circle_pad(2, 4, 2)).unwrap();
        let (_, _, edges) = edges_of(&board, false);
        assert!(edges > 0);
    }
}
