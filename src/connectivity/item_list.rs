//! Per-kind item lists with anchor-based proximity search
//!
//! Each list keeps its anchors sorted by (x, y) so that a neighbourhood query
//! is a binary search on x followed by a short linear scan. Sorting is lazy:
//! any add or remove marks the list dirty and the next point query re-sorts.

use indexmap::IndexMap;
use rstar::Envelope;

use super::item::ConnectedItem;
use super::node::{ConnectivityNode, NodeArena, NodeId};
use super::types::{ItemKind, ItemRef};
use crate::geometry::{BBox, Point};

/// A point sample owned by a node; tracks contribute two
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pos: Point,
    node: NodeId,
}

impl Anchor {
    pub fn new(pos: Point, node: NodeId) -> Self {
        Self { pos, node }
    }

    pub fn pos(&self) -> Point {
        self.pos
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Owns the nodes of one item kind and their anchors
#[derive(Clone, Debug)]
pub struct SpatialItemList {
    kind: ItemKind,
    items: Vec<NodeId>,
    item_map: IndexMap<ItemRef, Vec<NodeId>>,
    anchors: Vec<Anchor>,
    dirty: bool,
    max_half_width: i64,
}

impl SpatialItemList {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            item_map: IndexMap::new(),
            anchors: Vec::new(),
            dirty: false,
            max_half_width: 0,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Node ids in insertion order, including invalidated ones not yet purged
    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Largest half width (track) or radius (via) ever added to this list
    pub fn max_half_width(&self) -> i64 {
        self.max_half_width
    }

    pub fn contains_item(&self, item: ItemRef) -> bool {
        self.item_map.contains_key(&item)
    }

    pub fn nodes_of(&self, item: ItemRef) -> &[NodeId] {
        self.item_map.get(&item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Build the node(s) for `item` and register their anchors.
    ///
    /// Pads and vias get one node with one anchor, tracks one node with an
    /// anchor per endpoint, zones one node per filled subpolygon.
    pub fn add(
        &mut self,
        arena: &mut NodeArena,
        item_ref: ItemRef,
        item: &dyn ConnectedItem,
    ) -> Vec<NodeId> {
        let mut added = Vec::new();

        match item.kind() {
            ItemKind::Pad => {
                let id = arena.insert(ConnectivityNode::new(item_ref, ItemKind::Pad));
                self.anchors.push(Anchor::new(item.position(), id));
                added.push(id);
            }
            ItemKind::Track => {
                let id = arena.insert(ConnectivityNode::new(item_ref, ItemKind::Track));
                self.anchors.push(Anchor::new(item.position(), id));
                self.anchors.push(Anchor::new(item.end(), id));
                self.max_half_width = self.max_half_width.max(item.width() / 2);
                added.push(id);
            }
            ItemKind::Via => {
                let id = arena.insert(ConnectivityNode::new(item_ref, ItemKind::Via));
                self.anchors.push(Anchor::new(item.position(), id));
                self.max_half_width = self.max_half_width.max(item.width() / 2);
                added.push(id);
            }
            ItemKind::Zone => {
                for (index, outline) in item.filled_polygons().iter().enumerate() {
                    let id = arena.insert(ConnectivityNode::zone(item_ref, index, outline.bbox()));
                    if let Some(pos) = outline.anchor() {
                        self.anchors.push(Anchor::new(pos, id));
                    }
                    added.push(id);
                }
            }
        }

        self.items.extend_from_slice(&added);
        self.item_map.entry(item_ref).or_default().extend_from_slice(&added);
        self.dirty = true;
        added
    }

    /// Invalidate every node of `item` and drop their anchors.
    ///
    /// The nodes stay in the arena until [`remove_invalid`](Self::remove_invalid)
    /// so ids held elsewhere do not dangle mid-pass.
    pub fn remove(&mut self, arena: &mut NodeArena, item: ItemRef) -> bool {
        let Some(nodes) = self.item_map.shift_remove(&item) else {
            return false;
        };

        for id in &nodes {
            if let Some(node) = arena.get_mut(*id) {
                node.invalidate();
            }
        }

        self.anchors.retain(|a| !nodes.contains(&a.node));
        self.dirty = true;
        true
    }

    /// Physically drop invalidated nodes; returns how many were purged
    pub fn remove_invalid(&mut self, arena: &mut NodeArena) -> usize {
        let before = self.items.len();

        self.items.retain(|id| {
            if arena.is_valid(*id) {
                true
            } else {
                arena.release(*id);
                false
            }
        });

        let purged = before - self.items.len();
        if purged > 0 {
            self.anchors.retain(|a| arena.is_valid(a.node));
            self.dirty = true;
        }
        purged
    }

    /// Sort anchors by (x, y) if anything changed since the last sort
    pub fn ensure_sorted(&mut self) {
        if self.dirty {
            self.anchors.sort_by_key(|a| (a.pos.x, a.pos.y));
            self.dirty = false;
        }
    }

    /// Visit every anchor within a `max_dist` box (Chebyshev distance) of
    /// `point`. The box is only a pre-filter; shape tests must re-check.
    pub fn find_nearby<F>(&mut self, point: Point, max_dist: i64, visit: F)
    where
        F: FnMut(&Anchor),
    {
        self.ensure_sorted();
        self.find_nearby_sorted(point, max_dist, visit);
    }

    /// Same as [`find_nearby`](Self::find_nearby) for a list already sorted
    /// with [`ensure_sorted`](Self::ensure_sorted)
    pub fn find_nearby_sorted<F>(&self, point: Point, max_dist: i64, mut visit: F)
    where
        F: FnMut(&Anchor),
    {
        debug_assert!(!self.dirty, "anchor list queried while unsorted");

        let Some(entry) = self.entry_point(point, max_dist) else {
            return;
        };

        // Scan forward from the entry point
        for anchor in &self.anchors[entry..] {
            let dx = anchor.pos.x - point.x;
            let dy = anchor.pos.y - point.y;

            if dx.abs() > max_dist {
                break;
            }
            if dy.abs() > max_dist {
                continue;
            }
            visit(anchor);
        }

        // Then backward
        for anchor in self.anchors[..entry].iter().rev() {
            let dx = anchor.pos.x - point.x;
            let dy = anchor.pos.y - point.y;

            if dx.abs() > max_dist {
                break;
            }
            if dy.abs() > max_dist {
                continue;
            }
            visit(anchor);
        }
    }

    /// Binary search for any anchor whose x is within `max_dist` of `point.x`.
    /// Stops at the first hit without resolving y order.
    fn entry_point(&self, point: Point, max_dist: i64) -> Option<usize> {
        let mut lo = 0usize;
        let mut hi = self.anchors.len();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let dx = self.anchors[mid].pos.x - point.x;

            if dx.abs() <= max_dist {
                return Some(mid);
            } else if dx < 0 {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        None
    }

    /// Visit every anchor inside `bbox`; a plain linear scan
    pub fn find_nearby_bbox<F>(&self, bbox: &BBox, mut visit: F)
    where
        F: FnMut(&Anchor),
    {
        for anchor in &self.anchors {
            if bbox.contains_point(&anchor.pos.to_array()) {
                visit(anchor);
            }
        }
    }

    /// Visit every anchor regardless of position
    pub fn for_each_anchor<F>(&self, visit: F)
    where
        F: FnMut(&Anchor),
    {
        self.anchors.iter().for_each(visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LayerSet, Outline};
    use crate::connectivity::types::NetCode;

    struct TestVia {
        pos: Point,
    }

    impl ConnectedItem for TestVia {
        fn kind(&self) -> ItemKind {
            ItemKind::Via
        }
        fn layer_set(&self) -> LayerSet {
            LayerSet::single(0)
        }
        fn net_code(&self) -> NetCode {
            0
        }
        fn position(&self) -> Point {
            self.pos
        }
        fn width(&self) -> i64 {
            4
        }
        fn bounding_radius(&self) -> i64 {
            2
        }
        fn hit_test(&self, _point: Point) -> bool {
            false
        }
    }

    struct TestZone {
        filled: Vec<Outline>,
    }

    impl ConnectedItem for TestZone {
        fn kind(&self) -> ItemKind {
            ItemKind::Zone
        }
        fn layer_set(&self) -> LayerSet {
            LayerSet::single(0)
        }
        fn net_code(&self) -> NetCode {
            1
        }
        fn position(&self) -> Point {
            Point::default()
        }
        fn bounding_radius(&self) -> i64 {
            0
        }
        fn hit_test(&self, _point: Point) -> bool {
            false
        }
        fn filled_polygons(&self) -> &[Outline] {
            &self.filled
        }
    }

    fn via_list(points: &[(i64, i64)]) -> (SpatialItemList, NodeArena) {
        let mut arena = NodeArena::new();
        let mut list = SpatialItemList::new(ItemKind::Via);
        for (i, &(x, y)) in points.iter().enumerate() {
            let via = TestVia { pos: Point::new(x, y) };
            list.add(&mut arena, ItemRef(i as u64), &via);
        }
        (list, arena)
    }

    fn nearby(list: &mut SpatialItemList, point: Point, max_dist: i64) -> Vec<Point> {
        let mut found = Vec::new();
        list.find_nearby(point, max_dist, |a| found.push(a.pos()));
        found.sort_by_key(|p| (p.x, p.y));
        found
    }

    #[test]
    fn test_find_nearby_box_filter() {
        let (mut list, _) = via_list(&[(0, 0), (5, 5), (5, 50), (-5, 3), (20, 0), (6, -6)]);

        assert!(list.is_dirty());
        let found = nearby(&mut list, Point::new(0, 0), 5);
        assert!(!list.is_dirty());

        assert_eq!(
            found,
            vec![Point::new(-5, 3), Point::new(0, 0), Point::new(5, 5)]
        );
    }

    #[test]
    fn test_find_nearby_is_rectilinear() {
        // (3, 3) is 4.24 away: inside the box even though a circle of radius 3 misses it
        let (mut list, _) = via_list(&[(3, 3)]);
        assert_eq!(nearby(&mut list, Point::new(0, 0), 3), vec![Point::new(3, 3)]);
    }

    #[test]
    fn test_find_nearby_empty_and_miss() {
        let (mut list, _) = via_list(&[]);
        assert!(nearby(&mut list, Point::new(0, 0), 100).is_empty());

        let (mut list, _) = via_list(&[(100, 0), (200, 0)]);
        assert!(nearby(&mut list, Point::new(150, 0), 10).is_empty());
    }

    #[test]
    fn test_find_nearby_many_equal_x() {
        let points: Vec<(i64, i64)> = (0..50).map(|i| (10, i * 10)).collect();
        let (mut list, _) = via_list(&points);

        let found = nearby(&mut list, Point::new(12, 250), 15);
        assert_eq!(found, vec![Point::new(10, 240), Point::new(10, 250), Point::new(10, 260)]);
    }

    #[test]
    fn test_remove_drops_anchors_and_purges_later() {
        let (mut list, mut arena) = via_list(&[(0, 0), (1, 1)]);
        let removed = list.nodes_of(ItemRef(0))[0];

        assert!(list.remove(&mut arena, ItemRef(0)));
        assert!(!list.remove(&mut arena, ItemRef(0)));
        assert!(list.is_dirty());
        assert_eq!(list.anchors().len(), 1);

        // Still in the list and arena, but invalid
        assert_eq!(list.len(), 2);
        assert!(arena.get(removed).is_some_and(|n| !n.valid()));

        assert_eq!(list.remove_invalid(&mut arena), 1);
        assert_eq!(list.len(), 1);
        assert!(arena.get(removed).is_none());
    }

    #[test]
    fn test_zone_gets_node_per_subpolygon() {
        let square = |x: i64| {
            Outline::new(vec![
                Point::new(x, 0),
                Point::new(x + 10, 0),
                Point::new(x + 10, 10),
                Point::new(x, 10),
            ])
        };
        let zone = TestZone {
            filled: vec![square(0), Outline::default(), square(100)],
        };

        let mut arena = NodeArena::new();
        let mut list = SpatialItemList::new(ItemKind::Zone);
        let nodes = list.add(&mut arena, ItemRef(7), &zone);

        assert_eq!(nodes.len(), 3);
        // The empty subpolygon has no anchor
        assert_eq!(list.anchors().len(), 2);
        assert_eq!(arena.get(nodes[2]).unwrap().subpolygon(), Some(2));
        assert!(arena.get(nodes[1]).unwrap().bbox().is_none());

        let bbox = BBox::from_corners([-1, -1], [11, 11]);
        let mut hits = Vec::new();
        list.find_nearby_bbox(&bbox, |a| hits.push(a.node()));
        assert_eq!(hits, vec![nodes[0]]);
    }
}
