// Connectivity engine scenarios on JSON board fixtures
use pcb_connectivity::board::{Board, BoardItem, Pad, PadShape, Track, Zone};
use pcb_connectivity::connectivity::{BoardAccess, ConnectivityAlgo, ConnectivitySettings, ItemRef, NodeId};
use pcb_connectivity::geometry::{LayerSet, Outline, Point};
use pcb_connectivity::ConnectivityError;
use std::collections::BTreeSet;
use std::time::Instant;

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURES: &str = "tests/fixtures";

    fn load(name: &str) -> (Board, ConnectivityAlgo) {
        let path = format!("{}/{}", FIXTURES, name);
        let board = Board::load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {:?}", path, e));
        let mut algo = ConnectivityAlgo::new(board.settings().clone());
        algo.set_board(&board).expect("Failed to add board items");
        (board, algo)
    }

    fn rebuild(algo: &mut ConnectivityAlgo, board: &Board, include_zones: bool) {
        algo.search_connections(board, include_zones);
        algo.search_clusters(board, include_zones);
    }

    /// Member items of every cluster, in cluster order
    fn cluster_sets(algo: &ConnectivityAlgo) -> Vec<BTreeSet<ItemRef>> {
        algo.clusters()
            .iter()
            .map(|c| algo.cluster_items(c).into_iter().collect())
            .collect()
    }

    fn items(ids: &[u64]) -> BTreeSet<ItemRef> {
        ids.iter().map(|&i| ItemRef(i)).collect()
    }

    #[test]
    fn test_three_collinear_tracks() {
        let (board, mut algo) = load("three_tracks.json");
        rebuild(&mut algo, &board, true);

        assert_eq!(cluster_sets(&algo), vec![items(&[1, 2]), items(&[3])]);
        for id in algo.nodes_of(ItemRef(2)) {
            assert!(algo.clusters()[0].contains_node(id));
            assert!(!algo.clusters()[1].contains_node(id));
        }
        for cluster in algo.clusters() {
            assert_eq!(cluster.origin_net(), Some(5));
            assert!(cluster.is_orphaned(), "Padless cluster should be orphaned");
            assert!(!cluster.has_valid_net());
            assert_eq!(cluster.origin_net_name(), "<none>");
        }

        let report = algo.check_connectivity(&board);
        assert_eq!(report.len(), 1, "Net 5 should be reported disjoint once");

        let entry = &report[0];
        assert_eq!(entry.net, 5);
        assert_eq!(entry.net_name, "SIG5");
        assert_eq!(entry.item_a, ItemRef(1));
        assert_eq!(entry.item_b, ItemRef(3));
        assert_eq!(entry.anchor_a, Point::new(0, 0));
        assert_eq!(entry.anchor_b, Point::new(30, 0));

        assert_eq!(algo.unconnected_count(&board), 1);
    }

    #[test]
    fn test_pad_overlapping_track_start() {
        let (mut board, mut algo) = load("pad_track.json");
        rebuild(&mut algo, &board, false);

        assert_eq!(algo.clusters().len(), 1);
        let cluster = &algo.clusters()[0];
        assert_eq!(cluster.origin_net(), Some(1));
        assert!(cluster.has_valid_net());
        assert!(!cluster.is_conflicting());
        assert_eq!(cluster.origin_net_name(), "VCC");

        let origin_pad = cluster.origin_pad().expect("Cluster should have an origin pad");
        assert_eq!(algo.node(origin_pad).map(|n| n.parent()), Some(ItemRef(11)));

        let report = algo.propagate_nets(&mut board);
        assert_eq!(report.updated_items, 1);
        assert!(report.conflicts.is_empty());
        assert_eq!(board.net_of(ItemRef(20)), Some(1));
    }

    #[test]
    fn test_propagation_across_layers() {
        let (mut board, mut algo) = load("two_layer_route.json");

        let start = Instant::now();
        let report = algo.propagate_nets(&mut board);
        println!("Propagation time: {:.3}ms", start.elapsed().as_secs_f64() * 1000.0);

        assert_eq!(report.updated_items, 4);
        assert!(report.conflicts.is_empty());
        assert_eq!(report.orphaned_clusters, 0);

        assert_eq!(board.net_of(ItemRef(200)), Some(1));
        assert_eq!(board.net_of(ItemRef(300)), Some(1));
        assert_eq!(board.net_of(ItemRef(201)), Some(1));
        assert_eq!(board.net_of(ItemRef(202)), Some(2), "Pad net overrides the track's stale net");

        // Every net-changeable member of a sound cluster now carries its origin net
        for cluster in algo.clusters() {
            if !cluster.has_valid_net() || cluster.is_conflicting() {
                continue;
            }
            for id in cluster.items() {
                let node = algo.node(*id).expect("Cluster member should be live");
                if node.can_change_net() {
                    assert_eq!(board.net_of(node.parent()), cluster.origin_net());
                }
            }
        }

        assert!(algo.check_connectivity(&board).is_empty());
        assert_eq!(algo.unconnected_count(&board), 0);
    }

    #[test]
    fn test_shorted_pads_conflict() {
        let (mut board, mut algo) = load("shorted_pads.json");
        rebuild(&mut algo, &board, false);

        let sets = cluster_sets(&algo);
        assert_eq!(sets.len(), 2);
        assert!(sets.contains(&items(&[1, 2])), "Overlapping pads should share a cluster");
        assert!(sets.contains(&items(&[3, 4, 10])));

        for cluster in algo.clusters() {
            assert!(cluster.is_conflicting());
            assert_eq!(cluster.pad_nets(), &[1, 2]);
        }

        let report = algo.propagate_nets(&mut board);
        assert_eq!(report.conflicts.len(), 2);
        assert_eq!(report.updated_items, 0);
        assert_eq!(board.net_of(ItemRef(10)), Some(0), "Conflicting cluster must not be written");

        let shorted = report
            .conflicts
            .iter()
            .find(|c| c.items.contains(&ItemRef(10)))
            .expect("Track should be reported in a conflict");
        assert_eq!(shorted.nets, vec![1, 2]);
        assert_eq!(shorted.items.len(), 3);
    }

    #[test]
    fn test_zone_islands() {
        let (mut board, mut algo) = load("zone_islands.json");
        let zone = ItemRef(30);

        let islands = algo.find_isolated_copper_islands(&board, zone).expect("Zone lookup failed");
        assert_eq!(islands, vec![1]);

        // Subpolygon 2 reaches the pad only through subpolygon 0
        let pad_cluster = algo
            .clusters()
            .iter()
            .find(|c| !c.is_orphaned())
            .expect("Pad cluster should exist");
        let zone_nodes = pad_cluster
            .items()
            .iter()
            .filter_map(|id| algo.node(*id))
            .filter_map(|n| n.subpolygon())
            .collect::<BTreeSet<_>>();
        assert_eq!(zone_nodes, [0, 2].into_iter().collect());

        let removed = board.zone_mut(zone).map(|z| z.remove_filled(&islands));
        assert_eq!(removed, Some(1));
        assert!(algo.remove(&board, zone));
        algo.add(&board, zone).expect("Zone re-add failed");

        assert!(algo.find_isolated_copper_islands(&board, zone).unwrap().is_empty());
        assert_eq!(algo.nodes_of(zone).len(), 2);

        // The lone track keeps net 1 on its own
        assert_eq!(algo.unconnected_count(&board), 1);
    }

    #[test]
    fn test_island_lookup_errors() {
        let (mut board, mut algo) = load("pad_track.json");

        let err = algo.find_isolated_copper_islands(&board, ItemRef(20)).unwrap_err();
        assert!(matches!(err, ConnectivityError::NotAZone { item: ItemRef(20), .. }));

        let err = algo.find_isolated_copper_islands(&board, ItemRef(999)).unwrap_err();
        assert!(matches!(err, ConnectivityError::UnknownItem(ItemRef(999))));

        let empty = Zone {
            id: ItemRef(40),
            name: "VCC_POUR".into(),
            layers: LayerSet::single(0),
            net: 1,
            filled: Vec::new(),
        };
        board.insert(BoardItem::Zone(empty)).unwrap();
        assert!(algo.add(&board, ItemRef(40)).unwrap().is_empty());
        assert!(algo.find_isolated_copper_islands(&board, ItemRef(40)).unwrap().is_empty());
    }

    #[test]
    fn test_partition_invariant_and_idempotence() {
        for fixture in ["two_layer_route.json", "zone_islands.json", "shorted_pads.json"] {
            let (board, mut algo) = load(fixture);
            rebuild(&mut algo, &board, true);

            let mut seen: BTreeSet<NodeId> = BTreeSet::new();
            for cluster in algo.clusters() {
                for id in cluster.items() {
                    assert!(seen.insert(*id), "{}: node {:?} in two clusters", fixture, id);
                }
            }
            let valid: BTreeSet<NodeId> = algo.valid_nodes(true).into_iter().collect();
            assert_eq!(seen, valid, "{}: clusters must cover every valid node", fixture);

            let mut first = cluster_sets(&algo);
            rebuild(&mut algo, &board, true);
            let mut second = cluster_sets(&algo);
            first.sort();
            second.sort();
            assert_eq!(first, second, "{}: second pass changed membership", fixture);
        }
    }

    #[test]
    fn test_remove_and_readd_track() {
        let (board, mut algo) = load("three_tracks.json");

        assert!(algo.remove(&board, ItemRef(2)));
        assert!(!algo.remove(&board, ItemRef(2)), "Second remove should be a no-op");
        rebuild(&mut algo, &board, true);
        assert_eq!(cluster_sets(&algo), vec![items(&[1]), items(&[3])]);
        assert_eq!(algo.valid_nodes(true).len(), 2);

        let added = algo.add(&board, ItemRef(2)).expect("Re-add failed");
        assert_eq!(added.len(), 1);
        rebuild(&mut algo, &board, true);
        assert_eq!(cluster_sets(&algo), vec![items(&[1, 2]), items(&[3])]);
    }

    #[test]
    fn test_footprint_remove_and_add() {
        let (board, mut algo) = load("pad_track.json");
        let footprint = ItemRef(10);

        assert_eq!(board.footprint_pads(footprint), Some(vec![ItemRef(11)]));
        assert!(algo.remove(&board, footprint));
        rebuild(&mut algo, &board, false);
        assert_eq!(cluster_sets(&algo), vec![items(&[20])]);
        assert!(algo.clusters()[0].is_orphaned());

        let added = algo.add(&board, footprint).expect("Footprint add failed");
        assert_eq!(added.len(), 1);
        rebuild(&mut algo, &board, false);
        assert_eq!(cluster_sets(&algo), vec![items(&[11, 20])]);
    }

    #[test]
    fn test_unknown_item_add_fails() {
        let (board, mut algo) = load("three_tracks.json");

        let err = algo.add(&board, ItemRef(999)).unwrap_err();
        assert!(matches!(err, ConnectivityError::UnknownItem(ItemRef(999))));
    }

    #[test]
    fn test_connection_tolerance() {
        let mut board = Board::new();
        for (id, start, end) in [(1, (0, 0), (10, 0)), (2, (13, 0), (20, 0))] {
            board
                .insert(BoardItem::Track(Track {
                    id: ItemRef(id),
                    start: Point::new(start.0, start.1),
                    end: Point::new(end.0, end.1),
                    width: 2,
                    layer: 0,
                    net: 3,
                }))
                .unwrap();
        }

        let mut exact = ConnectivityAlgo::new(ConnectivitySettings::default());
        exact.set_board(&board).unwrap();
        rebuild(&mut exact, &board, false);
        assert_eq!(exact.clusters().len(), 2, "A 3 unit gap exceeds the half-width sum");

        let mut loose = ConnectivityAlgo::new(ConnectivitySettings { connection_tolerance: 2 });
        assert_eq!(loose.settings().connection_tolerance, 2);
        loose.set_board(&board).unwrap();
        rebuild(&mut loose, &board, false);
        assert_eq!(loose.clusters().len(), 1, "Tolerance should bridge the gap");
    }

    fn square(x: i64) -> Outline {
        Outline::new(vec![
            Point::new(x, 0),
            Point::new(x + 100, 0),
            Point::new(x + 100, 100),
            Point::new(x, 100),
        ])
    }

    /// One-subpolygon zone on layer 0, net 1, with a single pad in the middle
    fn zone_with_pad(pad_net: u32, pad_layer: u8) -> Board {
        let mut board = Board::new();
        let pad = Pad {
            id: ItemRef(11),
            position: Point::new(50, 50),
            shape: PadShape::Circle { diameter: 10 },
            rotation: 0.0,
            layers: LayerSet::single(pad_layer),
            net: pad_net,
        };
        board.add_footprint(ItemRef(10), "R1", vec![pad]).unwrap();
        board
            .insert(BoardItem::Zone(Zone {
                id: ItemRef(30),
                name: "GND_POUR".into(),
                layers: LayerSet::single(0),
                net: 1,
                filled: vec![square(0)],
            }))
            .unwrap();
        board
    }

    fn islands_of(board: &Board) -> Vec<usize> {
        let mut algo = ConnectivityAlgo::new(ConnectivitySettings::default());
        algo.set_board(board).unwrap();
        algo.find_isolated_copper_islands(board, ItemRef(30)).unwrap()
    }

    #[test]
    fn test_zone_pad_same_net_and_layer() {
        assert!(islands_of(&zone_with_pad(1, 0)).is_empty());
    }

    #[test]
    fn test_zone_ignores_pad_of_other_net() {
        assert_eq!(islands_of(&zone_with_pad(2, 0)), vec![0]);
    }

    #[test]
    fn test_zone_ignores_pad_on_other_layer() {
        assert_eq!(islands_of(&zone_with_pad(1, 31)), vec![0]);
    }

    #[test]
    fn test_orphaned_tracks_keep_their_net() {
        let (mut board, mut algo) = load("three_tracks.json");

        let report = algo.propagate_nets(&mut board);
        assert_eq!(report.orphaned_clusters, 2);
        assert_eq!(report.updated_items, 0);
        assert!(report.conflicts.is_empty());

        for id in [1, 2, 3] {
            assert_eq!(board.net_of(ItemRef(id)), Some(5), "Track {} should keep net 5", id);
        }
    }

    #[test]
    fn test_disjoint_zone_island_anchor() {
        let (board, mut algo) = load("zone_islands.json");
        assert!(algo.remove(&board, ItemRef(20)));

        let report = algo.check_connectivity(&board);
        assert_eq!(report.len(), 1);

        let entry = &report[0];
        assert_eq!(entry.net, 1);
        assert_eq!((entry.item_a, entry.anchor_a), (ItemRef(11), Point::new(50, 50)));
        assert_eq!(
            (entry.item_b, entry.anchor_b),
            (ItemRef(30), Point::new(500, 0)),
            "Anchor should sit on the isolated subpolygon"
        );
    }
}
