//! Board boundary: what the connectivity engine reads from and writes to items
//!
//! The engine never owns board items. Every operation borrows a
//! [`BoardAccess`] implementation for its duration and resolves
//! [`ItemRef`]s through it.

use super::types::{ItemKind, ItemRef, NetCode};
use crate::geometry::{LayerSet, Outline, Point};

/// Read access to one connected board item
pub trait ConnectedItem {
    fn kind(&self) -> ItemKind;

    fn layer_set(&self) -> LayerSet;

    fn net_code(&self) -> NetCode;

    /// Pad shape position, via centre or track start
    fn position(&self) -> Point;

    /// Track end; other kinds have a single position
    fn end(&self) -> Point {
        self.position()
    }

    /// Track width or via diameter
    fn width(&self) -> i64 {
        0
    }

    /// Radius of the circle centred on `position()` enclosing the whole shape
    fn bounding_radius(&self) -> i64;

    /// True when `point` lies on the item's copper
    fn hit_test(&self, point: Point) -> bool;

    /// Filled subpolygons; empty for everything but zones
    fn filled_polygons(&self) -> &[Outline] {
        &[]
    }
}

/// The board model as seen by the connectivity engine
pub trait BoardAccess {
    fn item(&self, item: ItemRef) -> Option<&dyn ConnectedItem>;

    /// Write a net code back to an item; returns false for unknown ids
    fn set_net_code(&mut self, item: ItemRef, net: NetCode) -> bool;

    fn net_name(&self, net: NetCode) -> String {
        format!("Net-{}", net)
    }

    /// Pads owned by a footprint, or `None` when `item` is not a footprint
    fn footprint_pads(&self, _item: ItemRef) -> Option<Vec<ItemRef>> {
        None
    }

    /// Every connected item on the board: zones, then tracks and vias, then pads
    fn connected_items(&self) -> Vec<ItemRef>;
}
