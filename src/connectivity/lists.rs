//! The four per-kind item lists owned by one algorithm instance

use super::item_list::SpatialItemList;
use super::node::NodeArena;
use super::types::{ItemKind, ItemRef};

#[derive(Clone, Debug)]
pub struct ItemLists {
    pub pads: SpatialItemList,
    pub tracks: SpatialItemList,
    pub vias: SpatialItemList,
    pub zones: SpatialItemList,
}

impl ItemLists {
    pub fn new() -> Self {
        Self {
            pads: SpatialItemList::new(ItemKind::Pad),
            tracks: SpatialItemList::new(ItemKind::Track),
            vias: SpatialItemList::new(ItemKind::Via),
            zones: SpatialItemList::new(ItemKind::Zone),
        }
    }

    pub fn get(&self, kind: ItemKind) -> &SpatialItemList {
        match kind {
            ItemKind::Pad => &self.pads,
            ItemKind::Track => &self.tracks,
            ItemKind::Via => &self.vias,
            ItemKind::Zone => &self.zones,
        }
    }

    pub fn get_mut(&mut self, kind: ItemKind) -> &mut SpatialItemList {
        match kind {
            ItemKind::Pad => &mut self.pads,
            ItemKind::Track => &mut self.tracks,
            ItemKind::Via => &mut self.vias,
            ItemKind::Zone => &mut self.zones,
        }
    }

    /// Pads, tracks, vias, zones: the order clustering walks them in
    pub fn iter(&self) -> impl Iterator<Item = &SpatialItemList> {
        [&self.pads, &self.tracks, &self.vias, &self.zones].into_iter()
    }

    /// Invalidate `item` in whichever list holds it
    pub fn remove(&mut self, arena: &mut NodeArena, item: ItemRef) -> bool {
        let mut removed = false;
        for list in [&mut self.pads, &mut self.tracks, &mut self.vias, &mut self.zones] {
            removed |= list.remove(arena, item);
        }
        removed
    }

    pub fn remove_invalid(&mut self, arena: &mut NodeArena) -> usize {
        [&mut self.pads, &mut self.tracks, &mut self.vias, &mut self.zones]
            .into_iter()
            .map(|list| list.remove_invalid(arena))
            .sum()
    }

    pub fn ensure_sorted(&mut self) {
        for list in [&mut self.pads, &mut self.tracks, &mut self.vias, &mut self.zones] {
            list.ensure_sorted();
        }
    }
}

impl Default for ItemLists {
    fn default() -> Self {
        Self::new()
    }
}
