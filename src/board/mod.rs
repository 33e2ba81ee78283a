//! Reference board model
//!
//! A small serde-backed board: nets, footprints with pads, free pads,
//! tracks, vias and filled zones. It implements [`BoardAccess`] so the
//! connectivity engine can run directly on a board loaded from JSON.
//!
//! # Submodules
//! - `items` - Pad, track, via and zone types with their hit tests

mod items;

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::connectivity::{BoardAccess, ConnectedItem, ConnectivitySettings, ItemRef, NetCode};

pub use items::{BoardItem, Pad, PadShape, Track, Via, Zone};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetInfo {
    pub code: NetCode,
    pub name: String,
}

/// A footprint as stored in a board file: its pads are inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintFile {
    pub id: ItemRef,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub pads: Vec<Pad>,
}

/// On-disk layout of a board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardFile {
    #[serde(default)]
    pub settings: ConnectivitySettings,
    #[serde(default)]
    pub nets: Vec<NetInfo>,
    #[serde(default)]
    pub footprints: Vec<FootprintFile>,
    /// Pads not owned by any footprint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, Default)]
struct Footprint {
    reference: String,
    pads: Vec<ItemRef>,
}

/// In-memory board: items are indexed by id and keep file order
#[derive(Debug, Clone, Default)]
pub struct Board {
    settings: ConnectivitySettings,
    nets: IndexMap<NetCode, String>,
    footprints: IndexMap<ItemRef, Footprint>,
    items: IndexMap<ItemRef, BoardItem>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read board file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("failed to load board {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: BoardFile = serde_json::from_str(text).context("invalid board JSON")?;
        Self::from_file(file)
    }

    /// Build a board from its file layout, rejecting duplicate ids and
    /// negative connection tolerances
    pub fn from_file(file: BoardFile) -> Result<Self> {
        if file.settings.connection_tolerance < 0 {
            return Err(anyhow!(
                "connection_tolerance must not be negative, got {}",
                file.settings.connection_tolerance
            ));
        }

        let mut board = Board {
            settings: file.settings,
            ..Board::default()
        };

        for net in file.nets {
            board.add_net(net.code, net.name);
        }
        for fp in file.footprints {
            board.add_footprint(fp.id, fp.reference, fp.pads)?;
        }
        for pad in file.pads {
            board.insert(BoardItem::Pad(pad))?;
        }
        for track in file.tracks {
            board.insert(BoardItem::Track(track))?;
        }
        for via in file.vias {
            board.insert(BoardItem::Via(via))?;
        }
        for zone in file.zones {
            board.insert(BoardItem::Zone(zone))?;
        }

        Ok(board)
    }

    pub fn to_file(&self) -> BoardFile {
        let mut file = BoardFile {
            settings: self.settings.clone(),
            nets: self
                .nets
                .iter()
                .map(|(&code, name)| NetInfo { code, name: name.clone() })
                .collect(),
            ..BoardFile::default()
        };

        for (&id, fp) in &self.footprints {
            let pads = fp
                .pads
                .iter()
                .filter_map(|p| match self.items.get(p) {
                    Some(BoardItem::Pad(pad)) => Some(pad.clone()),
                    _ => None,
                })
                .collect();
            file.footprints.push(FootprintFile { id, reference: fp.reference.clone(), pads });
        }

        for item in self.items.values() {
            match item {
                BoardItem::Pad(pad) if !self.is_footprint_pad(pad.id) => file.pads.push(pad.clone()),
                BoardItem::Pad(_) => {}
                BoardItem::Track(t) => file.tracks.push(t.clone()),
                BoardItem::Via(v) => file.vias.push(v.clone()),
                BoardItem::Zone(z) => file.zones.push(z.clone()),
            }
        }

        file
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_file()).context("failed to serialize board")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json_string()?)
            .with_context(|| format!("failed to write board file {}", path.display()))
    }

    pub fn settings(&self) -> &ConnectivitySettings {
        &self.settings
    }

    pub fn add_net(&mut self, code: NetCode, name: impl Into<String>) {
        self.nets.insert(code, name.into());
    }

    /// Add a loose item; fails if its id is already taken
    pub fn insert(&mut self, item: BoardItem) -> Result<ItemRef> {
        let id = item.id();
        if self.items.contains_key(&id) || self.footprints.contains_key(&id) {
            return Err(anyhow!("duplicate item id {}", id));
        }
        self.items.insert(id, item);
        Ok(id)
    }

    pub fn add_footprint(&mut self, id: ItemRef, reference: impl Into<String>, pads: Vec<Pad>) -> Result<ItemRef> {
        if self.items.contains_key(&id) || self.footprints.contains_key(&id) {
            return Err(anyhow!("duplicate footprint id {}", id));
        }

        let mut ids = Vec::with_capacity(pads.len());
        for pad in pads {
            ids.push(self.insert(BoardItem::Pad(pad))?);
        }
        self.footprints.insert(id, Footprint { reference: reference.into(), pads: ids });
        Ok(id)
    }

    pub fn get(&self, id: ItemRef) -> Option<&BoardItem> {
        self.items.get(&id)
    }

    pub fn net_of(&self, id: ItemRef) -> Option<NetCode> {
        self.items.get(&id).map(|i| i.as_connected().net_code())
    }

    pub fn footprint_reference(&self, id: ItemRef) -> Option<&str> {
        self.footprints.get(&id).map(|fp| fp.reference.as_str())
    }

    pub fn zone(&self, id: ItemRef) -> Option<&Zone> {
        match self.items.get(&id) {
            Some(BoardItem::Zone(z)) => Some(z),
            _ => None,
        }
    }

    pub fn zone_mut(&mut self, id: ItemRef) -> Option<&mut Zone> {
        match self.items.get_mut(&id) {
            Some(BoardItem::Zone(z)) => Some(z),
            _ => None,
        }
    }

    pub fn zone_ids(&self) -> Vec<ItemRef> {
        self.items
            .values()
            .filter_map(|i| match i {
                BoardItem::Zone(z) => Some(z.id),
                _ => None,
            })
            .collect()
    }

    /// Remove an item, or a footprint with all its pads
    pub fn remove(&mut self, id: ItemRef) -> bool {
        if let Some(fp) = self.footprints.shift_remove(&id) {
            for pad in fp.pads {
                self.items.shift_remove(&pad);
            }
            return true;
        }

        if self.items.shift_remove(&id).is_none() {
            return false;
        }
        for fp in self.footprints.values_mut() {
            fp.pads.retain(|p| *p != id);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn is_footprint_pad(&self, id: ItemRef) -> bool {
        self.footprints.values().any(|fp| fp.pads.contains(&id))
    }
}

impl BoardAccess for Board {
    fn item(&self, item: ItemRef) -> Option<&dyn ConnectedItem> {
        self.items.get(&item).map(BoardItem::as_connected)
    }

    fn set_net_code(&mut self, item: ItemRef, net: NetCode) -> bool {
        match self.items.get_mut(&item) {
            Some(obj) => {
                obj.set_net(net);
                true
            }
            None => false,
        }
    }

    fn net_name(&self, net: NetCode) -> String {
        match self.nets.get(&net) {
            Some(name) => name.clone(),
            None => format!("Net-{}", net),
        }
    }

    fn footprint_pads(&self, item: ItemRef) -> Option<Vec<ItemRef>> {
        self.footprints.get(&item).map(|fp| fp.pads.clone())
    }

    fn connected_items(&self) -> Vec<ItemRef> {
        let mut out = Vec::with_capacity(self.items.len());

        out.extend(self.items.values().filter(|i| matches!(i, BoardItem::Zone(_))).map(BoardItem::id));
        out.extend(
            self.items
                .values()
                .filter(|i| matches!(i, BoardItem::Track(_) | BoardItem::Via(_)))
                .map(BoardItem::id),
        );
        out.extend(self.footprints.keys().copied());
        out.extend(
            self.items
                .values()
                .filter(|i| matches!(i, BoardItem::Pad(p) if !self.is_footprint_pad(p.id)))
                .map(BoardItem::id),
        );

        out
    }
}
