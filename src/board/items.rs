//! Board item types and their copper geometry

use serde::{Deserialize, Serialize};

use crate::connectivity::{ConnectedItem, ItemKind, ItemRef, NetCode};
use crate::geometry::{point_distance, point_segment_distance, LayerSet, Outline, Point};

/// Pad copper shape, centred on the pad position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PadShape {
    Circle { diameter: i64 },
    Rectangle { width: i64, height: i64 },
    Oval { width: i64, height: i64 },
    RoundRect { width: i64, height: i64, corner_radius: i64 },
}

impl PadShape {
    /// Containment of a point given in the pad's local (unrotated) frame
    fn contains_local(&self, x: f64, y: f64) -> bool {
        match *self {
            PadShape::Circle { diameter } => x.hypot(y) <= diameter as f64 / 2.0,
            PadShape::Rectangle { width, height } => {
                x.abs() <= width as f64 / 2.0 && y.abs() <= height as f64 / 2.0
            }
            PadShape::Oval { width, height } => {
                // Stadium: the major axis segment swept by half the minor axis
                let (w, h) = (width as f64, height as f64);
                let radius = w.min(h) / 2.0;
                let half_len = (w.max(h) - w.min(h)) / 2.0;
                let (along, across) = if w >= h { (x, y) } else { (y, x) };
                let d = (along.abs() - half_len).max(0.0);
                d.hypot(across) <= radius
            }
            PadShape::RoundRect { width, height, corner_radius } => {
                let (hw, hh) = (width as f64 / 2.0, height as f64 / 2.0);
                if x.abs() > hw || y.abs() > hh {
                    return false;
                }
                let r = (corner_radius as f64).min(hw).min(hh);
                let dx = (x.abs() - (hw - r)).max(0.0);
                let dy = (y.abs() - (hh - r)).max(0.0);
                dx.hypot(dy) <= r
            }
        }
    }

    pub fn bounding_radius(&self) -> i64 {
        let radius = match *self {
            PadShape::Circle { diameter } => diameter as f64 / 2.0,
            PadShape::Rectangle { width, height } | PadShape::RoundRect { width, height, .. } => {
                (width as f64 / 2.0).hypot(height as f64 / 2.0)
            }
            PadShape::Oval { width, height } => width.max(height) as f64 / 2.0,
        };
        radius.ceil() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub id: ItemRef,
    pub position: Point,
    pub shape: PadShape,
    /// Degrees, counter-clockwise
    #[serde(default)]
    pub rotation: f64,
    pub layers: LayerSet,
    #[serde(default)]
    pub net: NetCode,
}

impl ConnectedItem for Pad {
    fn kind(&self) -> ItemKind {
        ItemKind::Pad
    }

    fn layer_set(&self) -> LayerSet {
        self.layers
    }

    fn net_code(&self) -> NetCode {
        self.net
    }

    fn position(&self) -> Point {
        self.position
    }

    fn bounding_radius(&self) -> i64 {
        self.shape.bounding_radius()
    }

    fn hit_test(&self, point: Point) -> bool {
        let dx = (point.x - self.position.x) as f64;
        let dy = (point.y - self.position.y) as f64;

        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let lx = dx * cos - dy * sin;
        let ly = dx * sin + dy * cos;

        self.shape.contains_local(lx, ly)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: ItemRef,
    pub start: Point,
    pub end: Point,
    pub width: i64,
    pub layer: u8,
    #[serde(default)]
    pub net: NetCode,
}

impl ConnectedItem for Track {
    fn kind(&self) -> ItemKind {
        ItemKind::Track
    }

    fn layer_set(&self) -> LayerSet {
        LayerSet::single(self.layer)
    }

    fn net_code(&self) -> NetCode {
        self.net
    }

    fn position(&self) -> Point {
        self.start
    }

    fn end(&self) -> Point {
        self.end
    }

    fn width(&self) -> i64 {
        self.width
    }

    fn bounding_radius(&self) -> i64 {
        (point_distance(self.start, self.end) + self.width as f64 / 2.0).ceil() as i64
    }

    fn hit_test(&self, point: Point) -> bool {
        point_segment_distance(point, self.start, self.end).0 <= self.width as f64 / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub id: ItemRef,
    pub position: Point,
    pub diameter: i64,
    #[serde(default)]
    pub drill: i64,
    pub layers: LayerSet,
    #[serde(default)]
    pub net: NetCode,
}

impl ConnectedItem for Via {
    fn kind(&self) -> ItemKind {
        ItemKind::Via
    }

    fn layer_set(&self) -> LayerSet {
        self.layers
    }

    fn net_code(&self) -> NetCode {
        self.net
    }

    fn position(&self) -> Point {
        self.position
    }

    fn width(&self) -> i64 {
        self.diameter
    }

    fn bounding_radius(&self) -> i64 {
        (self.diameter + 1) / 2
    }

    fn hit_test(&self, point: Point) -> bool {
        point_distance(point, self.position) <= self.diameter as f64 / 2.0
    }
}

/// A copper zone with its already-computed fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ItemRef,
    #[serde(default)]
    pub name: String,
    pub layers: LayerSet,
    #[serde(default)]
    pub net: NetCode,
    #[serde(default)]
    pub filled: Vec<Outline>,
}

impl Zone {
    /// Delete filled subpolygons by index; returns how many were removed
    pub fn remove_filled(&mut self, indices: &[usize]) -> usize {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        let mut removed = 0;
        for index in sorted {
            if index < self.filled.len() {
                self.filled.remove(index);
                removed += 1;
            }
        }
        removed
    }
}

impl ConnectedItem for Zone {
    fn kind(&self) -> ItemKind {
        ItemKind::Zone
    }

    fn layer_set(&self) -> LayerSet {
        self.layers
    }

    fn net_code(&self) -> NetCode {
        self.net
    }

    fn position(&self) -> Point {
        self.filled.iter().find_map(Outline::anchor).unwrap_or_default()
    }

    fn bounding_radius(&self) -> i64 {
        0
    }

    fn hit_test(&self, point: Point) -> bool {
        self.filled.iter().any(|o| o.contains(point))
    }

    fn filled_polygons(&self) -> &[Outline] {
        &self.filled
    }
}

/// Any connected item stored on a [`Board`](super::Board)
#[derive(Debug, Clone, PartialEq)]
pub enum BoardItem {
    Pad(Pad),
    Track(Track),
    Via(Via),
    Zone(Zone),
}

impl BoardItem {
    pub fn id(&self) -> ItemRef {
        match self {
            BoardItem::Pad(p) => p.id,
            BoardItem::Track(t) => t.id,
            BoardItem::Via(v) => v.id,
            BoardItem::Zone(z) => z.id,
        }
    }

    pub fn as_connected(&self) -> &dyn ConnectedItem {
        match self {
            BoardItem::Pad(p) => p,
            BoardItem::Track(t) => t,
            BoardItem::Via(v) => v,
            BoardItem::Zone(z) => z,
        }
    }

    pub fn set_net(&mut self, net: NetCode) {
        match self {
            BoardItem::Pad(p) => p.net = net,
            BoardItem::Track(t) => t.net = net,
            BoardItem::Via(v) => v.net = net,
            BoardItem::Zone(z) => z.net = net,
        }
    }
}
