//! Core geometry types for connectivity analysis

use rstar::AABB;
use serde::{Deserialize, Serialize};

use super::distance::point_in_ring;

/// Axis-aligned bounding box in internal units
pub type BBox = AABB<[i64; 2]>;

/// A 2D point in internal units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn to_array(self) -> [i64; 2] {
        [self.x, self.y]
    }
}

impl From<[i64; 2]> for Point {
    fn from(p: [i64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

/// Set of copper layers an item lives on, one bit per layer number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct LayerSet(u64);

impl LayerSet {
    pub const MAX_LAYERS: u8 = 64;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn single(layer: u8) -> Self {
        let mut set = Self::empty();
        set.insert(layer);
        set
    }

    pub fn insert(&mut self, layer: u8) {
        if layer < Self::MAX_LAYERS {
            self.0 |= 1u64 << layer;
        }
    }

    pub fn contains(&self, layer: u8) -> bool {
        layer < Self::MAX_LAYERS && self.0 & (1u64 << layer) != 0
    }

    /// True when the two sets share at least one layer
    pub fn intersects(&self, other: &LayerSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn layers(&self) -> impl Iterator<Item = u8> + '_ {
        (0..Self::MAX_LAYERS).filter(move |&l| self.contains(l))
    }
}

impl From<Vec<u8>> for LayerSet {
    fn from(layers: Vec<u8>) -> Self {
        let mut set = Self::empty();
        for layer in layers {
            set.insert(layer);
        }
        set
    }
}

impl From<LayerSet> for Vec<u8> {
    fn from(set: LayerSet) -> Self {
        set.layers().collect()
    }
}

/// One filled copper outline: an outer ring with optional holes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub outer: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
}

impl Outline {
    pub fn new(outer: Vec<Point>) -> Self {
        Self { outer, holes: Vec::new() }
    }

    /// Outlines with fewer than three vertices enclose nothing
    pub fn is_degenerate(&self) -> bool {
        self.outer.len() < 3
    }

    /// Point containment: inside the outer ring and outside every hole
    pub fn contains(&self, p: Point) -> bool {
        if self.is_degenerate() {
            return false;
        }

        point_in_ring(p, &self.outer) && !self.holes.iter().any(|h| point_in_ring(p, h))
    }

    pub fn bbox(&self) -> Option<BBox> {
        if self.is_degenerate() {
            return None;
        }

        let corners: Vec<[i64; 2]> = self.outer.iter().map(|p| p.to_array()).collect();
        Some(AABB::from_points(corners.iter()))
    }

    /// Representative point used as the outline's spatial anchor
    pub fn anchor(&self) -> Option<Point> {
        if self.is_degenerate() {
            None
        } else {
            self.outer.first().copied()
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.outer
    }
}
