//! Geometry primitives for connectivity analysis
//!
//! Coordinates are integer internal units (nanometres on a real board), so
//! anchor ordering and equality are exact.
//!
//! # Submodules
//! - `types` - Points, layer sets, filled outlines and bounding boxes
//! - `distance` - Distance and containment predicates

mod types;
mod distance;

pub use types::{BBox, LayerSet, Outline, Point};

pub use distance::{
    point_distance,
    point_in_ring,
    point_segment_distance,
};
