//! PCB electrical connectivity
//!
//! Builds the connection graph of a board's copper (pads, tracks, vias and
//! filled zone subpolygons), groups it into clusters, propagates pad nets to
//! tracks and vias, finds isolated zone islands and reports unrouted nets.
//!
//! # Modules
//! - `geometry` - Points, layer sets, outlines and distance helpers
//! - `connectivity` - The connectivity engine
//! - `board` - A serde-backed board model implementing the engine's boundary traits
//! - `error` - Engine error type

pub mod board;
pub mod connectivity;
pub mod error;
pub mod geometry;

pub use board::Board;
pub use connectivity::{BoardAccess, Cluster, ConnectedItem, ConnectivityAlgo, ConnectivitySettings, ItemRef};
pub use error::{ConnectivityError, Result};
