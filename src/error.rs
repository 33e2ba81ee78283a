//! Error types for pcb_connectivity.

use thiserror::Error;

use crate::connectivity::{ItemKind, ItemRef};

/// Result type for connectivity operations.
pub type Result<T> = std::result::Result<T, ConnectivityError>;

/// Errors raised at the board boundary.
///
/// Electrical problems (shorts, dead copper, unrouted nets) are reported
/// through clusters and reports, never through this type.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// The board has no item with this id.
    #[error("item {0} is not present on the board")]
    UnknownItem(ItemRef),

    /// A zone operation was requested for an item of another kind.
    #[error("item {item} is a {kind:?}, expected a zone")]
    NotAZone { item: ItemRef, kind: ItemKind },
}
