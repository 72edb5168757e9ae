//! Map module - static level geometry and spatial queries
//!
//! Read-only view of a parsed level:
//! - Vertices, linedefs, sidedefs, and sector definitions
//! - Block-grid spatial index for "which lines are near this point"
//! - Sector containment lookup
//! - Precomputed visibility (PVS) between sectors
//!
//! The simulation queries this data every tick and never mutates it. Binary
//! map parsing lives outside the crate; a converter produces this model, and
//! the RON loader here handles the on-disk form the tooling writes.

mod geometry;
mod load;

pub use geometry::*;
pub use load::*;

#[cfg(test)]
pub(crate) mod builder;
