//! Feature geometry consumed by bucket emitters.
//!
//! Canonical space is tile coordinates: origin top-left, +X right, +Y down,
//! with the tile spanning `0..EXTENT` on both axes. Projection and clipping
//! happen upstream.

mod feature;
mod point;

pub use feature::{BoxedFeature, Feature, GeometryKind, Ring, VectorFeature};
pub use point::Point;

/// Tile extent in geometry units.
pub const EXTENT: f32 = 4096.0;
