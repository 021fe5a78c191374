//! Geometry module
//!
//! Boolean clipping, contour classification and triangulation of the
//! walkable region, plus the small 2D math kit the navigation layer uses

mod clip;
pub mod math;
mod triangulate;

pub use clip::{bounds_ring, walkable_region};
pub use triangulate::{
    Region, classify_contours, subdivide_region, subdivide_ring, triangulate_region,
};
