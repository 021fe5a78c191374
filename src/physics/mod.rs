//! Physics collaborator
//!
//! Built on top of rapier2d. The navigation core only sees the narrow
//! [`CollisionWorld`] interface: static geometry for the mesh build, ray casts
//! for line of sight, and point tests.

mod world;

use glam::Vec2;

pub use world::{BodyHandle, ColliderHandle, Physics, RaycastHit, SensorId, SensorShape};

/// Collision category bits
pub mod category {
    /// The player body
    pub const PLAYER: u32 = 1 << 0;
    /// Guard bodies
    pub const GUARD: u32 = 1 << 1;
    /// Sensor colliders
    pub const SENSOR: u32 = 1 << 2;
    /// Static level geometry
    pub const STATIC: u32 = 1 << 3;
    /// Everything
    pub const ALL: u32 = u32::MAX;
}

/// Static world queries the navigation core depends on
pub trait CollisionWorld {
    /// World-space outlines of every static collider, one convex ring each
    fn static_polygons(&self) -> Vec<Vec<Vec2>>;

    /// First body hit by the segment `start -> end`
    ///
    /// Only colliders whose category intersects `mask` and not `ignore_mask`
    /// are considered. Sensors never block rays.
    fn ray_cast(&self, start: Vec2, end: Vec2, mask: u32, ignore_mask: u32) -> Option<BodyHandle>;

    /// True if `p` lies inside any static collider
    fn is_point_blocked(&self, p: Vec2) -> bool;

    /// Convenience: nothing matching `mask` blocks the segment
    fn is_segment_clear(&self, start: Vec2, end: Vec2, mask: u32) -> bool {
        self.ray_cast(start, end, mask, 0).is_none()
    }
}
