//! Level entity components

use glam::Vec2;

use crate::physics::{BodyHandle, SensorId};

/// Physics body backing an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Body(pub BodyHandle);

/// Static box obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// World centre
    pub center: Vec2,
    /// Rotation in radians
    pub angle: f32,
    /// Half extents
    pub half_extents: Vec2,
}

impl Obstacle {
    /// World-space corners, counter-clockwise
    pub fn corners(&self) -> [Vec2; 4] {
        let rot = Vec2::from_angle(self.angle);
        let h = self.half_extents;
        [
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(-h.x, h.y),
        ]
        .map(|c| self.center + rot.rotate(c))
    }
}

/// Physics sensors owned by an entity, removed with it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sensors(pub Vec<SensorId>);

/// Name component for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
