//! Agent body seam
//!
//! Brains never touch the physics world directly. They read and drive agent
//! kinematics through [`AgentBody`]; the level copies an [`AgentState`] out of
//! the physics world before the brains run and writes it back afterwards.

use glam::Vec2;

use crate::geometry::math::{angle_from_forward, forward_from_angle, wrap_angle};

/// Kinematic view of an agent
pub trait AgentBody {
    /// World position
    fn position(&self) -> Vec2;

    /// Heading in radians; zero faces +Y
    fn angle(&self) -> f32;

    /// Current linear velocity
    fn linear_velocity(&self) -> Vec2;

    /// Drive the body at `velocity`
    fn set_linear_velocity(&mut self, velocity: Vec2);

    /// Turn rate in radians per second, counter-clockwise positive
    fn set_angular_velocity(&mut self, rate: f32);

    /// Snap the heading to face `direction`
    fn set_rotation(&mut self, direction: Vec2);

    /// Unit facing direction
    fn forward(&self) -> Vec2 {
        forward_from_angle(self.angle())
    }

    /// Unit direction to the right of [`forward`](Self::forward)
    fn right(&self) -> Vec2 {
        let f = self.forward();
        Vec2::new(f.y, -f.x)
    }
}

/// Plain-data agent kinematics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentState {
    /// World position
    pub position: Vec2,
    /// Heading in radians
    pub angle: f32,
    /// Linear velocity
    pub linear_velocity: Vec2,
    /// Turn rate
    pub angular_velocity: f32,
}

impl AgentState {
    /// Agent at rest
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            position,
            angle,
            ..Default::default()
        }
    }

    /// Apply the turn rate for one frame
    ///
    /// Physics bodies keep their rotation locked, so heading is integrated
    /// here rather than by the solver.
    pub fn integrate_rotation(&mut self, dt: f32) {
        self.angle = wrap_angle(self.angle + self.angular_velocity * dt);
    }
}

impl AgentBody for AgentState {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn angle(&self) -> f32 {
        self.angle
    }

    fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    fn set_angular_velocity(&mut self, rate: f32) {
        self.angular_velocity = rate;
    }

    fn set_rotation(&mut self, direction: Vec2) {
        if direction.length_squared() > f32::EPSILON {
            self.angle = angle_from_forward(direction);
            self.angular_velocity = 0.0;
        }
    }
}
