//! Steering behaviors for agent movement
//!
//! Agents are driven by velocity, so `linear` is the desired velocity rather
//! than an acceleration, and `angular` is a turn rate.

use glam::Vec2;

use super::body::AgentBody;

/// Output from a steering behavior
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringOutput {
    /// Desired linear velocity
    pub linear: Vec2,
    /// Desired turn rate, counter-clockwise positive
    pub angular: f32,
}

impl SteeringOutput {
    /// Zero steering
    pub const ZERO: Self = Self {
        linear: Vec2::ZERO,
        angular: 0.0,
    };

    /// Write the output to a body
    pub fn apply(self, body: &mut dyn AgentBody) {
        body.set_linear_velocity(self.linear);
        body.set_angular_velocity(self.angular);
    }
}

/// Trait for steering behaviors
pub trait SteeringBehavior {
    /// Calculate steering based on agent state
    fn calculate(&self, body: &dyn AgentBody) -> SteeringOutput;
}

/// Seek behavior - move towards target at full speed
#[derive(Debug, Clone)]
pub struct Seek {
    /// Target position
    pub target: Vec2,
    /// Maximum speed
    pub max_speed: f32,
}

impl Seek {
    /// Create a new seek behavior
    #[must_use]
    pub fn new(target: Vec2, max_speed: f32) -> Self {
        Self { target, max_speed }
    }
}

impl SteeringBehavior for Seek {
    fn calculate(&self, body: &dyn AgentBody) -> SteeringOutput {
        let direction = (self.target - body.position()).normalize_or_zero();
        SteeringOutput {
            linear: direction * self.max_speed,
            angular: 0.0,
        }
    }
}

/// Arrive behavior - move towards target and slow down
#[derive(Debug, Clone)]
pub struct Arrive {
    /// Target position
    pub target: Vec2,
    /// Maximum speed
    pub max_speed: f32,
    /// Slowing distance
    pub slow_radius: f32,
    /// Stopping distance
    pub target_radius: f32,
}

impl Arrive {
    /// Create a new arrive behavior
    #[must_use]
    pub fn new(target: Vec2, max_speed: f32) -> Self {
        Self {
            target,
            max_speed,
            slow_radius: 3.0,
            target_radius: 0.1,
        }
    }
}

impl SteeringBehavior for Arrive {
    fn calculate(&self, body: &dyn AgentBody) -> SteeringOutput {
        let to_target = self.target - body.position();
        let distance = to_target.length();

        if distance < self.target_radius {
            return SteeringOutput::ZERO;
        }

        let target_speed = if distance > self.slow_radius {
            self.max_speed
        } else {
            self.max_speed * distance / self.slow_radius
        };

        SteeringOutput {
            linear: to_target.normalize_or_zero() * target_speed,
            angular: 0.0,
        }
    }
}

/// Face behavior - turn towards a direction without moving
#[derive(Debug, Clone)]
pub struct Face {
    /// Direction to face
    pub direction: Vec2,
    /// Maximum turn rate
    pub max_rate: f32,
    /// Remaining angle under which the turn rate ramps down
    pub slow_angle: f32,
}

impl Face {
    /// Create a new face behavior
    #[must_use]
    pub fn new(direction: Vec2, max_rate: f32) -> Self {
        Self {
            direction,
            max_rate,
            slow_angle: 0.25,
        }
    }

    /// Signed angle left to turn, counter-clockwise positive
    pub fn remaining(&self, body: &dyn AgentBody) -> f32 {
        let f = body.forward();
        f.perp_dot(self.direction).atan2(f.dot(self.direction))
    }
}

impl SteeringBehavior for Face {
    fn calculate(&self, body: &dyn AgentBody) -> SteeringOutput {
        if self.direction.length_squared() <= f32::EPSILON {
            return SteeringOutput::ZERO;
        }
        let remaining = self.remaining(body);
        let rate = if remaining.abs() > self.slow_angle {
            self.max_rate
        } else {
            self.max_rate * remaining.abs() / self.slow_angle
        };
        SteeringOutput {
            linear: Vec2::ZERO,
            angular: rate.copysign(remaining),
        }
    }
}
