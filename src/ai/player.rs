//! Input-driven player brain
//!
//! Moves the player body from an externally supplied [`PlayerInput`]. Sprinting
//! is loud: every footstep interval a [`GameEvent::SoundEmitted`] goes out for
//! nearby guards to hear.

use glam::Vec2;

use hecs::Entity;

use super::body::AgentBody;
use super::steering::{Seek, SteeringBehavior, SteeringOutput};
use crate::core::{EventQueue, GameEvent, PlayerConfig};

/// One frame of player intent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Desired movement direction; longer than one is clamped
    pub movement: Vec2,
    /// Direction to face; zero keeps the current heading
    pub aim: Vec2,
    /// Run at sprint speed
    pub sprint: bool,
}

/// Player behaviour
#[derive(Debug, Clone)]
pub struct PlayerBrain {
    config: PlayerConfig,
    input: PlayerInput,
    footstep_timer: f32,
    footsteps: u32,
}

impl PlayerBrain {
    /// Player standing still
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            input: PlayerInput::default(),
            footstep_timer: 0.0,
            footsteps: 0,
        }
    }

    /// Called once after spawning
    pub fn on_initialize(&mut self, entity: Entity) {
        log::debug!("Player {entity:?} ready");
        self.footstep_timer = 0.0;
    }

    /// Replace the current input
    pub fn set_input(&mut self, input: PlayerInput) {
        self.input = input;
    }

    /// Current input
    pub fn input(&self) -> PlayerInput {
        self.input
    }

    /// Footstep sounds emitted so far
    pub fn footsteps(&self) -> u32 {
        self.footsteps
    }

    /// Advance one frame
    ///
    /// Needs no navigation, so the level runs it even before a mesh is built.
    pub fn update(&mut self, body: &mut dyn AgentBody, dt: f32, entity: Entity, events: &mut EventQueue) {
        let movement = self.input.movement.clamp_length_max(1.0);
        let moving = movement.length_squared() > f32::EPSILON;
        let speed = if self.input.sprint {
            self.config.sprint_speed
        } else {
            self.config.walk_speed
        };

        let output = if moving {
            Seek::new(body.position() + movement, speed * movement.length()).calculate(body)
        } else {
            SteeringOutput::ZERO
        };
        output.apply(body);
        if self.input.aim.length_squared() > f32::EPSILON {
            body.set_rotation(self.input.aim);
        } else if moving {
            body.set_rotation(movement);
        }

        if !(self.input.sprint && moving) {
            // The first step of a sprint is heard immediately
            self.footstep_timer = 0.0;
            return;
        }
        self.footstep_timer -= dt;
        if self.footstep_timer <= 0.0 {
            self.footstep_timer += self.config.footstep_interval;
            self.footsteps += 1;
            events.push(GameEvent::SoundEmitted {
                position: body.position(),
                volume: self.config.footstep_volume,
                source: Some(entity),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AgentState;

    fn run(brain: &mut PlayerBrain, body: &mut AgentState, events: &mut EventQueue, frames: usize) {
        for _ in 0..frames {
            brain.update(body, 0.1, Entity::DANGLING, events);
        }
    }

    fn sounds(events: &EventQueue) -> usize {
        events
            .pending()
            .filter(|e| matches!(e, GameEvent::SoundEmitted { .. }))
            .count()
    }

    #[test]
    fn test_walk_is_silent() {
        let mut brain = PlayerBrain::new(PlayerConfig::default());
        let mut body = AgentState::default();
        let mut events = EventQueue::new();
        brain.set_input(PlayerInput {
            movement: Vec2::new(2.0, 0.0),
            ..Default::default()
        });

        run(&mut brain, &mut body, &mut events, 10);
        // Clamped to unit input at walk speed
        assert!((body.linear_velocity - Vec2::new(4.0, 0.0)).length() < 1e-5);
        assert!((body.forward() - Vec2::X).length() < 1e-5);
        assert_eq!(sounds(&events), 0);
    }

    #[test]
    fn test_sprint_emits_footsteps_at_interval() {
        let mut brain = PlayerBrain::new(PlayerConfig::default());
        let mut body = AgentState::default();
        let mut events = EventQueue::new();
        brain.set_input(PlayerInput {
            movement: Vec2::Y,
            aim: Vec2::NEG_X,
            sprint: true,
        });

        // One second at a 0.4 s interval: steps at 0.0, 0.4 and 0.8
        run(&mut brain, &mut body, &mut events, 10);
        assert_eq!(brain.footsteps(), 3);
        assert_eq!(sounds(&events), 3);
        assert!((body.linear_velocity.length() - 8.0).abs() < 1e-4);
        // Aim wins over movement direction
        assert!((body.forward() - Vec2::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_standing_still_stops() {
        let mut brain = PlayerBrain::new(PlayerConfig::default());
        let mut body = AgentState::default();
        body.linear_velocity = Vec2::ONE;
        let mut events = EventQueue::new();
        brain.set_input(PlayerInput {
            sprint: true,
            ..Default::default()
        });

        run(&mut brain, &mut body, &mut events, 3);
        assert_eq!(body.linear_velocity, Vec2::ZERO);
        assert_eq!(sounds(&events), 0);
    }
}
