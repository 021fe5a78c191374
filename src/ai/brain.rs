//! Agent brains
//!
//! A closed set of behaviour kinds behind one dispatch surface. Brains hold
//! their sensors by value and talk to the rest of the level only through a
//! [`BrainContext`] and an [`AgentBody`].

use glam::Vec2;
use hecs::Entity;

use super::body::AgentBody;
use super::guard::{GuardBrain, GuardState};
use super::player::{PlayerBrain, PlayerInput};
use crate::core::{DebugConfig, DebugDraw, EventQueue, GameEvent, RandomSource};
use crate::nav::Navigation;
use crate::physics::{BodyHandle, CollisionWorld};

/// Where the player is this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSighting {
    /// Player physics body
    pub body: BodyHandle,
    /// Player position
    pub position: Vec2,
}

/// Everything a brain may touch during one update
pub struct BrainContext<'a> {
    /// Frame time in seconds
    pub dt: f32,
    /// Entity owning the brain
    pub entity: Entity,
    /// Shared navigation and path pool
    pub navigation: &'a mut Navigation,
    /// Static world queries
    pub world: &'a dyn CollisionWorld,
    /// Random source
    pub rng: &'a mut dyn RandomSource,
    /// Outgoing events
    pub events: &'a mut EventQueue,
    /// The player, if one is alive
    pub player: Option<PlayerSighting>,
}

/// Behaviour of one agent
#[derive(Debug)]
pub enum Brain {
    /// Input-driven player
    Player(PlayerBrain),
    /// AI guard
    Guard(GuardBrain),
}

impl Brain {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Brain::Player(_) => "Player",
            Brain::Guard(_) => "Guard",
        }
    }

    /// Called once after the agent is spawned
    pub fn on_initialize(&mut self, body: &dyn AgentBody, ctx: &mut BrainContext<'_>) {
        match self {
            Brain::Player(player) => player.on_initialize(ctx.entity),
            Brain::Guard(guard) => guard.on_initialize(body, ctx),
        }
    }

    /// Advance one frame
    pub fn update(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        match self {
            Brain::Player(player) => player.update(body, ctx.dt, ctx.entity, ctx.events),
            Brain::Guard(guard) => guard.update(body, ctx),
        }
    }

    /// Feed a contact or perception event
    pub fn on_event(&mut self, event: &GameEvent) {
        if let Brain::Guard(guard) = self {
            guard.on_event(event);
        }
    }

    /// Draw brain state
    pub fn debug_render(&self, draw: &mut dyn DebugDraw, navigation: &Navigation, config: &DebugConfig) {
        if let Brain::Guard(guard) = self {
            guard.debug_render(draw, navigation, config);
        }
    }

    /// Give pooled resources back before the agent is destroyed
    pub fn release(&mut self, navigation: &mut Navigation) {
        if let Brain::Guard(guard) = self {
            guard.release(navigation);
        }
    }

    /// Guard behaviour state, if this is a guard
    pub fn guard_state(&self) -> Option<GuardState> {
        match self {
            Brain::Guard(guard) => Some(guard.state()),
            Brain::Player(_) => None,
        }
    }

    /// Guard brain, if this is a guard
    pub fn as_guard(&self) -> Option<&GuardBrain> {
        match self {
            Brain::Guard(guard) => Some(guard),
            Brain::Player(_) => None,
        }
    }

    /// Mutable guard brain, if this is a guard
    pub fn as_guard_mut(&mut self) -> Option<&mut GuardBrain> {
        match self {
            Brain::Guard(guard) => Some(guard),
            Brain::Player(_) => None,
        }
    }

    /// Replace the player input, if this is the player
    pub fn set_player_input(&mut self, input: PlayerInput) -> bool {
        match self {
            Brain::Player(player) => {
                player.set_input(input);
                true
            }
            Brain::Guard(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AgentState, GuardSensors};
    use crate::core::{GuardConfig, NavConfig, PlayerConfig};
    use crate::physics::{Physics, SensorId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_dispatch_by_kind() {
        let physics = Physics::new();
        let mut navigation =
            Navigation::from_obstacles(10.0, 10.0, &[], NavConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = EventQueue::new();

        let mut guard = Brain::Guard(GuardBrain::new(
            GuardConfig::default(),
            GuardSensors::new(SensorId(0), SensorId(1), SensorId(2)),
        ));
        let mut player = Brain::Player(PlayerBrain::new(PlayerConfig::default()));
        let mut body = AgentState::default();

        let mut ctx = BrainContext {
            dt: 0.1,
            entity: Entity::DANGLING,
            navigation: &mut navigation,
            world: &physics,
            rng: &mut rng,
            events: &mut events,
            player: None,
        };
        guard.on_initialize(&body, &mut ctx);
        player.on_initialize(&body, &mut ctx);
        guard.update(&mut body, &mut ctx);
        player.update(&mut body, &mut ctx);

        assert_eq!(guard.kind(), "Guard");
        assert_eq!(guard.guard_state(), Some(GuardState::Watch));
        assert_eq!(player.guard_state(), None);
        assert!(player.set_player_input(PlayerInput::default()));
        assert!(!guard.set_player_input(PlayerInput::default()));

        assert_eq!(navigation.pool().active_count(), 1);
        guard.release(&mut navigation);
        player.release(&mut navigation);
        assert_eq!(navigation.pool().active_count(), 0);
    }
}
