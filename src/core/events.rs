//! Gameplay events
//!
//! Double-buffered queue of typed events. Physics contact changes, sound
//! reports and guard outcomes are pushed during frame N and dispatched to
//! brains at the start of frame N+1, so the order in which agents update
//! never changes what they observe.
//!
//! # Example
//!
//! ```ignore
//! // A footstep is emitted while the player sprints
//! events.push(GameEvent::SoundEmitted {
//!     position: player_pos,
//!     volume: 2.0,
//!     source: Some(player),
//! });
//!
//! // Next frame every guard gets a chance to hear it
//! events.swap();
//! for event in events.iter() {
//!     if let GameEvent::SoundEmitted { position, volume, .. } = event {
//!         guard.report_sound(*position, *volume);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec2;
use hecs::Entity;

use crate::physics::{BodyHandle, SensorId};

// ============================================================================
// Event Types
// ============================================================================

/// Gameplay events flowing between physics, brains and the level.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // Physics Events
    // -------------------------------------------------------------------------
    /// A body started overlapping a sensor.
    ContactBegan {
        /// Sensor that reported the overlap
        sensor: SensorId,
        /// Body entering the sensor
        other: BodyHandle,
        /// Collision category bits of the entering body
        other_category: u32,
    },

    /// A body stopped overlapping a sensor.
    ContactEnded {
        /// Sensor that reported the overlap
        sensor: SensorId,
        /// Body leaving the sensor
        other: BodyHandle,
        /// Collision category bits of the leaving body
        other_category: u32,
    },

    // -------------------------------------------------------------------------
    // Perception Events
    // -------------------------------------------------------------------------
    /// Something made a noise.
    SoundEmitted {
        /// World-space origin of the sound
        position: Vec2,
        /// Loudness, compared against a distance-attenuated threshold
        volume: f32,
        /// Entity that made the sound, if any
        source: Option<Entity>,
    },

    // -------------------------------------------------------------------------
    // Game State Events
    // -------------------------------------------------------------------------
    /// A guard caught the player.
    PlayerCaptured {
        /// Guard that made the capture
        guard: Entity,
        /// Where the capture happened
        position: Vec2,
    },

    /// A guard changed behaviour state.
    StateChanged {
        /// Guard entity
        entity: Entity,
        /// New state name
        state: &'static str,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Two-slot event buffer
///
/// Writers push into the incoming slot; readers see what was pushed before
/// the last [`swap`](Self::swap).
#[derive(Debug)]
pub struct EventQueue {
    incoming: VecDeque<GameEvent>,
    ready: VecDeque<GameEvent>,
}

impl EventQueue {
    const INITIAL_CAPACITY: usize = 64;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::INITIAL_CAPACITY)
    }

    /// Queue with room for `capacity` events per frame before reallocating
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            incoming: VecDeque::with_capacity(capacity),
            ready: VecDeque::with_capacity(capacity),
        }
    }

    /// Queue an event for the next frame
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.incoming.push_back(event);
    }

    /// Publish this frame's events
    ///
    /// Call once per frame before dispatching. Anything left unread from the
    /// previous frame is dropped.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.incoming, &mut self.ready);
        self.incoming.clear();
    }

    /// Events published by the last swap
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.ready.iter()
    }

    /// Take the published events
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.ready.drain(..)
    }

    /// True if nothing is published
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    /// Number of published events
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    /// Number of events queued for the next frame
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.incoming.len()
    }

    /// Events queued for the next frame
    pub fn pending(&self) -> impl Iterator<Item = &GameEvent> {
        self.incoming.iter()
    }

    /// Drop everything, published or queued
    pub fn clear(&mut self) {
        self.incoming.clear();
        self.ready.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entity() -> Entity {
        let mut world = hecs::World::new();
        world.spawn(())
    }

    #[test]
    fn test_sound_is_visible_only_after_swap() {
        let mut queue = EventQueue::new();

        queue.push(GameEvent::SoundEmitted {
            position: Vec2::new(1.0, 2.0),
            volume: 3.0,
            source: None,
        });
        assert!(queue.is_empty(), "a sound must wait for the swap");
        assert_eq!(queue.pending_count(), 1);

        queue.swap();
        assert_eq!(queue.len(), 1);
        let events: Vec<_> = queue.iter().collect();
        assert!(matches!(
            events[0],
            GameEvent::SoundEmitted { volume, .. } if (*volume - 3.0).abs() < f32::EPSILON
        ));
    }

    #[test]
    fn test_frames_do_not_mix() {
        let mut queue = EventQueue::new();
        let guard = test_entity();

        queue.push(GameEvent::StateChanged {
            entity: guard,
            state: "Patrol",
        });
        queue.swap();

        queue.push(GameEvent::PlayerCaptured {
            guard,
            position: Vec2::ZERO,
        });

        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::StateChanged { state: "Patrol", .. }));

        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::PlayerCaptured { .. }));
    }

    #[test]
    fn test_drain_and_clear() {
        let mut queue = EventQueue::new();
        let guard = test_entity();

        queue.push(GameEvent::StateChanged {
            entity: guard,
            state: "Watch",
        });
        queue.push(GameEvent::StateChanged {
            entity: guard,
            state: "Suspect",
        });
        queue.swap();

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(queue.is_empty());

        queue.push(GameEvent::StateChanged {
            entity: guard,
            state: "Chase",
        });
        queue.clear();
        assert_eq!(queue.pending_count(), 0);
    }
}
