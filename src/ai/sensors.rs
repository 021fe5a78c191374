//! Sensor capabilities composed into agents
//!
//! Both sensors are fed [`GameEvent::ContactBegan`] and
//! [`GameEvent::ContactEnded`] events and ignore everything that is not
//! addressed to their own [`SensorId`].

use crate::core::GameEvent;
use crate::physics::{BodyHandle, SensorId, category};

/// Counts bodies overlapping a bump sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSensor {
    id: SensorId,
    hits: u32,
    guards: u32,
}

impl LocalSensor {
    /// Sensor with no contacts
    pub fn new(id: SensorId) -> Self {
        Self {
            id,
            hits: 0,
            guards: 0,
        }
    }

    /// Physics sensor this listens to
    pub fn id(&self) -> SensorId {
        self.id
    }

    /// Apply a contact event; returns true if it was for this sensor
    pub fn on_event(&mut self, event: &GameEvent) -> bool {
        match *event {
            GameEvent::ContactBegan {
                sensor,
                other_category,
                ..
            } if sensor == self.id => {
                self.hits += 1;
                if other_category & category::GUARD != 0 {
                    self.guards += 1;
                }
                true
            }
            GameEvent::ContactEnded {
                sensor,
                other_category,
                ..
            } if sensor == self.id => {
                self.hits = self.hits.saturating_sub(1);
                if other_category & category::GUARD != 0 {
                    self.guards = self.guards.saturating_sub(1);
                }
                true
            }
            _ => false,
        }
    }

    /// Anything at all is touching
    pub fn has_obstacle(&self) -> bool {
        self.hits > 0
    }

    /// Other guards touching
    pub fn guard_count(&self) -> u32 {
        self.guards
    }

    /// Static geometry touching
    pub fn wall_count(&self) -> u32 {
        self.hits.saturating_sub(self.guards)
    }

    /// At least one wall is touching
    pub fn has_wall(&self) -> bool {
        self.wall_count() > 0
    }
}

/// Tracks the player body inside a vision cone
///
/// A sighting here only means the player overlaps the cone shape; the owner
/// still has to confirm line of sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionSensor {
    id: SensorId,
    target: Option<BodyHandle>,
}

impl VisionSensor {
    /// Sensor seeing nothing
    pub fn new(id: SensorId) -> Self {
        Self { id, target: None }
    }

    /// Physics sensor this listens to
    pub fn id(&self) -> SensorId {
        self.id
    }

    /// Apply a contact event; returns true if it was for this sensor
    pub fn on_event(&mut self, event: &GameEvent) -> bool {
        match *event {
            GameEvent::ContactBegan {
                sensor,
                other,
                other_category,
            } if sensor == self.id => {
                if other_category & category::PLAYER != 0 {
                    self.target = Some(other);
                }
                true
            }
            GameEvent::ContactEnded { sensor, other, .. } if sensor == self.id => {
                if self.target == Some(other) {
                    self.target = None;
                }
                true
            }
            _ => false,
        }
    }

    /// Body currently inside the cone
    pub fn sighted(&self) -> Option<BodyHandle> {
        self.target
    }

    /// Forget the current sighting
    pub fn clear(&mut self) {
        self.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier2d::dynamics::RigidBodyHandle;

    fn body(index: u32) -> BodyHandle {
        BodyHandle(RigidBodyHandle::from_raw_parts(index, 0))
    }

    fn began(sensor: u32, other: u32, other_category: u32) -> GameEvent {
        GameEvent::ContactBegan {
            sensor: SensorId(sensor),
            other: body(other),
            other_category,
        }
    }

    fn ended(sensor: u32, other: u32, other_category: u32) -> GameEvent {
        GameEvent::ContactEnded {
            sensor: SensorId(sensor),
            other: body(other),
            other_category,
        }
    }

    #[test]
    fn test_local_sensor_separates_walls_and_guards() {
        let mut sensor = LocalSensor::new(SensorId(3));
        assert!(sensor.on_event(&began(3, 1, category::STATIC)));
        assert!(sensor.on_event(&began(3, 2, category::GUARD)));

        assert!(sensor.has_obstacle());
        assert_eq!(sensor.wall_count(), 1);
        assert_eq!(sensor.guard_count(), 1);

        sensor.on_event(&ended(3, 1, category::STATIC));
        assert!(!sensor.has_wall());
        assert!(sensor.has_obstacle());

        sensor.on_event(&ended(3, 2, category::GUARD));
        assert!(!sensor.has_obstacle());
    }

    #[test]
    fn test_local_sensor_ignores_other_ids() {
        let mut sensor = LocalSensor::new(SensorId(0));
        assert!(!sensor.on_event(&began(1, 1, category::STATIC)));
        assert!(!sensor.has_obstacle());

        // Unbalanced end events never underflow
        sensor.on_event(&ended(0, 1, category::GUARD));
        assert_eq!(sensor.wall_count(), 0);
    }

    #[test]
    fn test_vision_tracks_player_only() {
        let mut vision = VisionSensor::new(SensorId(7));
        vision.on_event(&began(7, 4, category::GUARD));
        assert_eq!(vision.sighted(), None);

        vision.on_event(&began(7, 5, category::PLAYER));
        assert_eq!(vision.sighted(), Some(body(5)));

        // Another body leaving does not clear the sighting
        vision.on_event(&ended(7, 4, category::GUARD));
        assert_eq!(vision.sighted(), Some(body(5)));

        vision.on_event(&ended(7, 5, category::PLAYER));
        assert_eq!(vision.sighted(), None);
    }
}
