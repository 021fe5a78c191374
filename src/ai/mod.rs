//! Agent behaviour module
//!
//! Provides the agent body seam, sensors, steering behaviors and the player
//! and guard brains.

mod body;
mod brain;
mod guard;
mod player;
mod sensors;
mod steering;

pub use body::{AgentBody, AgentState};
pub use brain::{Brain, BrainContext, PlayerSighting};
pub use guard::{GuardBrain, GuardSensors, GuardState};
pub use player::{PlayerBrain, PlayerInput};
pub use sensors::{LocalSensor, VisionSensor};
pub use steering::{Arrive, Face, Seek, SteeringBehavior, SteeringOutput};
