//! Core module
//!
//! Configuration, errors, events and the random/debug seams shared by the
//! navigation and agent layers

mod config;
mod debug;
mod error;
mod events;
mod random;

pub use config::{DistanceMetric, GuardConfig, LevelConfig, NavConfig, PlayerConfig, QueryConfig};
pub use debug::{Color, DebugConfig, DebugDraw, DebugLines, DebugShape};
pub use error::{CapacityKind, ConfigError, NavError};
pub use events::{EventQueue, GameEvent};
pub use random::RandomSource;
