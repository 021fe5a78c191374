//! Navigation and guard AI for a top-down stealth game
//!
//! This crate provides:
//! - Navigation mesh construction from static colliders (clipper2 + earcutr)
//! - Path queries with a bounded Dijkstra search and funnel string pulling
//! - A fixed pool of reusable paths
//! - Guard and player brains driven by a hecs level runtime
//! - Physics collaboration with rapier2d

pub mod ai;
pub mod core;
pub mod geometry;
pub mod level;
pub mod nav;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier2d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{AgentBody, AgentState, Brain, GuardState, PlayerInput};
    pub use crate::core::{
        DebugConfig, DebugDraw, DebugLines, GameEvent, GuardConfig, LevelConfig, NavConfig,
        NavError, PlayerConfig,
    };
    pub use crate::level::Level;
    pub use crate::nav::{NavMesh, NavPath, Navigation, PathHandle};
    pub use crate::physics::{CollisionWorld, Physics, category};
    pub use glam::Vec2;
}
