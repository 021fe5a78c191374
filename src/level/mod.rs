//! Level runtime
//!
//! Owns the hecs world, the physics collaborator and the navigation facade,
//! and drives agent brains once per frame.

mod components;
mod runtime;

pub use components::{Body, Name, Obstacle, Sensors};
pub use runtime::Level;
