//! AI and navigation core for a tile-based pursuit game
//!
//! This crate provides:
//! - A tile graph with Halton obstacle placement and a movable power-up
//! - A* pathfinding over an indexed priority queue
//! - Steering behaviors for planar kinematic bodies
//! - Per-role finite state machines and a capture referee
//! - A fixed-tick simulation built on the hecs ECS

pub mod ai;
pub mod core;
pub mod ecs;
pub mod input;
pub mod world;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{Outcome, Path, SteeringBehavior, find_path};
    pub use crate::core::{GameEvent, Simulation, SimulationError, TuningConfig};
    pub use crate::ecs::{Body, Role};
    pub use crate::input::{Direction, DirectionalInput, MoveInput, NoInput};
    pub use crate::world::{GameMap, Graph, TileKind};
    pub use glam::Vec2;
}
