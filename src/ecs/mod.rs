//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
mod world;

pub use components::{Body, Name, Navigator, PowerUpStatus, Role};
pub use world::World;
