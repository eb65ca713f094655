//! Input handling module
//!
//! Controllers tell the player's state machine whether and where to move.
//! Raw device handling stays with the embedding application.

mod state;

pub use state::{Direction, DirectionalInput, MoveInput, NoInput};
