//! Movement intent from held directions

use glam::Vec2;
use rustc_hash::FxHashSet;

use crate::ai::rotate;

/// Where a controlled actor wants to go
pub trait MoveInput {
    /// Whether any movement is requested
    fn is_moving(&self) -> bool;
    /// Requested planar direction (unit length, or zero when not moving)
    fn desired_direction(&self) -> Vec2;
}

/// A held movement direction, relative to the facing vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// Held directions plus a facing vector (typically the camera's)
#[derive(Debug, Clone)]
pub struct DirectionalInput {
    held: FxHashSet<Direction>,
    facing: Vec2,
}

impl DirectionalInput {
    #[must_use]
    pub fn new(facing: Vec2) -> Self {
        Self {
            held: FxHashSet::default(),
            facing,
        }
    }

    pub fn press(&mut self, direction: Direction) {
        self.held.insert(direction);
    }

    pub fn release(&mut self, direction: Direction) {
        self.held.remove(&direction);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    #[must_use]
    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains(&direction)
    }

    pub fn set_facing(&mut self, facing: Vec2) {
        self.facing = facing;
    }

    #[must_use]
    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    /// Net (forward, left) axes; opposite directions cancel
    fn axes(&self) -> (f32, f32) {
        let held = |direction| if self.is_held(direction) { 1.0 } else { 0.0 };
        (
            held(Direction::Forward) - held(Direction::Backward),
            held(Direction::Left) - held(Direction::Right),
        )
    }

    /// Counter-clockwise offset from the facing: 0 ahead, π/4 forward-left,
    /// π/2 left, π behind, -π/2 right and so on
    #[must_use]
    pub fn angle_offset(&self) -> f32 {
        let (forward, left) = self.axes();
        left.atan2(forward)
    }
}

impl MoveInput for DirectionalInput {
    fn is_moving(&self) -> bool {
        self.axes() != (0.0, 0.0)
    }

    fn desired_direction(&self) -> Vec2 {
        if !self.is_moving() {
            return Vec2::ZERO;
        }
        // Planar y is world z, which flips the turning sense
        rotate(self.facing.normalize_or_zero(), -self.angle_offset())
    }
}

/// No movement requested (AI actors, headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl MoveInput for NoInput {
    fn is_moving(&self) -> bool {
        false
    }

    fn desired_direction(&self) -> Vec2 {
        Vec2::ZERO
    }
}
