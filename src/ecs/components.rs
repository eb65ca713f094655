//! Actor components

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ai::{Kinematics, PathFollower, Wander};
use crate::core::TimerId;

/// Which side of the chase an actor is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Controlled actor; catches evaders, flees the hunter
    Player,
    /// AI actor that runs from the player
    Evader,
    /// AI apex predator
    Hunter,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Evader => "evader",
            Self::Hunter => "hunter",
        }
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Point-mass kinematics on the ground plane (`y` is world z)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec2,
    /// Position at the start of the last integration step
    pub previous_position: Vec2,
    pub velocity: Vec2,
    /// Accumulated force / mass, cleared by `integrate`
    pub acceleration: Vec2,
    /// Current speed cap
    pub top_speed: f32,
    /// Speed cap without any power-up
    pub base_speed: f32,
    /// Cap on a single steering force
    pub max_force: f32,
    pub mass: f32,
    /// Kinetic friction magnitude
    pub friction: f32,
    /// Half the body's footprint
    pub radius: f32,
}

impl Body {
    /// Create a body at rest
    #[must_use]
    pub fn new(position: Vec2, top_speed: f32, max_force: f32) -> Self {
        Self {
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            top_speed,
            base_speed: top_speed,
            max_force,
            mass: 1.0,
            friction: 0.0,
            radius: 0.5,
        }
    }

    #[must_use]
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Accumulate a force for the next integration step
    pub fn apply_force(&mut self, force: Vec2) {
        if self.mass > 0.0 {
            self.acceleration += force / self.mass;
        }
    }

    /// Advance one step: velocity from acceleration, capped at top speed,
    /// then position from velocity. Clears the accumulated acceleration.
    pub fn integrate(&mut self, dt: f32) {
        self.previous_position = self.position;
        self.velocity += self.acceleration * dt;
        self.velocity = self.velocity.clamp_length_max(self.top_speed.max(0.0));
        self.position += self.velocity * dt;
        self.acceleration = Vec2::ZERO;
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }

    /// Scale the speed cap relative to the base speed
    pub fn boost(&mut self, multiplier: f32) {
        self.top_speed = self.base_speed * multiplier;
    }

    pub fn restore_speed(&mut self) {
        self.top_speed = self.base_speed;
    }

    /// Snapshot for steering behaviors
    #[must_use]
    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            position: self.position,
            velocity: self.velocity,
            max_speed: self.top_speed,
            max_force: self.max_force,
        }
    }
}

/// Path following and wandering state of an AI actor
#[derive(Debug, Clone)]
pub struct Navigator {
    pub follower: PathFollower,
    pub wander: Wander,
    /// Where the tracked target stood when the current path was planned
    pub anchor: Option<Vec2>,
}

impl Navigator {
    #[must_use]
    pub fn new(wander: Wander) -> Self {
        Self {
            follower: PathFollower::default(),
            wander,
            anchor: None,
        }
    }

    /// Whether the path ran out or the target moved more than `threshold`
    /// since it was planned
    #[must_use]
    pub fn needs_new_path(&self, target: Option<Vec2>, threshold: f32) -> bool {
        if self.follower.is_exhausted() {
            return true;
        }
        match (self.anchor, target) {
            (Some(anchor), Some(target)) => anchor.distance(target) > threshold,
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.follower.clear();
        self.anchor = None;
    }
}

/// Power-up bookkeeping for one actor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerUpStatus {
    /// Expiry timer of the power-up currently held
    pub timer: Option<TimerId>,
    /// Invisible to predators and immune to capture
    pub hidden: bool,
    /// Immune to the hunter
    pub shielded: bool,
    /// Game time before which no new power-up may be claimed
    pub cooldown_until: f64,
}

impl PowerUpStatus {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    #[must_use]
    pub fn is_eligible(&self, now: f64) -> bool {
        !self.is_active() && now >= self.cooldown_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate_caps_speed() {
        let mut body = Body::new(Vec2::ZERO, 5.0, 100.0);
        body.apply_force(Vec2::new(1000.0, 0.0));
        body.integrate(0.1);

        assert!((body.velocity.length() - 5.0).abs() < 1e-5);
        assert!((body.position.x - 0.5).abs() < 1e-5);
        assert_eq!(body.previous_position, Vec2::ZERO);
        assert_eq!(body.acceleration, Vec2::ZERO);
    }

    #[test]
    fn test_force_scales_with_mass() {
        let mut body = Body::new(Vec2::ZERO, 50.0, 100.0);
        body.mass = 2.0;
        body.apply_force(Vec2::new(10.0, 0.0));
        body.integrate(1.0);
        assert!((body.velocity.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_boost_and_restore() {
        let mut body = Body::new(Vec2::ZERO, 4.0, 10.0);
        body.boost(2.5);
        assert_eq!(body.top_speed, 10.0);
        body.restore_speed();
        assert_eq!(body.top_speed, 4.0);
    }

    #[test]
    fn test_needs_new_path() {
        let mut nav = Navigator::new(Wander::new(1.0, 1.0, 0.1));
        assert!(nav.needs_new_path(None, 10.0));

        let graph = crate::world::Graph::from_layout(&["..P"], 1.0).unwrap();
        let path = crate::ai::find_path(&graph, 0, 2).unwrap();
        nav.follower.follow(path);
        nav.anchor = Some(Vec2::ZERO);

        assert!(!nav.needs_new_path(Some(Vec2::new(3.0, 4.0)), 10.0));
        assert!(nav.needs_new_path(Some(Vec2::new(30.0, 4.0)), 10.0));
        assert!(!nav.needs_new_path(None, 10.0));
    }

    #[test]
    fn test_power_up_eligibility() {
        let mut status = PowerUpStatus::default();
        assert!(status.is_eligible(0.0));
        status.cooldown_until = 5.0;
        assert!(!status.is_eligible(4.9));
        assert!(status.is_eligible(5.0));
    }
}
