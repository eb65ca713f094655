//! What actors can see of each other
//!
//! Decisions within a tick read a snapshot frozen before anyone moves, so the
//! order actors are updated in never changes what they see.

use glam::Vec2;
use hecs::Entity;

use crate::ecs::Role;

/// Frozen view of one actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorSnapshot {
    pub entity: Entity,
    pub role: Role,
    pub position: Vec2,
    pub previous_position: Vec2,
    pub velocity: Vec2,
    /// Invisible and untouchable
    pub hidden: bool,
    /// Immune to the hunter
    pub shielded: bool,
}

impl ActorSnapshot {
    /// Movement over the last step
    #[must_use]
    pub fn displacement(&self) -> Vec2 {
        self.position - self.previous_position
    }

    /// Whether this actor's last step points at `target`, within
    /// `threshold` (cosine of the widest angle that still counts).
    #[must_use]
    pub fn is_moving_towards(&self, target: Vec2, threshold: f32) -> bool {
        let motion = self.displacement().normalize_or_zero();
        let towards = (target - self.position).normalize_or_zero();
        motion != Vec2::ZERO && towards != Vec2::ZERO && motion.dot(towards) > threshold
    }
}

/// Read-only view of all actors for one decision
#[derive(Debug, Clone, Copy)]
pub struct Sight<'a> {
    actors: &'a [ActorSnapshot],
}

impl<'a> Sight<'a> {
    #[must_use]
    pub fn new(actors: &'a [ActorSnapshot]) -> Self {
        Self { actors }
    }

    /// Nothing visible (used outside the tick's decision pass)
    #[must_use]
    pub fn blind() -> Self {
        Self { actors: &[] }
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&'a ActorSnapshot> {
        self.actors.iter().find(|actor| actor.entity == entity)
    }

    /// Closest visible actor matching `filter`, excluding `viewer`
    pub fn nearest(
        &self,
        viewer: Entity,
        from: Vec2,
        filter: impl Fn(&ActorSnapshot) -> bool,
    ) -> Option<&'a ActorSnapshot> {
        self.actors
            .iter()
            .filter(|actor| actor.entity != viewer && !actor.hidden && filter(actor))
            .min_by(|a, b| {
                a.position
                    .distance_squared(from)
                    .total_cmp(&b.position.distance_squared(from))
            })
    }

    /// Closest visible actor of `role`
    #[must_use]
    pub fn nearest_of(&self, viewer: Entity, from: Vec2, role: Role) -> Option<&'a ActorSnapshot> {
        self.nearest(viewer, from, |actor| actor.role == role)
    }

    /// Closest actor an evader has to run from
    #[must_use]
    pub fn nearest_threat(
        &self,
        viewer: Entity,
        from: Vec2,
        hunter_prey: Role,
    ) -> Option<&'a ActorSnapshot> {
        self.nearest(viewer, from, |actor| {
            chases_evaders(actor.role, hunter_prey)
        })
    }
}

/// Whether actors of `role` go after evaders, so evaders flee them
#[must_use]
pub fn chases_evaders(role: Role, hunter_prey: Role) -> bool {
    match role {
        Role::Player => true,
        Role::Hunter => hunter_prey == Role::Evader,
        Role::Evader => false,
    }
}
