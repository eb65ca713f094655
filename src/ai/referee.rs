//! Capture detection and match outcome
//!
//! The referee only reads a snapshot; the simulation applies the removals it
//! reports once the scan is complete.

use std::fmt;

use hecs::Entity;
use rustc_hash::FxHashSet;

use super::sight::ActorSnapshot;
use crate::core::TuningConfig;
use crate::ecs::Role;

/// Capture distances. Only the player catches evaders and only the hunter
/// catches the player, whatever the hunter happens to be chasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRules {
    /// Evader caught by the player within this distance
    pub capture_radius: f32,
    /// Unshielded player caught by the hunter within this distance
    pub apex_radius: f32,
}

impl CaptureRules {
    #[must_use]
    pub fn from_config(config: &TuningConfig) -> Self {
        Self {
            capture_radius: config.capture.capture_radius,
            apex_radius: config.capture.apex_radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub victim: Entity,
    pub captor: Entity,
}

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every evader was caught
    Won,
    /// The player was caught
    Lost,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

/// Actor counts the outcome is decided from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Census {
    pub players_spawned: usize,
    pub players_alive: usize,
    pub evaders_spawned: usize,
    pub evaders_alive: usize,
}

/// Find every capture in `actors`. Each victim appears at most once, caught
/// by its nearest qualifying captor.
#[must_use]
pub fn scan(actors: &[ActorSnapshot], rules: &CaptureRules) -> Vec<Capture> {
    let mut caught = FxHashSet::default();
    let mut captures = Vec::new();

    for victim in actors.iter().filter(|a| !a.hidden) {
        let captor = match victim.role {
            Role::Evader => {
                nearest_within(actors, victim, rules.capture_radius, |a| a.role == Role::Player)
            }
            Role::Player if !victim.shielded => {
                nearest_within(actors, victim, rules.apex_radius, |a| a.role == Role::Hunter)
            }
            _ => None,
        };

        if let Some(captor) = captor {
            if caught.insert(victim.entity) {
                captures.push(Capture {
                    victim: victim.entity,
                    captor,
                });
            }
        }
    }
    captures
}

fn nearest_within(
    actors: &[ActorSnapshot],
    victim: &ActorSnapshot,
    radius: f32,
    is_captor: impl Fn(&ActorSnapshot) -> bool,
) -> Option<Entity> {
    actors
        .iter()
        .filter(|a| a.entity != victim.entity && is_captor(a))
        .map(|a| (a.position.distance(victim.position), a.entity))
        .filter(|&(distance, _)| distance <= radius)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, entity)| entity)
}

/// Terminal outcome, if any. A lost player beats a cleared board.
#[must_use]
pub fn decide(census: &Census) -> Option<Outcome> {
    if census.players_spawned > 0 && census.players_alive == 0 {
        Some(Outcome::Lost)
    } else if census.evaders_spawned > 0 && census.evaders_alive == 0 {
        Some(Outcome::Won)
    } else {
        None
    }
}
