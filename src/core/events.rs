//! Simulation events
//!
//! A double-buffered queue of [`GameEvent`]s. Systems push while a tick runs;
//! the simulation swaps buffers at the end of the tick, so observers (logging,
//! a renderer, tests) read a complete and stable set of the last tick's
//! events.

use std::collections::VecDeque;

use glam::Vec2;
use hecs::Entity;

use crate::ai::Outcome;
use crate::ecs::Role;

// ============================================================================
// Event Types
// ============================================================================

/// Things that happened in the simulation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    /// An actor entered the world.
    ActorSpawned {
        entity: Entity,
        role: Role,
        position: Vec2,
    },

    /// An actor's behavior state changed.
    StateChanged {
        entity: Entity,
        from: &'static str,
        to: &'static str,
    },

    // -------------------------------------------------------------------------
    // Power-up
    // -------------------------------------------------------------------------
    /// An actor claimed the power-up tile.
    PowerUpActivated {
        entity: Entity,
        role: Role,
        /// Game time the effect ends
        expires_at: f64,
    },

    /// A power-up ran out or was released by a removed actor.
    PowerUpExpired { entity: Entity },

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------
    /// No route exists between two tiles.
    PathUnreachable {
        entity: Entity,
        from: usize,
        to: usize,
    },

    // -------------------------------------------------------------------------
    // Referee
    // -------------------------------------------------------------------------
    /// An actor was caught and removed.
    ActorCaptured { victim: Entity, captor: Entity },

    /// The match ended.
    GameOver { outcome: Outcome },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Events pushed during tick N become readable once tick N ends, and stay
/// readable until tick N+1 ends.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<GameEvent>,
    /// Events from the last finished tick
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    /// Initial capacity of each buffer
    const CAPACITY: usize = 64;

    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(Self::CAPACITY),
            processing: VecDeque::with_capacity(Self::CAPACITY),
        }
    }

    /// Push an event; it becomes visible after the next `swap()`.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Publish pending events and start a fresh pending buffer.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over the published events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
