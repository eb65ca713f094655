//! Game-clock timers
//!
//! Deferred effects are scheduled against the simulation clock and polled
//! once per tick. Each timer names the actor that owns it; the caller decides
//! whether the owner still cares when the timer comes due.

use hecs::Entity;
use rustc_hash::FxHashMap;

use crate::ai::PriorityQueue;

/// Handle of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// End the owner's power-up
    PowerUpExpiry,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    pub id: TimerId,
    pub actor: Entity,
    pub kind: TimerKind,
    pub deadline: f64,
}

/// Deadline-ordered timer set
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    deadlines: PriorityQueue<TimerId, f64>,
    timers: FxHashMap<TimerId, (Entity, TimerKind)>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` for `actor` at game time `deadline`
    pub fn schedule(&mut self, actor: Entity, deadline: f64, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.deadlines.enqueue(id, deadline);
        self.timers.insert(id, (actor, kind));
        id
    }

    /// Cancel one timer. Returns whether it was pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if self.timers.remove(&id).is_none() {
            return false;
        }
        if let Err(err) = self.deadlines.remove(&id) {
            log::error!("Timer {id:?} had no deadline: {err}");
        }
        true
    }

    /// Cancel every timer owned by `actor`. Returns how many were pending.
    pub fn cancel_actor(&mut self, actor: Entity) -> usize {
        let owned: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, (owner, _))| *owner == actor)
            .map(|(&id, _)| id)
            .collect();
        owned.into_iter().filter(|&id| self.cancel(id)).count()
    }

    /// Remove and return all timers due at `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> Vec<Timer> {
        let mut due = Vec::new();
        while let Some((id, deadline)) = self.deadlines.peek() {
            if deadline > now {
                break;
            }
            self.deadlines.dequeue();
            if let Some((actor, kind)) = self.timers.remove(&id) {
                due.push(Timer {
                    id,
                    actor,
                    kind,
                    deadline,
                });
            }
        }
        due
    }

    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Earliest pending deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<f64> {
        self.deadlines.peek().map(|(_, deadline)| deadline)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
