//! Per-role behavior states
//!
//! Each role has a closed set of states driven by a [`StateMachine`]. States
//! decide movement by applying forces to the actor's [`Body`]; the
//! simulation integrates afterwards.

mod evader;
mod hunter;
mod player;

pub use evader::EvaderState;
pub use hunter::HunterState;
pub use player::PlayerState;

use glam::Vec2;
use hecs::Entity;
use rand_chacha::ChaCha8Rng;

use super::fsm::{StateChange, StateMachine, StateName};
use super::sight::Sight;
use super::steering::{Arrive, AvoidObstacles, Seek, SteeringBehavior};
use crate::core::{EventQueue, GameEvent, Scheduler, TimerKind, TuningConfig};
use crate::ecs::{Body, Navigator, PowerUpStatus, Role};
use crate::input::MoveInput;
use crate::world::{GameMap, NodeId};

/// Everything a state may read or touch while deciding for one actor
pub struct AgentContext<'a> {
    pub entity: Entity,
    pub role: Role,
    /// Game time in seconds
    pub now: f64,
    pub body: &'a mut Body,
    pub nav: &'a mut Navigator,
    pub status: &'a mut PowerUpStatus,
    pub map: &'a mut GameMap,
    pub timers: &'a mut Scheduler,
    pub events: &'a mut EventQueue,
    pub rng: &'a mut ChaCha8Rng,
    pub config: &'a TuningConfig,
    pub input: &'a dyn MoveInput,
    pub sight: Sight<'a>,
}

impl AgentContext<'_> {
    /// Tile under the actor
    #[must_use]
    pub fn tile(&self) -> Option<NodeId> {
        self.map.quantize(self.body.position)
    }

    /// Plan a path from the current tile to `goal` and start following it.
    ///
    /// `anchor` records where the tracked target stood, for the replanning
    /// throttle. Returns `false` (and drops any old path) when no route
    /// exists.
    pub fn plan_path(&mut self, goal: NodeId, anchor: Option<Vec2>) -> bool {
        let Some(start) = self.tile() else {
            self.nav.reset();
            return false;
        };
        match self.map.request_path(start, goal) {
            Some(path) => {
                log::debug!(
                    "{} {:?} planned {} -> {} ({} tiles)",
                    self.role.as_str(),
                    self.entity,
                    start,
                    goal,
                    path.len()
                );
                self.nav.follower.follow(path);
                self.nav.anchor = anchor;
                true
            }
            None => {
                self.events.push(GameEvent::PathUnreachable {
                    entity: self.entity,
                    from: start,
                    to: goal,
                });
                self.nav.reset();
                false
            }
        }
    }

    /// Steer towards the next waypoint, slowing on the last one.
    ///
    /// Returns `false` when there is nothing left to follow.
    pub fn steer_along_path(&mut self) -> bool {
        let radius = self.map.tile_size() * self.config.steering.waypoint_tolerance;
        let Some(target) = self
            .nav
            .follower
            .advance_if_reached(self.map, self.body.position, radius)
        else {
            return false;
        };

        let kinematics = self.body.kinematics();
        let force = if self.nav.follower.remaining() <= 1 {
            Arrive::new(target, self.config.steering.arrive_radius).calculate(&kinematics)
        } else {
            Seek::new(target).calculate(&kinematics)
        };
        self.body.apply_force(force);
        true
    }

    /// Drift around, turning away from nearby obstacles
    pub fn wander(&mut self) {
        let steering = &self.config.steering;
        let kinematics = self.body.kinematics();
        let reach = steering.avoid_lookahead + self.map.tile_size();
        let obstacles = self.map.obstacle_positions(self.body.position, reach);
        let avoid = AvoidObstacles::new(
            &obstacles,
            steering.avoid_lookahead,
            self.map.tile_size() * 0.5 + self.body.radius,
        );

        let wander = self.nav.wander.steer(&kinematics, &mut *self.rng);
        let force = wander + avoid.calculate(&kinematics);
        self.body.apply_force(force.clamp_length_max(kinematics.max_force));
    }

    /// Standing on the inactive power-up tile while eligible: claim it.
    ///
    /// The tile flip is check-then-set, so of several claimants in one tick
    /// only the first succeeds.
    pub fn claim_power_up(&mut self) -> bool {
        if !self.status.is_eligible(self.now) {
            return false;
        }
        let on_tile = self.tile().is_some() && self.tile() == self.map.power_up_node();
        on_tile && self.map.activate_power_up()
    }

    /// Start the power-up clock for a freshly claimed tile
    pub fn begin_power_up(&mut self, duration: f64) {
        let expires_at = self.now + duration;
        let timer = self
            .timers
            .schedule(self.entity, expires_at, TimerKind::PowerUpExpiry);
        self.status.timer = Some(timer);
        self.events.push(GameEvent::PowerUpActivated {
            entity: self.entity,
            role: self.role,
            expires_at,
        });
        log::info!(
            "{} {:?} activated the power-up until {expires_at:.2}s",
            self.role.as_str(),
            self.entity
        );
    }

    /// Give the tile back and start the cooldown
    pub fn end_power_up(&mut self, cooldown: f64) {
        let Some(timer) = self.status.timer.take() else {
            return;
        };
        // Already gone when the timer itself fired
        self.timers.cancel(timer);
        self.map.reset_power_up();
        self.status.cooldown_until = self.now + cooldown;
        self.events.push(GameEvent::PowerUpExpired {
            entity: self.entity,
        });
        log::info!("{} {:?} power-up expired", self.role.as_str(), self.entity);
    }
}

/// Undo every power-up effect and give the tile back
fn release_stray_power_up(ctx: &mut AgentContext<'_>) {
    let config = ctx.config;
    let cooldown = match ctx.role {
        Role::Player => config.player.power_up_cooldown,
        Role::Evader => config.evader.power_up_cooldown,
        Role::Hunter => config.hunter.power_up_cooldown,
    };
    ctx.body.restore_speed();
    ctx.status.hidden = false;
    ctx.status.shielded = false;
    ctx.end_power_up(cooldown);
}

/// The behavior state machine of one actor
#[derive(Debug)]
pub enum Brain {
    Player(StateMachine<PlayerState>),
    Evader(StateMachine<EvaderState>),
    Hunter(StateMachine<HunterState>),
}

impl Brain {
    /// Initial machine for a role
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Player => Self::Player(StateMachine::new(PlayerState::Idle)),
            Role::Evader => Self::Evader(StateMachine::new(EvaderState::AvoidThreat)),
            Role::Hunter => Self::Hunter(StateMachine::new(HunterState::SeekPowerUp)),
        }
    }

    /// Run one decision step
    pub fn update(&mut self, ctx: &mut AgentContext<'_>) -> Option<StateChange> {
        match self {
            Self::Player(fsm) => fsm.update(ctx),
            Self::Evader(fsm) => fsm.update(ctx),
            Self::Hunter(fsm) => fsm.update(ctx),
        }
    }

    /// The actor's power-up timer fired
    pub fn expire_power_up(&mut self, ctx: &mut AgentContext<'_>) -> Option<StateChange> {
        match self {
            Self::Player(_) => {
                player::release_power_up(ctx);
                None
            }
            Self::Evader(fsm) if fsm.is_in_state(EvaderState::PowerUpActive.name()) => {
                Some(fsm.transition(ctx, EvaderState::AvoidThreat))
            }
            Self::Hunter(fsm) if fsm.is_in_state(HunterState::PowerUpActive.name()) => {
                Some(fsm.transition(ctx, HunterState::SeekPowerUp))
            }
            Self::Evader(_) | Self::Hunter(_) => {
                log::warn!(
                    "{} {:?} held a power-up outside its powered state",
                    ctx.role.as_str(),
                    ctx.entity
                );
                release_stray_power_up(ctx);
                None
            }
        }
    }

    #[must_use]
    pub fn current_state_name(&self) -> &'static str {
        match self {
            Self::Player(fsm) => fsm.current_state_name(),
            Self::Evader(fsm) => fsm.current_state_name(),
            Self::Hunter(fsm) => fsm.current_state_name(),
        }
    }
}
