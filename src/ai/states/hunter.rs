//! Apex actor: races for the power-up, then runs down its prey

use super::AgentContext;
use crate::ai::fsm::{State, StateName, Transition};
use crate::ai::steering::{Pursue, SteeringBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunterState {
    SeekPowerUp,
    /// Boosted; chases the nearest prey until the timer fires
    PowerUpActive,
}

impl StateName for HunterState {
    fn name(&self) -> &'static str {
        match self {
            Self::SeekPowerUp => "SeekPowerUp",
            Self::PowerUpActive => "PowerUpActive",
        }
    }
}

impl<'a> State<AgentContext<'a>> for HunterState {
    fn enter(&mut self, ctx: &mut AgentContext<'a>) {
        if *self == Self::PowerUpActive {
            let config = ctx.config;
            ctx.body.boost(config.hunter.power_up_multiplier);
            ctx.begin_power_up(config.hunter.power_up_duration);
            ctx.nav.reset();
        }
    }

    fn update(&mut self, ctx: &mut AgentContext<'a>) -> Transition<Self> {
        match self {
            Self::SeekPowerUp => {
                if ctx.claim_power_up() {
                    return Transition::To(Self::PowerUpActive);
                }
                seek_power_up(ctx);
            }
            Self::PowerUpActive => chase(ctx),
        }
        Transition::None
    }

    fn exit(&mut self, ctx: &mut AgentContext<'a>) {
        if *self == Self::PowerUpActive {
            let config = ctx.config;
            ctx.body.restore_speed();
            ctx.end_power_up(config.hunter.power_up_cooldown);
            ctx.nav.reset();
        }
    }
}

fn seek_power_up(ctx: &mut AgentContext<'_>) {
    let goal = ctx.map.power_up_node().filter(|_| !ctx.map.is_power_up_active());
    let Some(goal) = goal else {
        // Someone else holds it
        ctx.wander();
        return;
    };

    let follower = &ctx.nav.follower;
    if (follower.is_exhausted() || follower.goal() != Some(goal)) && !ctx.plan_path(goal, None) {
        ctx.wander();
        return;
    }
    if !ctx.steer_along_path() {
        ctx.wander();
    }
}

/// Re-plan to the prey's tile every tick; close in directly once sharing it
fn chase(ctx: &mut AgentContext<'_>) {
    let config = ctx.config;
    let position = ctx.body.position;
    let Some(prey) = ctx
        .sight
        .nearest_of(ctx.entity, position, config.hunter.prey)
        .copied()
    else {
        ctx.wander();
        return;
    };

    let here = ctx.tile();
    let prey_tile = ctx
        .map
        .quantize(prey.position)
        .filter(|&tile| Some(tile) != here);
    if let Some(goal) = prey_tile {
        if ctx.plan_path(goal, Some(prey.position)) && ctx.steer_along_path() {
            return;
        }
    }

    let pursue = Pursue::new(
        prey.position,
        prey.velocity,
        config.steering.pursue_lookahead,
    );
    let force = pursue.calculate(&ctx.body.kinematics());
    ctx.body.apply_force(force);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StateMachine;
    use crate::ai::sight::ActorSnapshot;
    use crate::ai::states::testing::Rig;
    use crate::ecs::Role;
    use glam::Vec2;

    fn prey(rig: &Rig, position: Vec2) -> ActorSnapshot {
        ActorSnapshot {
            entity: rig.other_entity(),
            role: Role::Player,
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            hidden: false,
            shielded: false,
        }
    }

    #[test]
    fn test_heads_for_inactive_power_up() {
        let mut rig = Rig::new(&["....P"], Role::Hunter, 0, 0);
        let mut fsm = StateMachine::new(HunterState::SeekPowerUp);

        assert!(fsm.update(&mut rig.idle_ctx()).is_none());

        assert_eq!(rig.nav.follower.goal(), Some(4));
        assert!(rig.body.acceleration.x > 0.0);
    }

    #[test]
    fn test_wanders_while_power_up_taken() {
        let mut rig = Rig::new(&["....P"], Role::Hunter, 0, 0);
        assert!(rig.map.activate_power_up());
        let mut fsm = StateMachine::new(HunterState::SeekPowerUp);

        fsm.update(&mut rig.idle_ctx());

        assert!(rig.nav.follower.is_exhausted());
        assert_eq!(fsm.current(), &HunterState::SeekPowerUp);
    }

    #[test]
    fn test_power_up_boosts_then_reverts() {
        let mut rig = Rig::new(&["P...."], Role::Hunter, 0, 0);
        let mut fsm = StateMachine::new(HunterState::SeekPowerUp);

        let change = fsm.update(&mut rig.idle_ctx()).unwrap();
        assert_eq!((change.from, change.to), ("SeekPowerUp", "PowerUpActive"));
        assert_eq!(rig.body.top_speed, rig.body.base_speed * 2.0);
        assert!(rig.status.is_active());
        assert_eq!(rig.timers.next_deadline(), Some(10.0));

        rig.now = 10.0;
        fsm.transition(&mut rig.idle_ctx(), HunterState::SeekPowerUp);
        assert_eq!(rig.body.top_speed, rig.body.base_speed);
        assert!(!rig.status.is_active());
        assert!(!rig.map.is_power_up_active());
        assert!(rig.timers.is_empty());
    }

    #[test]
    fn test_chases_prey_tile() {
        let mut rig = Rig::new(&["P...."], Role::Hunter, 0, 0);
        let mut fsm = StateMachine::new(HunterState::SeekPowerUp);
        fsm.update(&mut rig.idle_ctx());

        let target = prey(&rig, Vec2::new(4.5, 0.5));
        rig.actors.push(target);
        rig.body.acceleration = Vec2::ZERO;
        fsm.update(&mut rig.idle_ctx());

        assert_eq!(rig.nav.follower.goal(), Some(4));
        assert_eq!(rig.nav.anchor, Some(target.position));
        assert!(rig.body.acceleration.x > 0.0);
    }

    #[test]
    fn test_pursues_directly_on_shared_tile() {
        let mut rig = Rig::new(&["P...."], Role::Hunter, 0, 0);
        let mut fsm = StateMachine::new(HunterState::SeekPowerUp);
        fsm.update(&mut rig.idle_ctx());

        rig.actors.push(prey(&rig, Vec2::new(0.9, 0.5)));
        rig.body.acceleration = Vec2::ZERO;
        fsm.update(&mut rig.idle_ctx());

        assert!(rig.nav.follower.is_exhausted());
        assert!(rig.body.acceleration.x > 0.0);
    }
}
