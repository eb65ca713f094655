//! Controlled actor: moves on input, can grab the power-up

use super::AgentContext;
use crate::ai::fsm::{State, StateName, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Moving,
}

impl StateName for PlayerState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Moving => "Moving",
        }
    }
}

impl<'a> State<AgentContext<'a>> for PlayerState {
    fn enter(&mut self, ctx: &mut AgentContext<'a>) {
        if *self == Self::Idle {
            ctx.body.stop();
        }
    }

    fn update(&mut self, ctx: &mut AgentContext<'a>) -> Transition<Self> {
        try_power_up(ctx);

        let moving = ctx.input.is_moving();
        match self {
            Self::Idle if moving => Transition::To(Self::Moving),
            Self::Idle => Transition::None,
            Self::Moving if !moving => Transition::To(Self::Idle),
            Self::Moving => {
                let direction = ctx.input.desired_direction().normalize_or_zero();
                ctx.body.apply_force(direction * ctx.config.player.move_force);
                Transition::None
            }
        }
    }
}

/// Claim the power-up tile when standing on it: faster and shielded
fn try_power_up(ctx: &mut AgentContext<'_>) {
    if !ctx.claim_power_up() {
        return;
    }
    let config = ctx.config;
    let player = &config.player;
    ctx.body.boost(player.power_up_multiplier);
    ctx.status.shielded = true;
    ctx.begin_power_up(player.power_up_duration);
}

pub(super) fn release_power_up(ctx: &mut AgentContext<'_>) {
    ctx.body.restore_speed();
    ctx.status.shielded = false;
    let config = ctx.config;
    ctx.end_power_up(config.player.power_up_cooldown);
}
