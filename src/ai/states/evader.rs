//! Evading actor: keeps away from its predators and hides on the power-up

use glam::Vec2;
use rand::Rng;

use super::AgentContext;
use crate::ai::fsm::{State, StateName, Transition};
use crate::ai::sight::ActorSnapshot;
use crate::ai::steering::{Flee, SteeringBehavior};
use crate::world::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaderState {
    /// Flee approaching threats, otherwise head for the power-up or roam
    AvoidThreat,
    /// Hidden and untouchable until the power-up timer fires
    PowerUpActive,
}

impl StateName for EvaderState {
    fn name(&self) -> &'static str {
        match self {
            Self::AvoidThreat => "AvoidThreat",
            Self::PowerUpActive => "PowerUpActive",
        }
    }
}

impl<'a> State<AgentContext<'a>> for EvaderState {
    fn enter(&mut self, ctx: &mut AgentContext<'a>) {
        if *self == Self::PowerUpActive {
            ctx.status.hidden = true;
            let duration = ctx.config.evader.power_up_duration;
            ctx.begin_power_up(duration);
        }
    }

    fn update(&mut self, ctx: &mut AgentContext<'a>) -> Transition<Self> {
        match self {
            Self::AvoidThreat => {
                if ctx.claim_power_up() {
                    ctx.nav.reset();
                    return Transition::To(Self::PowerUpActive);
                }
                evade(ctx, true);
            }
            Self::PowerUpActive => evade(ctx, false),
        }
        Transition::None
    }

    fn exit(&mut self, ctx: &mut AgentContext<'a>) {
        if *self == Self::PowerUpActive {
            ctx.status.hidden = false;
            let cooldown = ctx.config.evader.power_up_cooldown;
            ctx.end_power_up(cooldown);
        }
    }
}

/// Replan when needed, then follow the path (or flee/wander without one)
fn evade(ctx: &mut AgentContext<'_>, seek_power_up: bool) {
    let config = ctx.config;
    let position = ctx.body.position;
    let threat = ctx
        .sight
        .nearest_threat(ctx.entity, position, config.hunter.prey)
        .copied();

    if ctx
        .nav
        .needs_new_path(threat.map(|t| t.position), config.replan_threshold)
    {
        replan(ctx, threat.as_ref(), seek_power_up);
    }

    if ctx.steer_along_path() {
        return;
    }
    match threat {
        Some(threat) => {
            let force = Flee::new(threat.position).calculate(&ctx.body.kinematics());
            ctx.body.apply_force(force);
        }
        None => ctx.wander(),
    }
}

fn replan(ctx: &mut AgentContext<'_>, threat: Option<&ActorSnapshot>, seek_power_up: bool) {
    let config = ctx.config;
    let position = ctx.body.position;

    if let Some(threat) = threat {
        if threat.is_moving_towards(position, config.evader.approach_threshold) {
            escape(ctx, threat.position);
            return;
        }
    }

    let power_up = ctx.map.power_up_node();
    if seek_power_up && !ctx.map.is_power_up_active() {
        if let Some(goal) = power_up {
            let anchor = threat.map(|t| t.position);
            if ctx.plan_path(goal, anchor) {
                return;
            }
        }
    }

    match threat {
        Some(threat) => roam(ctx, threat.position, config.evader.roam_radius),
        None => ctx.nav.reset(),
    }
}

/// Run straight away from the threat, or the best random direction
fn escape(ctx: &mut AgentContext<'_>, threat: Vec2) {
    let config = ctx.config;
    let position = ctx.body.position;
    let away = (position - threat).normalize_or_zero();
    let target = position + away * config.evader.safe_radius;

    if let Some(goal) = walkable_tile(ctx, target) {
        if ctx.plan_path(goal, Some(threat)) {
            return;
        }
    }
    roam(ctx, threat, config.evader.safe_radius);
}

/// Head for the random point `radius` away that is farthest from the threat
fn roam(ctx: &mut AgentContext<'_>, threat: Vec2, radius: f32) {
    let position = ctx.body.position;
    let mut best: Option<(f32, NodeId)> = None;

    for _ in 0..ctx.config.evader.escape_attempts {
        let direction = Vec2::new(
            ctx.rng.random_range(-1.0..=1.0),
            ctx.rng.random_range(-1.0..=1.0),
        )
        .normalize_or_zero();
        let candidate = position + direction * radius;
        let distance = candidate.distance(threat);
        if best.is_some_and(|(farthest, _)| distance <= farthest) {
            continue;
        }
        if let Some(tile) = walkable_tile(ctx, candidate) {
            best = Some((distance, tile));
        }
    }

    if let Some((_, goal)) = best {
        if ctx.plan_path(goal, Some(threat)) {
            return;
        }
    }
    log::debug!("Evader {:?} found no far target, trying neighbours", ctx.entity);
    step_aside(ctx, threat);
}

/// Last resort: the walkable neighbour (diagonals included) farthest from
/// the threat
fn step_aside(ctx: &mut AgentContext<'_>, threat: Vec2) {
    let Some(here) = ctx.tile().and_then(|id| ctx.map.graph().node(id)) else {
        ctx.nav.reset();
        return;
    };
    let (x, z) = (here.x(), here.z());

    let best = (-1..=1)
        .flat_map(|dz| (-1..=1).map(move |dx| (dx, dz)))
        .filter(|&offset| offset != (0, 0))
        .filter_map(|(dx, dz)| ctx.map.graph().get(x + dx, z + dz))
        .filter(|node| node.is_walkable())
        .map(|node| (ctx.map.localize(node).distance(threat), node.id()))
        .max_by(|a, b| a.0.total_cmp(&b.0));

    match best {
        Some((_, goal)) if ctx.plan_path(goal, Some(threat)) => {}
        _ => {
            log::warn!("Evader {:?} is trapped", ctx.entity);
            ctx.nav.reset();
        }
    }
}

fn walkable_tile(ctx: &AgentContext<'_>, position: Vec2) -> Option<NodeId> {
    ctx.map
        .quantize(position)
        .filter(|&id| ctx.map.is_tile_walkable(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StateMachine;
    use crate::ai::states::testing::Rig;
    use crate::core::GameEvent;
    use crate::ecs::Role;

    const OPEN: [&str; 6] = [
        "......", //
        "......", //
        "......", //
        "......", //
        "......", //
        ".....P",
    ];

    fn threat(rig: &Rig, from: Vec2, to: Vec2) -> ActorSnapshot {
        ActorSnapshot {
            entity: rig.other_entity(),
            role: Role::Player,
            position: to,
            previous_position: from,
            velocity: to - from,
            hidden: false,
            shielded: false,
        }
    }

    #[test]
    fn test_heads_for_power_up_when_unthreatened() {
        let mut rig = Rig::new(&OPEN, Role::Evader, 0, 0);
        let mut fsm = StateMachine::new(EvaderState::AvoidThreat);

        fsm.update(&mut rig.idle_ctx());

        assert_eq!(rig.nav.follower.goal(), rig.map.power_up_node());
        assert!(rig.body.acceleration.length() > 0.0);
    }

    #[test]
    fn test_escapes_away_from_approaching_threat() {
        let mut rig = Rig::new(&OPEN, Role::Evader, 2, 2);
        // Threat west of the evader, stepping east towards it
        let snapshot = threat(&rig, Vec2::new(0.2, 2.5), Vec2::new(0.5, 2.5));
        rig.actors.push(snapshot);
        let mut fsm = StateMachine::new(EvaderState::AvoidThreat);

        fsm.update(&mut rig.idle_ctx());

        // Nothing six units out lies on this small grid, so the evader
        // settles for the neighbour farthest from the threat
        let goal = rig.nav.follower.goal().unwrap();
        let goal_pos = rig.map.localize_id(goal).unwrap();
        let start_distance = Vec2::new(2.5, 2.5).distance(snapshot.position);
        assert!(goal_pos.distance(snapshot.position) > start_distance);
        assert_eq!(rig.nav.anchor, Some(snapshot.position));
    }

    #[test]
    fn test_escape_straight_when_room() {
        let mut rig = Rig::new(&OPEN, Role::Evader, 1, 0);
        rig.config.evader.safe_radius = 3.0;
        let snapshot = threat(&rig, Vec2::new(0.0, 0.35), Vec2::new(0.5, 0.4));
        rig.actors.push(snapshot);

        let mut fsm = StateMachine::new(EvaderState::AvoidThreat);
        fsm.update(&mut rig.idle_ctx());

        // Directly away from (0.5, 0.4) through (1.5, 0.5), three units out
        let away = Vec2::new(1.0, 0.1).normalize();
        let expected = rig.map.quantize(Vec2::new(1.5, 0.5) + away * 3.0);
        assert_eq!(rig.nav.follower.goal(), expected);
    }

    #[test]
    fn test_claims_power_up_and_hides() {
        let mut rig = Rig::new(&OPEN, Role::Evader, 5, 5);
        let mut fsm = StateMachine::new(EvaderState::AvoidThreat);

        let change = fsm.update(&mut rig.idle_ctx()).unwrap();

        assert_eq!(change.to, "PowerUpActive");
        assert!(rig.status.hidden);
        assert!(rig.status.is_active());
        assert!(rig.map.is_power_up_active());

        // Forced back by the timer: visible again, tile released, cooldown
        rig.now = 6.0;
        fsm.transition(&mut rig.idle_ctx(), EvaderState::AvoidThreat);
        assert!(!rig.status.hidden);
        assert!(!rig.map.is_power_up_active());
        assert!(!rig.status.is_eligible(6.0));

        // Still on the tile, but cooling down
        fsm.update(&mut rig.idle_ctx());
        assert_eq!(fsm.current(), &EvaderState::AvoidThreat);
        assert!(!rig.map.is_power_up_active());
    }

    #[test]
    fn test_trapped_evader_flees_in_place() {
        let layout = ["###", "#.#", "##P"];
        let mut rig = Rig::new(&layout, Role::Evader, 1, 1);
        let snapshot = threat(&rig, Vec2::new(1.5, 0.0), Vec2::new(1.5, 0.2));
        rig.actors.push(snapshot);
        let mut fsm = StateMachine::new(EvaderState::AvoidThreat);

        fsm.update(&mut rig.idle_ctx());

        // Only the diagonal power-up tile is walkable and it is cut off
        assert!(rig.nav.follower.is_exhausted());
        assert!(rig.body.acceleration.y > 0.0);
        let events = rig.published();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::PathUnreachable { .. }))
        );
    }
}
