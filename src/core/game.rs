//! Fixed-tick simulation driver
//!
//! Owns the map, the actor registry, the timer scheduler and the seeded RNG.
//! One [`Simulation::tick`] runs, in order: clock advance, due timers, every
//! actor's state machine against a frozen snapshot, integration and tile
//! constraints, capture scan, removals, outcome.

use glam::Vec2;
use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::config::{ConfigError, TuningConfig};
use super::events::{EventQueue, GameEvent};
use super::schedule::{Scheduler, TimerKind};
use crate::ai::referee::{self, CaptureRules, Census, Outcome};
use crate::ai::{ActorSnapshot, AgentContext, Brain, Path, Sight, Wander, friction};
use crate::ecs::{Body, Name, Navigator, PowerUpStatus, Role, World};
use crate::input::{MoveInput, NoInput};
use crate::world::{GameMap, GraphError};

/// Errors raised while setting up or driving a simulation
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Config(ConfigError),
    Graph(GraphError),
    /// Spawn position is off the grid or on an obstacle
    BlockedSpawn(Vec2),
    UnknownActor(Entity),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Graph(e) => write!(f, "Map error: {e}"),
            Self::BlockedSpawn(position) => write!(f, "Cannot spawn at {position}"),
            Self::UnknownActor(entity) => write!(f, "No actor {entity:?}"),
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GraphError> for SimulationError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

/// The chase: map, actors, clock and referee
pub struct Simulation {
    config: TuningConfig,
    map: GameMap,
    world: World,
    /// Game time in seconds
    clock: f64,
    ticks: u64,
    timers: Scheduler,
    events: EventQueue,
    rng: ChaCha8Rng,
    outcome: Option<Outcome>,
    /// Spawn counts; alive counts are taken from the registry
    spawned: Census,
}

impl Simulation {
    /// Generate a map from `config` and start an empty match
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or no map can be generated.
    pub fn new(config: TuningConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let map = GameMap::generate(&config.map, &mut rng)?;
        log::info!(
            "Generated {}x{} map (seed {:#x})",
            config.map.cols,
            config.map.rows,
            config.seed
        );
        Ok(Self::assemble(config, map, rng))
    }

    /// Start an empty match on a prepared map
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or its actors do not fit
    /// the map's tiles.
    pub fn with_map(config: TuningConfig, map: GameMap) -> Result<Self, SimulationError> {
        config.validate()?;
        config.check_radii(map.tile_size())?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::assemble(config, map, rng))
    }

    fn assemble(config: TuningConfig, map: GameMap, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            map,
            world: World::new(),
            clock: 0.0,
            ticks: 0,
            timers: Scheduler::new(),
            events: EventQueue::new(),
            rng,
            outcome: None,
            spawned: Census::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Actors
    // ------------------------------------------------------------------------

    /// Spawn an actor of `role` on a random empty tile
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoEmptyTile`] when there is nowhere to stand.
    pub fn spawn(&mut self, role: Role) -> Result<Entity, SimulationError> {
        let position = self
            .map
            .random_empty_position(&mut self.rng)
            .ok_or(GraphError::NoEmptyTile)?;
        self.spawn_at(role, position)
    }

    pub fn spawn_player(&mut self) -> Result<Entity, SimulationError> {
        self.spawn(Role::Player)
    }

    pub fn spawn_evader(&mut self) -> Result<Entity, SimulationError> {
        self.spawn(Role::Evader)
    }

    pub fn spawn_hunter(&mut self) -> Result<Entity, SimulationError> {
        self.spawn(Role::Hunter)
    }

    /// Spawn an actor of `role` at a world position
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::BlockedSpawn`] unless the position is on a
    /// walkable tile.
    pub fn spawn_at(&mut self, role: Role, position: Vec2) -> Result<Entity, SimulationError> {
        let walkable = self
            .map
            .quantize(position)
            .is_some_and(|id| self.map.is_tile_walkable(id));
        if !walkable {
            return Err(SimulationError::BlockedSpawn(position));
        }

        let config = &self.config;
        let body = match role {
            Role::Player => Body::new(position, config.player.top_speed, config.player.move_force)
                .with_friction(config.player.friction)
                .with_radius(config.player.radius),
            Role::Evader => Body::new(position, config.evader.top_speed, config.evader.max_force)
                .with_radius(config.evader.radius),
            Role::Hunter => Body::new(position, config.hunter.top_speed, config.hunter.max_force)
                .with_radius(config.hunter.radius),
        };
        let steering = &config.steering;
        let navigator = Navigator::new(Wander::new(
            steering.wander_distance,
            steering.wander_radius,
            steering.wander_max_delta,
        ));

        let ordinal = match role {
            Role::Player => {
                self.spawned.players_spawned += 1;
                self.spawned.players_spawned
            }
            Role::Evader => {
                self.spawned.evaders_spawned += 1;
                self.spawned.evaders_spawned
            }
            Role::Hunter => self.actors_of(Role::Hunter).len() + 1,
        };
        let name = Name::new(format!("{} {ordinal}", role.as_str()));

        let entity = self.world.spawn((
            role,
            name,
            body,
            navigator,
            PowerUpStatus::default(),
            Brain::for_role(role),
        ));
        self.events.push(GameEvent::ActorSpawned {
            entity,
            role,
            position,
        });
        log::info!("Spawned {} {entity:?} at {position}", role.as_str());
        Ok(entity)
    }

    /// Remove an actor, releasing any power-up it holds
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownActor`] for a missing entity.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), SimulationError> {
        if self.remove_actor(entity) {
            Ok(())
        } else {
            Err(SimulationError::UnknownActor(entity))
        }
    }

    fn remove_actor(&mut self, entity: Entity) -> bool {
        let Ok(status) = self.world.get::<PowerUpStatus>(entity).map(|status| *status) else {
            return false;
        };
        let cancelled = self.timers.cancel_actor(entity);
        if status.is_active() {
            self.map.reset_power_up();
            self.events.push(GameEvent::PowerUpExpired { entity });
        }
        log::debug!("Removing {entity:?} ({cancelled} timers cancelled)");
        self.world.despawn(entity).is_ok()
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance one fixed step. `input` drives the player.
    ///
    /// Returns the outcome once the match is over; later calls do nothing.
    pub fn tick(&mut self, input: &dyn MoveInput) -> Option<Outcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        let dt = self.config.tick_seconds;
        self.clock += f64::from(dt);
        self.ticks += 1;

        self.fire_timers(input);
        self.think(input);
        self.integrate(dt);
        self.referee();

        self.events.swap();
        self.outcome
    }

    /// Tick until the match ends or `max_ticks` have run
    pub fn run(&mut self, input: &dyn MoveInput, max_ticks: u64) -> Option<Outcome> {
        for _ in 0..max_ticks {
            if let Some(outcome) = self.tick(input) {
                return Some(outcome);
            }
        }
        None
    }

    fn fire_timers(&mut self, input: &dyn MoveInput) {
        for timer in self.timers.drain_due(self.clock) {
            let Ok((role, body, nav, status, brain)) = self.world.query_one_mut::<(
                &Role,
                &mut Body,
                &mut Navigator,
                &mut PowerUpStatus,
                &mut Brain,
            )>(timer.actor) else {
                log::trace!("Discarding timer {:?}: actor is gone", timer.id);
                continue;
            };
            if status.timer != Some(timer.id) {
                log::trace!("Discarding stale timer {:?}", timer.id);
                continue;
            }

            let mut ctx = AgentContext {
                entity: timer.actor,
                role: *role,
                now: self.clock,
                body,
                nav,
                status,
                map: &mut self.map,
                timers: &mut self.timers,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
                input,
                sight: Sight::blind(),
            };
            let change = match timer.kind {
                TimerKind::PowerUpExpiry => brain.expire_power_up(&mut ctx),
            };
            if let Some(change) = change {
                ctx.events.push(GameEvent::StateChanged {
                    entity: timer.actor,
                    from: change.from,
                    to: change.to,
                });
            }
        }
    }

    /// Run every actor's state machine against the same snapshot
    fn think(&mut self, input: &dyn MoveInput) {
        let snapshot = self.actors();
        for entity in self.world.entities_sorted() {
            let Ok((role, body, nav, status, brain)) = self.world.query_one_mut::<(
                &Role,
                &mut Body,
                &mut Navigator,
                &mut PowerUpStatus,
                &mut Brain,
            )>(entity) else {
                continue;
            };
            let role = *role;
            let input: &dyn MoveInput = if role == Role::Player { input } else { &NoInput };

            let mut ctx = AgentContext {
                entity,
                role,
                now: self.clock,
                body,
                nav,
                status,
                map: &mut self.map,
                timers: &mut self.timers,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
                input,
                sight: Sight::new(&snapshot),
            };
            if let Some(change) = brain.update(&mut ctx) {
                log::debug!(
                    "{} {entity:?}: {} -> {}",
                    role.as_str(),
                    change.from,
                    change.to
                );
                ctx.events.push(GameEvent::StateChanged {
                    entity,
                    from: change.from,
                    to: change.to,
                });
            }
        }
    }

    fn integrate(&mut self, dt: f32) {
        for (_, body) in self.world.query_mut::<&mut Body>() {
            if body.friction > 0.0 {
                // Friction stops a body, never reverses it
                let magnitude = body.friction.min(body.velocity.length() * body.mass / dt);
                body.apply_force(friction(body.velocity, magnitude));
            }
            body.integrate(dt);

            let walkable = self
                .map
                .quantize(body.position)
                .is_some_and(|id| self.map.is_tile_walkable(id));
            if walkable {
                body.position = self.map.constrain(body.position, body.radius);
            } else {
                body.position = body.previous_position;
                body.velocity = Vec2::ZERO;
            }
        }
    }

    fn referee(&mut self) {
        let actors = self.actors();
        let rules = CaptureRules::from_config(&self.config);
        for capture in referee::scan(&actors, &rules) {
            if !self.remove_actor(capture.victim) {
                continue;
            }
            log::info!("{:?} caught {:?}", capture.captor, capture.victim);
            self.events.push(GameEvent::ActorCaptured {
                victim: capture.victim,
                captor: capture.captor,
            });
        }

        if let Some(outcome) = referee::decide(&self.census()) {
            log::info!("Game over after {} ticks: {outcome}", self.ticks);
            self.outcome = Some(outcome);
            self.events.push(GameEvent::GameOver { outcome });
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Snapshot of every live actor, in ascending id order
    #[must_use]
    pub fn actors(&self) -> Vec<ActorSnapshot> {
        let mut query = self.world.query::<(&Role, &Body, &PowerUpStatus)>();
        let mut actors: Vec<ActorSnapshot> = query
            .iter()
            .map(|(entity, (role, body, status))| ActorSnapshot {
                entity,
                role: *role,
                position: body.position,
                previous_position: body.previous_position,
                velocity: body.velocity,
                hidden: status.hidden,
                shielded: status.shielded,
            })
            .collect();
        actors.sort_by_key(|actor| actor.entity.id());
        actors
    }

    /// Live actors of one role
    #[must_use]
    pub fn actors_of(&self, role: Role) -> Vec<Entity> {
        self.actors()
            .into_iter()
            .filter(|actor| actor.role == role)
            .map(|actor| actor.entity)
            .collect()
    }

    #[must_use]
    pub fn census(&self) -> Census {
        let mut census = self.spawned;
        for actor in self.actors() {
            match actor.role {
                Role::Player => census.players_alive += 1,
                Role::Evader => census.evaders_alive += 1,
                Role::Hunter => {}
            }
        }
        census
    }

    /// A path between two tiles of the current map
    #[must_use]
    pub fn request_path(&self, start: usize, goal: usize) -> Option<Path> {
        self.map.request_path(start, goal)
    }

    /// Name of the actor's current behavior state
    #[must_use]
    pub fn current_state_name(&self, entity: Entity) -> Option<&'static str> {
        self.world
            .get::<Brain>(entity)
            .ok()
            .map(|brain| brain.current_state_name())
    }

    #[must_use]
    pub fn body(&self, entity: Entity) -> Option<Body> {
        self.world.get::<Body>(entity).ok().map(|body| *body)
    }

    #[must_use]
    pub fn power_up_status(&self, entity: Entity) -> Option<PowerUpStatus> {
        self.world.get::<PowerUpStatus>(entity).ok().map(|status| *status)
    }

    #[must_use]
    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<Name>(entity).ok().map(|name| name.0.clone())
    }

    #[must_use]
    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    #[must_use]
    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// Events published by the last tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Graph;

    const OPEN: [&str; 5] = [
        "P....", //
        ".....", //
        ".....", //
        ".....", //
        ".....",
    ];

    fn sim(layout: &[&str], mut config: TuningConfig) -> Simulation {
        // Unit tiles
        config.player.radius = 0.25;
        config.evader.radius = 0.25;
        config.hunter.radius = 0.25;
        let graph = Graph::from_layout(layout, 1.0).unwrap();
        let map = GameMap::new(graph, Vec2::ZERO, 1.0).unwrap();
        Simulation::with_map(config, map).unwrap()
    }

    fn published(sim: &Simulation) -> Vec<GameEvent> {
        sim.events().iter().cloned().collect()
    }

    #[test]
    fn test_spawn_rejects_blocked_tiles() {
        let mut sim = sim(&["#..P"], TuningConfig::default());

        let blocked = sim.spawn_at(Role::Evader, Vec2::new(0.5, 0.5));
        assert!(matches!(blocked, Err(SimulationError::BlockedSpawn(_))));
        let outside = sim.spawn_at(Role::Evader, Vec2::new(-3.0, 0.5));
        assert!(matches!(outside, Err(SimulationError::BlockedSpawn(_))));

        let evader = sim.spawn_at(Role::Evader, Vec2::new(1.5, 0.5)).unwrap();
        assert_eq!(sim.current_state_name(evader), Some("AvoidThreat"));
        assert_eq!(sim.name(evader).as_deref(), Some("evader 1"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = TuningConfig::default();
        config.tick_seconds = 0.0;
        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::Config(_))
        ));

        // Default radii are too wide for unit tiles
        let graph = Graph::from_layout(&OPEN, 1.0).unwrap();
        let map = GameMap::new(graph, Vec2::ZERO, 1.0).unwrap();
        assert!(matches!(
            Simulation::with_map(TuningConfig::default(), map),
            Err(SimulationError::Config(ConfigError::Invalid {
                field: "player.radius",
                ..
            }))
        ));
    }

    #[test]
    fn test_hunter_power_up_reverts_after_duration() {
        let mut config = TuningConfig::default();
        config.tick_seconds = 0.1;
        config.hunter.power_up_duration = 1.0;
        let mut sim = sim(&OPEN, config);
        let hunter = sim.spawn_at(Role::Hunter, Vec2::new(0.5, 0.5)).unwrap();
        sim.spawn_at(Role::Evader, Vec2::new(4.5, 4.5)).unwrap();

        sim.tick(&NoInput);
        assert_eq!(sim.current_state_name(hunter), Some("PowerUpActive"));
        assert!(sim.map().is_power_up_active());
        let body = sim.body(hunter).unwrap();
        assert_eq!(body.top_speed, body.base_speed * 2.0);

        let mut expired = false;
        for _ in 0..12 {
            sim.tick(&NoInput);
            expired |= published(&sim).iter().any(|event| {
                matches!(event, GameEvent::PowerUpExpired { entity } if *entity == hunter)
            });
        }

        assert!(expired);
        assert_eq!(sim.current_state_name(hunter), Some("SeekPowerUp"));
        let body = sim.body(hunter).unwrap();
        assert_eq!(body.top_speed, body.base_speed);
        assert!(!sim.power_up_status(hunter).unwrap().is_active());
        assert!(!sim.map().is_power_up_active());
        assert_eq!(sim.pending_timers(), 0);
    }

    #[test]
    fn test_double_capture_removes_once() {
        let mut config = TuningConfig::default();
        config.capture.apex_radius = 0.0;
        let mut sim = sim(&OPEN, config);
        let player = sim.spawn_at(Role::Player, Vec2::new(0.5, 0.5)).unwrap();
        sim.spawn_at(Role::Hunter, Vec2::new(1.5, 0.5)).unwrap();
        // Closer to the hunter than to the player
        let shared = sim.spawn_at(Role::Evader, Vec2::new(1.1, 0.5)).unwrap();
        let other = sim.spawn_at(Role::Evader, Vec2::new(0.5, 1.2)).unwrap();

        assert_eq!(sim.tick(&NoInput), Some(Outcome::Won));

        let events = published(&sim);
        let captures: Vec<(Entity, Entity)> = events
            .iter()
            .filter_map(|event| match event {
                GameEvent::ActorCaptured { victim, captor } => Some((*victim, *captor)),
                _ => None,
            })
            .collect();
        assert_eq!(captures, vec![(shared, player), (other, player)]);
        assert!(events.contains(&GameEvent::GameOver {
            outcome: Outcome::Won
        }));
        assert!(sim.actors_of(Role::Evader).is_empty());
        assert_eq!(sim.actors_of(Role::Player).len(), 1);

        // Finished matches stay finished
        let ticks = sim.ticks();
        assert_eq!(sim.tick(&NoInput), Some(Outcome::Won));
        assert_eq!(sim.ticks(), ticks);
    }

    #[test]
    fn test_hunter_never_captures_evaders() {
        let mut sim = sim(&OPEN, TuningConfig::default());
        sim.spawn_at(Role::Player, Vec2::new(4.5, 4.5)).unwrap();
        sim.spawn_at(Role::Hunter, Vec2::new(1.5, 2.5)).unwrap();
        let evader = sim.spawn_at(Role::Evader, Vec2::new(2.0, 2.5)).unwrap();

        assert_eq!(sim.tick(&NoInput), None);
        assert_eq!(sim.actors_of(Role::Evader), vec![evader]);
        assert!(
            !published(&sim)
                .iter()
                .any(|event| matches!(event, GameEvent::ActorCaptured { .. }))
        );
    }

    #[test]
    fn test_lost_wins_ties() {
        let mut config = TuningConfig::default();
        config.capture.apex_radius = 1.0;
        let mut sim = sim(&OPEN, config);
        let player = sim.spawn_at(Role::Player, Vec2::new(2.5, 2.5)).unwrap();
        sim.spawn_at(Role::Hunter, Vec2::new(2.5, 3.0)).unwrap();
        sim.spawn_at(Role::Evader, Vec2::new(2.0, 2.5)).unwrap();

        assert_eq!(sim.tick(&NoInput), Some(Outcome::Lost));
        assert!(sim.body(player).is_none());
    }

    #[test]
    fn test_despawn_releases_power_up() {
        let mut sim = sim(&OPEN, TuningConfig::default());
        let hunter = sim.spawn_at(Role::Hunter, Vec2::new(0.5, 0.5)).unwrap();
        sim.spawn_at(Role::Evader, Vec2::new(4.5, 4.5)).unwrap();
        sim.tick(&NoInput);
        assert!(sim.map().is_power_up_active());

        sim.despawn(hunter).unwrap();
        assert!(!sim.map().is_power_up_active());
        assert_eq!(sim.pending_timers(), 0);
        assert_eq!(
            sim.despawn(hunter),
            Err(SimulationError::UnknownActor(hunter))
        );

        sim.tick(&NoInput);
        assert!(published(&sim).contains(&GameEvent::PowerUpExpired { entity: hunter }));
    }

    #[test]
    fn test_player_power_up_shields_until_expiry() {
        let mut config = TuningConfig::default();
        config.tick_seconds = 0.1;
        config.player.power_up_duration = 0.5;
        config.player.power_up_cooldown = 1.0;
        let mut sim = sim(&OPEN, config);
        let player = sim.spawn_at(Role::Player, Vec2::new(0.5, 0.5)).unwrap();

        sim.tick(&NoInput);
        assert!(sim.power_up_status(player).unwrap().shielded);

        sim.run(&NoInput, 8);
        let status = sim.power_up_status(player).unwrap();
        assert!(!status.shielded);
        assert!(!status.is_active());
        assert!(!sim.map().is_power_up_active());
        let body = sim.body(player).unwrap();
        assert_eq!(body.top_speed, body.base_speed);
    }

    #[test]
    fn test_bodies_stay_on_walkable_tiles() {
        let mut sim = sim(&["...#", "...P"], TuningConfig::default());
        let player = sim.spawn_at(Role::Player, Vec2::new(2.5, 0.5)).unwrap();
        let mut input = crate::input::DirectionalInput::new(Vec2::X);
        input.press(crate::input::Direction::Forward);

        sim.run(&input, 120);

        let body = sim.body(player).unwrap();
        // Pressed against the wall side of its tile
        assert!(body.position.x > 2.5);
        assert!(body.position.x <= 3.0 - body.radius + 1e-4);
        assert_eq!(sim.map().quantize(body.position), Some(2));
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let run = || {
            let mut sim = Simulation::new(TuningConfig::default()).unwrap();
            sim.spawn_player().unwrap();
            for _ in 0..3 {
                sim.spawn_evader().unwrap();
            }
            sim.spawn_hunter().unwrap();
            sim.run(&NoInput, 300);
            sim.actors()
                .iter()
                .map(|actor| actor.position)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
