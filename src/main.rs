//! Headless demo: a seeded match with a scripted player

use std::path::Path;

use pursuit::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Ticks between changes of the scripted player's heading
const STEER_INTERVAL: u64 = 45;
const MAX_TICKS: u64 = 60 * 60 * 3;
const EVADERS: usize = 3;

/// Random-walk stand-in for a human at the keyboard
struct ScriptedPlayer {
    input: DirectionalInput,
    rng: ChaCha8Rng,
}

impl ScriptedPlayer {
    fn new(seed: u64) -> Self {
        Self {
            input: DirectionalInput::new(Vec2::new(0.0, -1.0)),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn steer(&mut self) {
        self.input.release_all();
        if self.rng.random_bool(0.2) {
            return;
        }
        let directions = [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
        ];
        self.input
            .press(directions[self.rng.random_range(0..directions.len())]);
        if self.rng.random_bool(0.3) {
            self.input
                .press(directions[self.rng.random_range(0..directions.len())]);
        }
    }
}

fn load_config(path: Option<String>) -> Result<TuningConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(TuningConfig::default());
    };
    let path = Path::new(&path);
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => TuningConfig::load_json(path)?,
        _ => TuningConfig::load_ron(path)?,
    };
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(std::env::args().nth(1))?;
    let seed = config.seed;
    let mut sim = Simulation::new(config)?;

    sim.spawn(Role::Player)?;
    for _ in 0..EVADERS {
        sim.spawn(Role::Evader)?;
    }
    sim.spawn(Role::Hunter)?;

    let mut player = ScriptedPlayer::new(seed.wrapping_add(1));
    let mut outcome = None;
    while outcome.is_none() && sim.ticks() < MAX_TICKS {
        if sim.ticks() % STEER_INTERVAL == 0 {
            player.steer();
        }
        outcome = sim.tick(&player.input);
        for event in sim.events().iter() {
            log::debug!("t={:.2}s {event:?}", sim.clock());
        }
    }

    match outcome {
        Some(outcome) => log::info!("Match {outcome} at {:.1}s", sim.clock()),
        None => log::info!("Match undecided after {:.1}s", sim.clock()),
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Simulation error: {}", e);
    }
}
