//! Core simulation module
//!
//! Contains the tick driver, its configuration, timers and telemetry events

mod config;
mod events;
mod game;
mod schedule;

pub use config::{
    CaptureConfig, ConfigError, EvaderConfig, HunterConfig, MapConfig, PlayerConfig,
    SteeringConfig, TuningConfig,
};
pub use events::{EventQueue, GameEvent};
pub use game::{Simulation, SimulationError};
pub use schedule::{Scheduler, Timer, TimerId, TimerKind};
