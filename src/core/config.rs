//! Tuning configuration
//!
//! Every radius, speed and duration the simulation uses lives here. Configs
//! are saved and loaded as RON (or JSON); missing fields take their defaults.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ecs::Role;

/// Grid layout and placement in world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub cols: usize,
    pub rows: usize,
    /// World units per tile side
    pub tile_size: f32,
    /// World position of the `(0, 0)` tile's corner
    pub origin: Vec2,
    /// Obstacles requested from the Halton scatter
    pub obstacles: usize,
    /// Clear obstacles that touch another obstacle before building edges
    pub declump_obstacles: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            cols: 10,
            rows: 10,
            tile_size: 5.0,
            origin: Vec2::new(-25.0, -25.0),
            obstacles: 20,
            declump_obstacles: true,
        }
    }
}

/// The controlled actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub top_speed: f32,
    pub move_force: f32,
    pub friction: f32,
    pub radius: f32,
    /// Top speed multiplier while powered up
    pub power_up_multiplier: f32,
    /// Seconds a power-up lasts
    pub power_up_duration: f64,
    /// Seconds after a power-up before another may be claimed
    pub power_up_cooldown: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            top_speed: 5.0,
            move_force: 50.0,
            friction: 20.0,
            radius: 1.0,
            power_up_multiplier: 2.0,
            power_up_duration: 6.0,
            power_up_cooldown: 0.0,
        }
    }
}

/// Actors fleeing the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaderConfig {
    pub top_speed: f32,
    pub max_force: f32,
    pub radius: f32,
    /// Distance of a straight escape target
    pub safe_radius: f32,
    /// Distance of a random far target when the threat is not approaching
    pub roam_radius: f32,
    /// Random directions tried before falling back to a neighbour tile
    pub escape_attempts: u32,
    /// Minimum cosine between the threat's motion and the threat-to-self
    /// direction for the threat to count as approaching
    pub approach_threshold: f32,
    /// Seconds hidden on the power-up tile
    pub power_up_duration: f64,
    /// Seconds after a power-up before the evader may claim another
    pub power_up_cooldown: f64,
}

impl Default for EvaderConfig {
    fn default() -> Self {
        Self {
            top_speed: 10.0,
            max_force: 20.0,
            radius: 0.5,
            safe_radius: 6.0,
            roam_radius: 20.0,
            escape_attempts: 20,
            approach_threshold: 0.5,
            power_up_duration: 6.0,
            power_up_cooldown: 3.0,
        }
    }
}

/// The apex predator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    pub top_speed: f32,
    pub max_force: f32,
    pub radius: f32,
    /// Role the hunter chases once powered up. Only steers the chase: the
    /// hunter catches nobody but the player.
    pub prey: Role,
    pub power_up_multiplier: f32,
    pub power_up_duration: f64,
    pub power_up_cooldown: f64,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            top_speed: 4.0,
            max_force: 12.0,
            radius: 1.0,
            prey: Role::Player,
            power_up_multiplier: 2.0,
            power_up_duration: 10.0,
            power_up_cooldown: 5.0,
        }
    }
}

/// Shared steering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub wander_distance: f32,
    pub wander_radius: f32,
    /// Largest wander angle change per tick (radians)
    pub wander_max_delta: f32,
    /// Length of the obstacle probe
    pub avoid_lookahead: f32,
    /// Seconds of prediction when pursuing
    pub pursue_lookahead: f32,
    /// Distance inside which arrival slows down
    pub arrive_radius: f32,
    /// Waypoint is reached within this fraction of a tile
    pub waypoint_tolerance: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            wander_distance: 4.0,
            wander_radius: 2.0,
            wander_max_delta: 0.3,
            avoid_lookahead: 5.0,
            pursue_lookahead: 0.5,
            arrive_radius: 2.5,
            waypoint_tolerance: 0.5,
        }
    }
}

/// Referee distances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// An evader this close to its predator is caught
    pub capture_radius: f32,
    /// The unshielded player this close to the hunter is caught
    pub apex_radius: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_radius: 1.0,
            apex_radius: 2.5,
        }
    }
}

/// Complete simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Seed of the simulation RNG
    pub seed: u64,
    /// Fixed tick length in seconds
    pub tick_seconds: f32,
    /// Threat displacement that forces an evader to replan
    pub replan_threshold: f32,
    pub map: MapConfig,
    pub player: PlayerConfig,
    pub evader: EvaderConfig,
    pub hunter: HunterConfig,
    pub steering: SteeringConfig,
    pub capture: CaptureConfig,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            tick_seconds: 1.0 / 60.0,
            replan_threshold: 10.0,
            map: MapConfig::default(),
            player: PlayerConfig::default(),
            evader: EvaderConfig::default(),
            hunter: HunterConfig::default(),
            steering: SteeringConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl TuningConfig {
    /// Reject values the simulation cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tick_seconds", self.tick_seconds),
            ("map.tile_size", self.map.tile_size),
            ("player.top_speed", self.player.top_speed),
            ("player.power_up_multiplier", self.player.power_up_multiplier),
            ("evader.top_speed", self.evader.top_speed),
            ("evader.max_force", self.evader.max_force),
            ("evader.safe_radius", self.evader.safe_radius),
            ("hunter.top_speed", self.hunter.top_speed),
            ("hunter.max_force", self.hunter.max_force),
            ("hunter.power_up_multiplier", self.hunter.power_up_multiplier),
            ("steering.waypoint_tolerance", self.steering.waypoint_tolerance),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }

        if !(self.player.move_force >= 0.0 && self.player.move_force.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "player.move_force",
                reason: format!("must not be negative, got {}", self.player.move_force),
            });
        }
        if !(self.player.friction >= 0.0 && self.player.friction.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "player.friction",
                reason: format!("must not be negative, got {}", self.player.friction),
            });
        }

        let durations = [
            ("player.power_up_duration", self.player.power_up_duration),
            ("evader.power_up_duration", self.evader.power_up_duration),
            ("hunter.power_up_duration", self.hunter.power_up_duration),
        ];
        for (field, value) in durations {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive duration, got {value}"),
                });
            }
        }
        let cooldowns = [
            ("player.power_up_cooldown", self.player.power_up_cooldown),
            ("evader.power_up_cooldown", self.evader.power_up_cooldown),
            ("hunter.power_up_cooldown", self.hunter.power_up_cooldown),
        ];
        for (field, value) in cooldowns {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }

        if self.map.cols == 0 || self.map.rows == 0 {
            return Err(ConfigError::Invalid {
                field: "map",
                reason: format!("empty grid {}x{}", self.map.cols, self.map.rows),
            });
        }
        if self.hunter.prey == Role::Hunter {
            return Err(ConfigError::Invalid {
                field: "hunter.prey",
                reason: "the hunter cannot hunt itself".to_string(),
            });
        }
        if self.capture.capture_radius < 0.0 || self.capture.apex_radius < 0.0 {
            return Err(ConfigError::Invalid {
                field: "capture",
                reason: "radii must not be negative".to_string(),
            });
        }
        self.check_radii(self.map.tile_size)
    }

    /// Reject actor radii that do not fit inside a tile of `tile_size`.
    /// A body must leave room to move between the walls of its tile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending radius.
    pub fn check_radii(&self, tile_size: f32) -> Result<(), ConfigError> {
        let radii = [
            ("player.radius", self.player.radius),
            ("evader.radius", self.evader.radius),
            ("hunter.radius", self.hunter.radius),
        ];
        let limit = tile_size * 0.5;
        for (field, value) in radii {
            if !(value >= 0.0 && value < limit) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be in [0, {limit}), got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid RON for this type
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::DeserializeError(e.to_string()))
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load and validate a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// validation
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config = Self::from_ron_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// validation
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors that can occur while loading a config
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// A field holds an unusable value
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::Invalid { field, reason } => write!(f, "Invalid config `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TuningConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.map.cols * config.map.rows, 100);
        assert_eq!(config.hunter.prey, Role::Player);
    }

    #[test]
    fn test_config_serialization_ron() {
        let mut config = TuningConfig::default();
        config.seed = 1234;
        config.capture.apex_radius = 2.0;

        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron_str.contains("apex_radius"));

        let loaded = TuningConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_takes_defaults() {
        let loaded =
            TuningConfig::from_ron_str("(seed: 7, capture: (apex_radius: 1.5))").unwrap();

        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.capture.apex_radius, 1.5);
        assert_eq!(loaded.capture.capture_radius, 1.0);
        assert_eq!(loaded.player, PlayerConfig::default());
    }

    #[test]
    fn test_config_serialization_json() {
        let config = TuningConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();

        let loaded: TuningConfig = serde_json::from_str(&json_str).unwrap();
        assert_eq!(loaded.map.origin, Vec2::new(-25.0, -25.0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TuningConfig::default();
        config.tick_seconds = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "tick_seconds",
                ..
            })
        ));

        let mut config = TuningConfig::default();
        config.hunter.prey = Role::Hunter;
        assert!(config.validate().is_err());

        let mut config = TuningConfig::default();
        config.evader.power_up_duration = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_radius_of_half_a_tile() {
        let mut config = TuningConfig::default();
        config.hunter.radius = config.map.tile_size * 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "hunter.radius",
                ..
            })
        ));

        let mut config = TuningConfig::default();
        config.evader.radius = -0.1;
        assert!(config.validate().is_err());

        // Defaults fit a 5 unit tile, not a 1 unit one
        let config = TuningConfig::default();
        assert!(config.check_radii(5.0).is_ok());
        assert!(matches!(
            config.check_radii(1.0),
            Err(ConfigError::Invalid {
                field: "player.radius",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_player_force() {
        let mut config = TuningConfig::default();
        config.player.move_force = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "player.move_force",
                ..
            })
        ));

        let mut config = TuningConfig::default();
        config.player.friction = -5.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "player.friction",
                ..
            })
        ));

        let mut config = TuningConfig::default();
        config.player.friction = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_ron_is_a_deserialize_error() {
        let err = TuningConfig::from_ron_str("(seed: \"x\")").unwrap_err();
        assert!(matches!(err, ConfigError::DeserializeError(_)));
        assert!(err.to_string().starts_with("Deserialization error"));
    }
}
