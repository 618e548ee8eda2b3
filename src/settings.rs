//! Simulation settings
//!
//! Loaded from JSON by the host, validated once before a run starts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::echo_ghost::EchoGhostConfig;

/// Errors raised when validating configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("step duration must be a positive number of milliseconds, got {0}")]
    InvalidStepDuration(f64),
    #[error("arena must be at least 2x2 tiles, got {cols}x{rows}")]
    ArenaTooSmall { cols: i32, rows: i32 },
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
    #[error("start length {length} does not fit an arena {cols} tiles wide")]
    StartLengthOutOfRange { length: usize, cols: i32 },
    #[error("ghost delay {delay_ms}ms rounds to zero ticks of {tick_ms}ms")]
    GhostDelayTooShort { delay_ms: f64, tick_ms: f64 },
    #[error("ghost trail window must be at least one sample")]
    EmptyTrailWindow,
    #[error("ghost buffer capacity {capacity} is below delay + trail window ({required})")]
    GhostCapacityTooSmall { capacity: usize, required: usize },
    #[error("ghost opacity {0} must be within (0, 1]")]
    InvalidOpacity(f32),
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Arena geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub cols: i32,
    pub rows: i32,
    /// World units per tile, used to place burst effects
    pub cell_size: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            cols: ARENA_COLS,
            rows: ARENA_ROWS,
            cell_size: CELL_SIZE,
        }
    }
}

/// Echo ghost tuning (tick duration comes from the simulation step)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostSettings {
    pub delay_ms: f64,
    pub buffer_capacity: usize,
    pub trail_window: usize,
    pub max_opacity: f32,
}

impl Default for GhostSettings {
    fn default() -> Self {
        Self {
            delay_ms: GHOST_DELAY_MS,
            buffer_capacity: GHOST_BUFFER_CAPACITY,
            trail_window: GHOST_TRAIL_WINDOW,
            max_opacity: GHOST_MAX_OPACITY,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Run seed for food placement
    pub seed: u64,
    /// Milliseconds per simulation step
    pub step_ms: f64,
    pub arena: ArenaConfig,
    /// Initial snake length (head included)
    pub start_length: usize,
    pub ghost: GhostSettings,
    /// Ticks between eating food and the ghost burst firing.
    /// `None` waits for the ghost to reach the food tile.
    pub burst_delay_ticks: Option<u32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            step_ms: STEP_MS,
            arena: ArenaConfig::default(),
            start_length: START_LENGTH,
            ghost: GhostSettings::default(),
            burst_delay_ticks: None,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Ghost configuration at this config's step rate
    pub fn echo_ghost_config(&self) -> EchoGhostConfig {
        EchoGhostConfig {
            delay_ms: self.ghost.delay_ms,
            tick_duration_ms: self.step_ms,
            buffer_capacity: self.ghost.buffer_capacity,
            trail_window: self.ghost.trail_window,
            max_opacity: self.ghost.max_opacity,
        }
    }

    /// Effective burst delay
    pub fn burst_delay(&self) -> u32 {
        self.burst_delay_ticks
            .unwrap_or_else(|| self.echo_ghost_config().delay_ticks())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_ms.is_finite() && self.step_ms > 0.0) {
            return Err(ConfigError::InvalidStepDuration(self.step_ms));
        }
        let ArenaConfig { cols, rows, cell_size } = self.arena;
        if cols < 2 || rows < 2 {
            return Err(ConfigError::ArenaTooSmall { cols, rows });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        // Snake spawns mid-row with its body trailing to the left
        if self.start_length == 0 || self.start_length > (cols / 2 + 1) as usize {
            return Err(ConfigError::StartLengthOutOfRange {
                length: self.start_length,
                cols,
            });
        }
        self.echo_ghost_config().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.echo_ghost_config().delay_ticks(), 20);
        assert_eq!(config.burst_delay(), 20);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SimConfig::from_json(r#"{ "seed": 42, "burst_delay_ticks": 2 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.burst_delay(), 2);
        assert_eq!(config.arena, ArenaConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimConfig {
            seed: 7,
            start_length: 5,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_step() {
        let config = SimConfig {
            step_ms: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStepDuration(_))
        ));
    }

    #[test]
    fn test_rejects_small_ghost_buffer() {
        let mut config = SimConfig::default();
        config.ghost.buffer_capacity = 25;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GhostCapacityTooSmall {
                capacity: 25,
                required: 30
            })
        ));
    }

    #[test]
    fn test_rejects_oversized_start_length() {
        let config = SimConfig {
            start_length: 40,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartLengthOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_start_length_past_i32() {
        let config = SimConfig {
            start_length: (1usize << 32) + 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartLengthOutOfRange { .. })
        ));
        let json = r#"{ "start_length": 4294967299 }"#;
        assert!(matches!(
            SimConfig::from_json(json),
            Err(ConfigError::StartLengthOutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_error_surfaces() {
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
