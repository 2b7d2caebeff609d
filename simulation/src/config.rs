//! Session parameters and their validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use waypoint_defence_core::{Size, Vec2};

/// Upper bound on `columns × rows`; the grid is allocated up front.
pub const MAX_TILES: u64 = 1 << 16;

/// Tunable parameters of a simulation session.
///
/// Every field has a default, so scenario files only need to name the values
/// they change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Width of the playable area in world units.
    pub viewport_width: f32,
    /// Height of the playable area in world units.
    pub viewport_height: f32,
    /// Number of tile columns.
    pub columns: u32,
    /// Edge length of a square tile in world units.
    pub tile_length: f32,
    /// Waypoints enemies follow, entry first.
    pub waypoints: Vec<Vec2>,
    /// Gold available at the start of a session.
    pub starting_gold: u32,
    /// Lives available at the start of a session.
    pub starting_lives: u32,
    /// Delay between two enemies of the same wave, in milliseconds.
    pub spawn_interval_ms: u64,
    /// Countdown between requesting a wave and its first spawn, in milliseconds.
    pub preparation_ms: u64,
    /// Index of the final wave; clearing it wins the session.
    pub max_waves: u32,
    /// Seed for wave composition and critical-hit rolls.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            columns: 20,
            tile_length: 40.0,
            waypoints: vec![
                Vec2::new(0.0, 300.0),
                Vec2::new(220.0, 300.0),
                Vec2::new(220.0, 140.0),
                Vec2::new(580.0, 140.0),
                Vec2::new(580.0, 460.0),
                Vec2::new(800.0, 460.0),
            ],
            starting_gold: 250,
            starting_lives: 20,
            spawn_interval_ms: 800,
            preparation_ms: 2_000,
            max_waves: 10,
            seed: 0x5eed,
        }
    }
}

impl SimulationConfig {
    /// Checks that the configuration describes a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dimensions = [self.viewport_width, self.viewport_height, self.tile_length];
        if dimensions
            .iter()
            .any(|value| !value.is_finite() || *value <= 0.0)
        {
            return Err(ConfigError::NonPositiveDimension);
        }
        if self.columns < 3 {
            return Err(ConfigError::TooFewColumns {
                columns: self.columns,
            });
        }
        let rows = (self.viewport_height / self.tile_length).floor() as u32;
        if rows < 3 {
            return Err(ConfigError::TooFewRows { rows });
        }
        if u64::from(self.columns) * u64::from(rows) > MAX_TILES {
            return Err(ConfigError::GridTooLarge {
                columns: self.columns,
                rows,
            });
        }
        if self.waypoints.len() < 2 {
            return Err(ConfigError::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }
        if let Some(index) = self.waypoints.iter().position(|point| !point.is_finite()) {
            return Err(ConfigError::NonFiniteWaypoint { index });
        }
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::ZeroSpawnInterval);
        }
        if self.max_waves == 0 {
            return Err(ConfigError::NoWaves);
        }
        Ok(())
    }

    /// Playable area as a size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    /// Delay between two spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Pre-wave countdown.
    #[must_use]
    pub fn preparation_time(&self) -> Duration {
        Duration::from_millis(self.preparation_ms)
    }
}

/// Reasons a [`SimulationConfig`] is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Viewport or tile length is zero, negative or not finite.
    #[error("viewport and tile dimensions must be positive")]
    NonPositiveDimension,
    /// The grid needs an interior column between the invalid border columns.
    #[error("at least 3 columns are required, got {columns}")]
    TooFewColumns {
        /// Configured column count.
        columns: u32,
    },
    /// The grid needs an interior row between the invalid border rows.
    #[error("viewport height fits {rows} rows, at least 3 are required")]
    TooFewRows {
        /// Derived row count.
        rows: u32,
    },
    /// The grid would exceed [`MAX_TILES`] tiles.
    #[error("a {columns}x{rows} grid exceeds the limit of {} tiles", MAX_TILES)]
    GridTooLarge {
        /// Configured column count.
        columns: u32,
        /// Derived row count.
        rows: u32,
    },
    /// A path needs an entry and an exit.
    #[error("a path needs at least 2 waypoints, got {count}")]
    TooFewWaypoints {
        /// Configured waypoint count.
        count: usize,
    },
    /// A waypoint coordinate is NaN or infinite.
    #[error("waypoint {index} is not finite")]
    NonFiniteWaypoint {
        /// Position of the offending waypoint.
        index: usize,
    },
    /// Spawning would never advance.
    #[error("spawn interval must be positive")]
    ZeroSpawnInterval,
    /// A session needs at least one wave to win.
    #[error("max_waves must be at least 1")]
    NoWaves,
}
