//! Flock configuration.
//!
//! All tunables live in [`FlockConfig`]. Every struct is `#[serde(default)]`, so
//! a JSON file only needs the fields it overrides:
//!
//! ```json
//! {
//!     "agent_count": 4096,
//!     "flocks": 2,
//!     "radii": { "base": 4.0, "falloff": 0.5, "levels": 3 },
//!     "weights": { "separation": 2.0 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::boid::MAX_LEVELS;
use crate::error::ConfigError;
use crate::spatial::SpatialConfig;

/// Deepest supported partition tree.
pub const MAX_PARTITION_DEPTH: u32 = 10;

/// Largest grid resolution accepted. The grid keeps two `u32` tables of
/// `resolution^3` entries.
pub const MAX_GRID_RESOLUTION: u32 = 256;

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Number of agents created at initialization. Fixed for the run.
    pub agent_count: u32,
    /// Number of disjoint flocks; agent `i` gets mask bit `i % flocks`.
    pub flocks: u32,
    /// Half-size of the cube agents spawn in.
    pub spawn_extent: f32,
    /// Seed for reproducible spawning. `None` seeds from the clock.
    pub seed: Option<u64>,
    /// Seconds simulated per tick.
    pub time_step: f32,
    /// World units travelled per second at unit heading.
    pub speed: f32,
    /// Upper bound on heading magnitude.
    pub max_heading: f32,
    pub radii: LevelRadii,
    pub weights: SteeringWeights,
    pub spatial: SpatialConfig,
    pub search: NeighborSearch,
    pub boundary: Boundary,
    pub partition: PartitionConfig,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            agent_count: 256,
            flocks: 1,
            spawn_extent: 10.0,
            seed: None,
            time_step: 0.05,
            speed: 0.8,
            max_heading: 1.0,
            radii: LevelRadii::default(),
            weights: SteeringWeights::default(),
            spatial: SpatialConfig::default(),
            search: NeighborSearch::default(),
            boundary: Boundary::default(),
            partition: PartitionConfig::default(),
        }
    }
}

impl FlockConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FlockConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("time_step", self.time_step)?;
        positive("speed", self.speed)?;
        positive("max_heading", self.max_heading)?;
        positive("spawn_extent", self.spawn_extent)?;
        positive("spatial.cell_size", self.spatial.cell_size)?;
        positive("radii.base", self.radii.base)?;
        if let Some(table) = &self.radii.table {
            for &radius in table {
                positive("radii.table", radius)?;
            }
        }
        if !(self.radii.falloff > 0.0 && self.radii.falloff <= 1.0) {
            return Err(ConfigError::Falloff(self.radii.falloff));
        }
        if self.radii.levels == 0 || self.radii.levels > MAX_LEVELS {
            return Err(ConfigError::Levels {
                got: self.radii.levels,
                max: MAX_LEVELS,
            });
        }
        let res = self.spatial.grid_resolution;
        if !res.is_power_of_two() || res > MAX_GRID_RESOLUTION {
            return Err(ConfigError::GridResolution(res));
        }
        if self.flocks == 0 || self.flocks > 32 {
            return Err(ConfigError::Flocks(self.flocks));
        }
        if self.partition.depth > MAX_PARTITION_DEPTH {
            return Err(ConfigError::PartitionDepth {
                got: self.partition.depth,
                max: MAX_PARTITION_DEPTH,
            });
        }
        if let Boundary::Wrap { half_extent } = self.boundary {
            positive("boundary.half_extent", half_extent)?;
        }
        positive("weights.separation_distance", self.weights.separation_distance)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Perception radius per hierarchy level.
///
/// Level 0 is the coarsest tier. Without a table, `radius(L) = base * falloff^L`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRadii {
    pub base: f32,
    pub falloff: f32,
    /// Number of levels agents are spread over at spawn.
    pub levels: u32,
    /// Explicit radii, indexed by level. Levels past the end use the last entry.
    pub table: Option<Vec<f32>>,
}

impl Default for LevelRadii {
    fn default() -> Self {
        Self {
            base: 5.0,
            falloff: 0.5,
            levels: 1,
            table: None,
        }
    }
}

impl LevelRadii {
    /// Neighbor radius for an agent at `level`.
    pub fn radius(&self, level: u32) -> f32 {
        match &self.table {
            Some(table) if !table.is_empty() => {
                let idx = (level as usize).min(table.len() - 1);
                table[idx]
            }
            _ => self.base * self.falloff.powi(level as i32),
        }
    }

    /// Largest radius any level can use. Sizes the grid reach.
    pub fn max_radius(&self) -> f32 {
        (0..MAX_LEVELS)
            .map(|level| self.radius(level))
            .fold(0.0, f32::max)
    }
}

/// Steering rule weights, in heading units per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringWeights {
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
    /// Separation kicks in when the neighbor centroid is closer than this.
    pub separation_distance: f32,
}

impl Default for SteeringWeights {
    fn default() -> Self {
        Self {
            separation: 1.5,
            alignment: 1.0,
            cohesion: 0.5,
            separation_distance: 1.0,
        }
    }
}

/// How neighbor candidates are found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    /// Morton-ordered uniform grid.
    #[default]
    Grid,
    /// Test every pair. Reference path for small flocks and tests.
    BruteForce,
}

/// What happens to agents that leave the simulated volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Boundary {
    /// Unbounded space.
    #[default]
    Open,
    /// Toroidal cube from `-half_extent` to `half_extent` on each axis.
    Wrap { half_extent: f32 },
}

/// Hierarchical plane partition settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Number of split levels below the root. Zero disables the tree.
    pub depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        FlockConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FlockConfig::from_json_str(
            r#"{ "agent_count": 64, "radii": { "base": 4.0 }, "search": "brute_force" }"#,
        )
        .unwrap();
        assert_eq!(config.agent_count, 64);
        assert_eq!(config.radii.base, 4.0);
        assert_eq!(config.radii.falloff, 0.5);
        assert_eq!(config.search, NeighborSearch::BruteForce);
        assert_eq!(config.time_step, FlockConfig::default().time_step);
    }

    #[test]
    fn test_boundary_json() {
        let config =
            FlockConfig::from_json_str(r#"{ "boundary": { "kind": "wrap", "half_extent": 12.0 } }"#)
                .unwrap();
        assert_eq!(config.boundary, Boundary::Wrap { half_extent: 12.0 });
    }

    #[test]
    fn test_radius_shrinks_with_level() {
        let radii = LevelRadii {
            base: 8.0,
            falloff: 0.5,
            levels: 4,
            table: None,
        };
        assert_eq!(radii.radius(0), 8.0);
        assert_eq!(radii.radius(1), 4.0);
        assert_eq!(radii.radius(3), 1.0);
        assert_eq!(radii.max_radius(), 8.0);
    }

    #[test]
    fn test_radius_table_override() {
        let radii = LevelRadii {
            table: Some(vec![3.0, 2.0]),
            ..LevelRadii::default()
        };
        assert_eq!(radii.radius(0), 3.0);
        assert_eq!(radii.radius(1), 2.0);
        assert_eq!(radii.radius(7), 2.0);
        assert_eq!(radii.max_radius(), 3.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = FlockConfig::default();
        config.time_step = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "time_step", .. })
        ));

        let mut config = FlockConfig::default();
        config.spatial.grid_resolution = 48;
        assert!(matches!(config.validate(), Err(ConfigError::GridResolution(48))));

        let mut config = FlockConfig::default();
        config.radii.falloff = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Falloff(_))));

        let mut config = FlockConfig::default();
        config.flocks = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Flocks(0))));

        let mut config = FlockConfig::default();
        config.radii.levels = MAX_LEVELS + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Levels { .. })));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            FlockConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
