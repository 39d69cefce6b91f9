//! Spawn context for agent initialization.
//!
//! Provides helper methods to reduce boilerplate when spawning agents.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};

use crate::boid::Boid;
use crate::config::FlockConfig;

/// Context provided to spawner functions with helpers for common spawn patterns.
///
/// ```ignore
/// Simulation::builder()
///     .with_spawner(|ctx| {
///         Boid::new(ctx.random_in_sphere(5.0), ctx.random_direction())
///             .with_mask(ctx.flock_mask())
///     })
///     .build()?;
/// ```
pub struct SpawnContext {
    /// Index of the agent being spawned (0 to count-1).
    pub index: u32,
    /// Total number of agents being spawned.
    pub count: u32,
    /// Half-size of the spawn cube.
    pub extent: f32,
    flocks: u32,
    levels: u32,
    /// Internal RNG - use helper methods instead of accessing directly.
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a new spawn context for an agent.
    ///
    /// With a seed the RNG stream depends only on `(seed, index)`, so runs are
    /// reproducible. Without one it is seeded from the clock.
    pub fn new(index: u32, config: &FlockConfig) -> Self {
        let base = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });
        // Spread consecutive indices across the seed space.
        let seed = base ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);

        Self {
            index,
            count: config.agent_count,
            extent: config.spawn_extent,
            flocks: config.flocks,
            levels: config.radii.levels,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Normalized progress through the spawn (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        self.index as f32 / self.count.max(1) as f32
    }

    /// Mask with the single bit of the flock this index belongs to.
    #[inline]
    pub fn flock_mask(&self) -> u32 {
        1 << (self.index % self.flocks.max(1))
    }

    /// Level this index is assigned to, cycling through the configured levels.
    #[inline]
    pub fn level(&self) -> u32 {
        self.index % self.levels.max(1)
    }

    /// Random f32 in the given range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.gen_range(min..max)
    }

    /// Random point inside a cube of given half-size, centered at origin.
    pub fn random_in_cube(&mut self, half_size: f32) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-half_size..half_size),
            self.rng.gen_range(-half_size..half_size),
            self.rng.gen_range(-half_size..half_size),
        )
    }

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Distribution is uniform throughout the volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        let cos_phi: f32 = self.rng.gen_range(-1.0..1.0);
        let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
        // Cube root for uniform volume distribution
        let r = radius * self.rng.gen::<f32>().cbrt();

        Vec3::new(
            r * sin_phi * theta.cos(),
            r * sin_phi * theta.sin(),
            r * cos_phi,
        )
    }

    /// Random unit vector.
    pub fn random_direction(&mut self) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        let phi = self.rng.gen_range(0.0..PI);
        Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
    }
}

/// Default spawner: uniform positions in the spawn cube, headings with each
/// component uniform in `[-1, 1)` scaled to at most `max_heading`, flock bit
/// and level assigned round-robin.
pub fn random_boid(ctx: &mut SpawnContext, max_heading: f32) -> Boid {
    let pos = ctx.random_in_cube(ctx.extent);
    let heading = ctx.random_in_cube(1.0);
    Boid::new(pos, crate::steering::clamp_length(heading, max_heading))
        .with_level(ctx.level())
        .with_mask(ctx.flock_mask())
}

/// Spawn `config.agent_count` agents with `spawner`.
pub fn spawn_with<F>(config: &FlockConfig, spawner: F) -> Vec<Boid>
where
    F: Fn(&mut SpawnContext) -> Boid,
{
    (0..config.agent_count)
        .map(|i| spawner(&mut SpawnContext::new(i, config)))
        .collect()
}

/// Spawn `config.agent_count` agents with [`random_boid`].
pub fn random_flock(config: &FlockConfig) -> Vec<Boid> {
    spawn_with(config, |ctx| random_boid(ctx, config.max_heading))
}
