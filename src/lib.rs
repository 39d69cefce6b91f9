//! # Stereo Flock - hierarchical boid accumulation
//!
//! A flocking core built around a two-lane neighbor reduction, a
//! double-buffered agent store, and a thin stereo render adapter.
//!
//! ## Quick Start
//!
//! ```ignore
//! use stereo_flock::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     let mut sim = Simulation::builder()
//!         .with_agent_count(512)
//!         .with_seed(7)
//!         .with_spawner(|ctx| {
//!             Boid::new(ctx.random_in_sphere(8.0), ctx.random_direction() * 0.5)
//!                 .with_mask(ctx.flock_mask())
//!         })
//!         .build()?;
//!
//!     let report = sim.run(100)?;
//!     println!("tick {} with {} interactions", report.tick, report.interactions);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Agents
//!
//! A [`Boid`] is a 32-byte GPU-compatible record: position, hierarchy level,
//! heading and flock mask. A mask of zero makes the agent inert: it neither
//! perceives nor is perceived and stays frozen.
//!
//! ### Accumulation
//!
//! Every tick the [`AccumulationEngine`] scans the committed frame. Each agent
//! owns one [`Accumulator`] with two [`AccumulatorHalf`] lanes; even-indexed
//! neighbors fold into `left`, odd-indexed into `right`, so the lanes fill in
//! parallel without synchronization. Merging the lanes gives the neighbor
//! means that drive separation, alignment and cohesion.
//!
//! An agent at level `L` perceives neighbors within
//! [`LevelRadii::radius`]`(L)`. Levels only change the radius.
//!
//! ### Store
//!
//! [`AgentStore`] holds two frames and flips between them on commit. Readers
//! on other threads always see one whole tick. A cancelled or failed tick
//! commits nothing.
//!
//! ### Rendering
//!
//! The [`render`] module turns a frame into per-instance transforms for a
//! multiview pipeline: one view-projection per eye, color folded from each
//! instance's orientation. [`StereoRenderer`] draws them offscreen with wgpu.
//!
//! ## Configuration
//!
//! [`FlockConfig`] loads from JSON; every field has a default:
//!
//! ```json
//! {
//!     "agent_count": 1024,
//!     "flocks": 2,
//!     "radii": { "base": 6.0, "falloff": 0.5, "levels": 3 },
//!     "boundary": { "kind": "wrap", "half_extent": 20.0 }
//! }
//! ```

pub mod accumulator;
pub mod boid;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod partition;
pub mod render;
pub mod simulation;
pub mod spatial;
pub mod spawn;
pub mod steering;
pub mod store;
pub mod time;

pub use bytemuck;
pub use glam::{Mat4, Vec3, Vec4};

pub use accumulator::{Accumulator, AccumulatorHalf, Contribution, Lane};
pub use boid::{Boid, MASK_ALL, MASK_INERT, MAX_LEVELS};
pub use config::{Boundary, FlockConfig, LevelRadii, NeighborSearch, PartitionConfig, SteeringWeights};
pub use engine::{AccumulationEngine, CancelToken, TickReport};
pub use error::{ConfigError, GpuError, SimulationError, StoreError, TickError};
pub use gpu::{StereoImage, StereoRenderer};
pub use partition::{Group, PartitionTree};
pub use render::{Eye, OrbitCamera, RenderFrame, StereoCamera};
pub use simulation::{Simulation, SimulationBuilder};
pub use spatial::SpatialConfig;
pub use spawn::SpawnContext;
pub use store::{AgentStore, Snapshot};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use stereo_flock::prelude::*;
/// ```
pub mod prelude {
    pub use crate::boid::Boid;
    pub use crate::config::{Boundary, FlockConfig, NeighborSearch};
    pub use crate::engine::{CancelToken, TickReport};
    pub use crate::error::SimulationError;
    pub use crate::render::{Eye, OrbitCamera, StereoCamera};
    pub use crate::simulation::Simulation;
    pub use crate::spawn::SpawnContext;
    pub use crate::{Mat4, Vec3, Vec4};
}
