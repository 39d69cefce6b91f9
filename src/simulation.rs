//! Simulation builder and runner

use std::sync::Arc;

use glam::Mat4;
use tracing::info;

use crate::boid::Boid;
use crate::config::FlockConfig;
use crate::engine::{AccumulationEngine, CancelToken, TickReport};
use crate::error::SimulationError;
use crate::partition::Group;
use crate::render::RenderFrame;
use crate::spawn::{random_boid, spawn_with, SpawnContext};
use crate::store::{AgentStore, Snapshot};
use crate::time::SimClock;

type Spawner = Box<dyn Fn(&mut SpawnContext) -> Boid + Send + Sync>;

/// A flocking simulation builder.
///
/// Use method chaining to configure, then call `.build()`.
pub struct SimulationBuilder {
    config: FlockConfig,
    spawner: Option<Spawner>,
    boids: Option<Vec<Boid>>,
}

impl SimulationBuilder {
    fn new() -> Self {
        Self {
            config: FlockConfig::default(),
            spawner: None,
            boids: None,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: FlockConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of agents to spawn.
    pub fn with_agent_count(mut self, count: u32) -> Self {
        self.config.agent_count = count;
        self
    }

    /// Make spawning reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the agent spawner. Called once per agent index.
    pub fn with_spawner<F>(mut self, spawner: F) -> Self
    where
        F: Fn(&mut SpawnContext) -> Boid + Send + Sync + 'static,
    {
        self.spawner = Some(Box::new(spawner));
        self
    }

    /// Start from an explicit initial state. Overrides the agent count and
    /// any spawner.
    pub fn with_boids(mut self, boids: Vec<Boid>) -> Self {
        self.boids = Some(boids);
        self
    }

    /// Validate the configuration and populate the store.
    pub fn build(self) -> Result<Simulation, SimulationError> {
        let mut config = self.config;
        if let Some(boids) = &self.boids {
            config.agent_count = boids.len() as u32;
        }
        config.validate()?;

        let boids = match (self.boids, self.spawner) {
            (Some(boids), _) => boids,
            (None, Some(spawner)) => spawn_with(&config, spawner),
            (None, None) => {
                let max_heading = config.max_heading;
                spawn_with(&config, |ctx| random_boid(ctx, max_heading))
            }
        };

        let store = Arc::new(AgentStore::new(boids)?);
        let engine = AccumulationEngine::new(&config)?;
        let clock = SimClock::new(config.time_step);

        info!(
            agents = store.len(),
            flocks = config.flocks,
            levels = config.radii.levels,
            search = ?config.search,
            "simulation built"
        );

        Ok(Simulation {
            config,
            store,
            engine,
            clock,
            cancel: CancelToken::new(),
        })
    }
}

/// A running flock: store, engine and clock.
pub struct Simulation {
    config: FlockConfig,
    store: Arc<AgentStore>,
    engine: AccumulationEngine,
    clock: SimClock,
    cancel: CancelToken,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Run one tick. The clock only advances when the tick commits.
    pub fn step(&mut self) -> Result<TickReport, SimulationError> {
        let report = self.engine.tick(&self.store, &self.cancel)?;
        self.clock.advance();
        Ok(report)
    }

    /// Run `ticks` ticks, returning the last report.
    ///
    /// Stops at the first abandoned tick; ticks committed before it stay
    /// committed.
    pub fn run(&mut self, ticks: u64) -> Result<TickReport, SimulationError> {
        let mut last = TickReport {
            tick: self.store.tick(),
            ..TickReport::default()
        };
        for _ in 0..ticks {
            last = self.step()?;
        }
        Ok(last)
    }

    /// Read the committed frame.
    pub fn snapshot(&self) -> Snapshot<'_> {
        self.store.snapshot()
    }

    /// Shared handle for readers on other threads.
    pub fn store(&self) -> Arc<AgentStore> {
        Arc::clone(&self.store)
    }

    /// Token that abandons the tick in flight when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Partition groups from the last tick, in heap order.
    pub fn groups(&self) -> Vec<Group> {
        self.engine.partition().nodes().iter().flatten().copied().collect()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Draw inputs for the committed frame under `model`.
    pub fn frame(&self, model: Mat4) -> RenderFrame {
        let snapshot = self.store.snapshot();
        RenderFrame::new(&snapshot, &self.groups(), model, self.clock.animation())
    }
}
