//! The accumulation engine.
//!
//! One tick runs four phases over the committed frame:
//!
//! 1. **Scan**: for every live agent, two lanes walk the neighbor candidates.
//!    Even-indexed neighbors feed `left`, odd-indexed ones feed `right`. Each
//!    lane owns its half of the agent's [`Accumulator`] exclusively.
//! 2. **Merge**: after the scan barrier, both halves fold into one mean.
//! 3. **Steer**: flocking rules turn the mean into a new heading; position
//!    integrates by the heading and bad numbers are replaced per agent.
//! 4. **Commit**: the new frame becomes visible through the [`AgentStore`].
//!
//! Accumulators live in a scratch arena owned by the engine and are reset at
//! the start of every scan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::accumulator::{Accumulator, AccumulatorHalf, Lane};
use crate::boid::Boid;
use crate::config::{FlockConfig, LevelRadii, NeighborSearch};
use crate::error::{ConfigError, TickError};
use crate::partition::PartitionTree;
use crate::spatial::SpatialGrid;
use crate::steering::Steering;
use crate::store::AgentStore;

/// Shared flag for abandoning a tick before it commits.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear a previous cancellation so ticks can run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<(), TickError> {
        if self.is_cancelled() {
            Err(TickError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Summary of one committed tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number that was committed.
    pub tick: u64,
    pub live: usize,
    pub inert: usize,
    /// Live agents that found no eligible neighbor.
    pub isolated: usize,
    /// Total neighbor contributions folded this tick.
    pub interactions: u64,
    /// Agents whose heading or position had to be replaced.
    pub sanitized: usize,
    /// Non-empty leaves of the partition tree.
    pub groups: usize,
}

impl TickReport {
    fn merge(self, other: Self) -> Self {
        Self {
            tick: self.tick.max(other.tick),
            live: self.live + other.live,
            inert: self.inert + other.inert,
            isolated: self.isolated + other.isolated,
            interactions: self.interactions + other.interactions,
            sanitized: self.sanitized + other.sanitized,
            groups: self.groups + other.groups,
        }
    }
}

/// Whether `other` contributes to `agent`'s accumulator at the given radius.
///
/// Both must be live and share a flock bit, and `other` must lie within
/// `radius` of `agent`. The boundary is inclusive.
#[inline]
pub fn is_neighbor(agent: &Boid, other: &Boid, radius: f32) -> bool {
    agent.is_live()
        && other.is_live()
        && agent.shares_flock(other)
        && agent.position().distance_squared(other.position()) <= radius * radius
}

#[derive(Clone, Copy)]
enum Candidates<'a> {
    Grid(&'a SpatialGrid),
    All,
}

fn scan_lane(
    frame: &[Boid],
    agent: usize,
    radius: f32,
    lane: Lane,
    candidates: Candidates<'_>,
    half: &mut AccumulatorHalf,
) {
    let me = &frame[agent];
    let mut visit = |j: usize| {
        if j != agent && Lane::of(j) == lane && is_neighbor(me, &frame[j], radius) {
            half.add(&frame[j]);
        }
    };
    match candidates {
        Candidates::Grid(grid) => grid.for_each_candidate(me.position(), radius, visit),
        Candidates::All => {
            let start = match lane {
                Lane::Left => 0,
                Lane::Right => 1,
            };
            (start..frame.len()).step_by(2).for_each(&mut visit);
        }
    }
}

/// Runs flocking ticks against an [`AgentStore`].
pub struct AccumulationEngine {
    radii: LevelRadii,
    search: NeighborSearch,
    steering: Steering,
    partition_depth: u32,
    grid: SpatialGrid,
    scratch: Vec<Accumulator>,
    partition: PartitionTree,
}

impl AccumulationEngine {
    /// Build an engine for `config`, which is validated first.
    pub fn new(config: &FlockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            radii: config.radii.clone(),
            search: config.search,
            steering: Steering::from_config(config),
            partition_depth: config.partition.depth,
            grid: SpatialGrid::new(config.spatial),
            scratch: Vec::new(),
            partition: PartitionTree::default(),
        })
    }

    pub fn steering(&self) -> &Steering {
        &self.steering
    }

    /// Accumulators left by the most recent scan.
    pub fn accumulators(&self) -> &[Accumulator] {
        &self.scratch
    }

    /// Partition tree of the most recently committed frame.
    pub fn partition(&self) -> &PartitionTree {
        &self.partition
    }

    /// Scan phase: fill one accumulator per agent from `frame`.
    pub fn scan(&mut self, frame: &[Boid]) -> &[Accumulator] {
        self.scratch.clear();
        self.scratch.resize(frame.len(), Accumulator::EMPTY);

        let candidates = match self.search {
            NeighborSearch::Grid => {
                self.grid.rebuild(frame);
                Candidates::Grid(&self.grid)
            }
            NeighborSearch::BruteForce => Candidates::All,
        };
        let radii = &self.radii;

        self.scratch.par_iter_mut().enumerate().for_each(|(i, acc)| {
            let me = &frame[i];
            if !me.is_live() {
                return;
            }
            let radius = radii.radius(me.level);
            let (left, right) = acc.lanes_mut();
            rayon::join(
                || scan_lane(frame, i, radius, Lane::Left, candidates, left),
                || scan_lane(frame, i, radius, Lane::Right, candidates, right),
            );
        });

        &self.scratch
    }

    /// Merge and steer phase: write the next frame from the scanned accumulators.
    fn steer(&self, prev: &[Boid], next: &mut [Boid]) -> TickReport {
        let steering = &self.steering;
        next.par_iter_mut()
            .zip(prev.par_iter())
            .zip(self.scratch.par_iter())
            .map(|((out, boid), acc)| {
                let merged = acc.merge();
                let result = steering.update(boid, merged.as_ref());
                *out = result.boid;
                let live = boid.is_live();
                TickReport {
                    live: live as usize,
                    inert: !live as usize,
                    isolated: (live && merged.is_none()) as usize,
                    interactions: acc.count() as u64,
                    sanitized: result.sanitized as usize,
                    ..TickReport::default()
                }
            })
            .reduce(TickReport::default, TickReport::merge)
    }

    /// Run one full tick and commit it.
    ///
    /// If `cancel` fires before the commit, the store keeps its current frame
    /// and `TickError::Cancelled` is returned.
    pub fn tick(&mut self, store: &AgentStore, cancel: &CancelToken) -> Result<TickReport, TickError> {
        let depth = self.partition_depth;
        let mut partition = None;
        let (mut report, tick) = store.commit(|prev, next| {
            cancel.check()?;
            self.scan(prev);
            cancel.check()?;
            let mut report = self.steer(prev, next);
            if depth > 0 {
                // Built from the frame being committed so planes match agents.
                let tree = PartitionTree::build(next, depth);
                report.groups = tree.leaves().count();
                partition = Some(tree);
            }
            cancel.check()?;
            Ok(report)
        })?;
        report.tick = tick;
        if let Some(tree) = partition {
            self.partition = tree;
        }

        debug!(
            tick = report.tick,
            live = report.live,
            isolated = report.isolated,
            interactions = report.interactions,
            groups = report.groups,
            "tick committed"
        );
        if report.sanitized > 0 {
            warn!(
                tick = report.tick,
                sanitized = report.sanitized,
                "replaced non-finite agent state"
            );
        }
        Ok(report)
    }
}
