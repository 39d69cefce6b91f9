//! Hierarchical plane partition of the flock.
//!
//! The root node summarizes every live agent as a [`Group`] (mean position and
//! mean heading). Each node then splits its members by the plane through its
//! center whose normal is its mean heading: agents behind the plane fold into
//! the `left` half of an [`Accumulator`], the rest into `right`. Non-empty
//! halves become the node's children. Nodes are stored in heap order, so node
//! `n` has children `2n + 1` and `2n + 2`.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rayon::prelude::*;

use crate::accumulator::{Accumulator, AccumulatorHalf, Lane};
use crate::boid::Boid;

/// Summary of one partition node, laid out for GPU upload.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Group {
    pub center: [f32; 3],
    pub _filler0: u32,
    pub heading: [f32; 3],
    pub _filler1: u32,
}

impl Group {
    /// Mean state of a lane, or `None` if it is empty.
    pub fn from_half(half: &AccumulatorHalf) -> Option<Group> {
        half.mean().map(|c| Group {
            center: c.mean_pos.to_array(),
            _filler0: 0,
            heading: c.mean_heading.to_array(),
            _filler1: 0,
        })
    }

    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.center)
    }

    pub fn heading(&self) -> Vec3 {
        Vec3::from_array(self.heading)
    }

    /// Side of this node's splitting plane that `pos` falls on.
    #[inline]
    pub fn side(&self, pos: Vec3) -> Lane {
        if (pos - self.center()).dot(self.heading()) < 0.0 {
            Lane::Left
        } else {
            Lane::Right
        }
    }
}

/// Heap-ordered binary partition of the live agents.
#[derive(Clone, Debug, Default)]
pub struct PartitionTree {
    depth: u32,
    nodes: Vec<Option<Group>>,
}

impl PartitionTree {
    /// Build a tree with `depth` levels of splits below the root.
    pub fn build(boids: &[Boid], depth: u32) -> Self {
        let node_count = (1usize << (depth + 1)) - 1;
        let mut nodes: Vec<Option<Group>> = vec![None; node_count];

        let root = boids
            .par_iter()
            .filter(|b| b.is_live())
            .fold(AccumulatorHalf::default, |mut acc, b| {
                acc.add(b);
                acc
            })
            .reduce(AccumulatorHalf::default, AccumulatorHalf::combine);
        nodes[0] = Group::from_half(&root);

        // Heap index of the node each agent currently sits in.
        let mut membership: Vec<u32> = vec![0; boids.len()];

        for level in 0..depth {
            let first = (1usize << level) - 1;
            let width = 1usize << level;
            let planes = &nodes[first..first + width];

            let accs = boids
                .par_iter()
                .zip(membership.par_iter_mut())
                .fold(
                    || vec![Accumulator::EMPTY; width],
                    |mut accs, (boid, node)| {
                        if !boid.is_live() {
                            return accs;
                        }
                        let slot = *node as usize - first;
                        if let Some(plane) = &planes[slot] {
                            let lane = plane.side(boid.position());
                            accs[slot].half_mut(lane).add(boid);
                            let child = 2 * *node + 1;
                            *node = match lane {
                                Lane::Left => child,
                                Lane::Right => child + 1,
                            };
                        }
                        accs
                    },
                )
                .reduce(
                    || vec![Accumulator::EMPTY; width],
                    |a, b| a.into_iter().zip(b).map(|(x, y)| x.combine(y)).collect(),
                );

            for (slot, acc) in accs.iter().enumerate() {
                let parent = first + slot;
                nodes[2 * parent + 1] = Group::from_half(&acc.left);
                nodes[2 * parent + 2] = Group::from_half(&acc.right);
            }
        }

        Self { depth, nodes }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// All nodes in heap order.
    pub fn nodes(&self) -> &[Option<Group>] {
        &self.nodes
    }

    /// Node `index` within `level` (`0 <= index < 2^level`).
    pub fn node(&self, level: u32, index: usize) -> Option<&Group> {
        if level > self.depth || index >= 1usize << level {
            return None;
        }
        self.nodes[(1usize << level) - 1 + index].as_ref()
    }

    pub fn root(&self) -> Option<&Group> {
        self.nodes.first().and_then(Option::as_ref)
    }

    /// Non-empty nodes of the deepest level.
    pub fn leaves(&self) -> impl Iterator<Item = &Group> + '_ {
        let first = (1usize << self.depth) - 1;
        self.nodes[first..].iter().flatten()
    }
}
