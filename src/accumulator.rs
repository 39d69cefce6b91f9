//! Two-lane reduction buffers.
//!
//! An [`Accumulator`] holds two [`AccumulatorHalf`] lanes. During the scan
//! phase each lane is written by exactly one execution context, so the halves
//! never contend. After the scan barrier, [`Accumulator::merge`] folds both
//! lanes into one [`Contribution`].
//!
//! The same type doubles as the cell of a pairwise tree reduction
//! ([`Accumulator::combine`]), where `left` and `right` carry the two sides of a
//! partition plane.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::boid::Boid;

/// Which half of an [`Accumulator`] a neighbor feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    /// Lane assignment by neighbor index parity: even indices feed `left`,
    /// odd indices feed `right`.
    #[inline]
    pub fn of(index: usize) -> Lane {
        if index % 2 == 0 {
            Lane::Left
        } else {
            Lane::Right
        }
    }
}

/// One reduction lane: running sums of neighbor positions and headings.
///
/// The sums are only meaningful while `count > 0`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AccumulatorHalf {
    pub pos: [f32; 3],
    pub count: u32,
    pub heading: [f32; 3],
    pub _filler: u32,
}

impl AccumulatorHalf {
    pub const EMPTY: Self = Self {
        pos: [0.0; 3],
        count: 0,
        heading: [0.0; 3],
        _filler: 0,
    };

    /// Fold one neighbor into the lane.
    #[inline]
    pub fn add(&mut self, boid: &Boid) {
        self.add_raw(boid.position(), boid.heading());
    }

    #[inline]
    pub(crate) fn add_raw(&mut self, pos: Vec3, heading: Vec3) {
        self.pos = (Vec3::from_array(self.pos) + pos).to_array();
        self.heading = (Vec3::from_array(self.heading) + heading).to_array();
        self.count += 1;
    }

    /// Sum of two lanes.
    #[inline]
    pub fn combine(self, other: Self) -> Self {
        Self {
            pos: (Vec3::from_array(self.pos) + Vec3::from_array(other.pos)).to_array(),
            count: self.count + other.count,
            heading: (Vec3::from_array(self.heading) + Vec3::from_array(other.heading))
                .to_array(),
            _filler: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of the folded contributions, or `None` for an empty lane.
    pub fn mean(&self) -> Option<Contribution> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f32;
        Some(Contribution {
            count: self.count,
            mean_pos: Vec3::from_array(self.pos) / n,
            mean_heading: Vec3::from_array(self.heading) / n,
        })
    }
}

/// Per-agent scratch buffer split into two independently written lanes.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Accumulator {
    pub left: AccumulatorHalf,
    pub right: AccumulatorHalf,
}

impl Accumulator {
    pub const EMPTY: Self = Self {
        left: AccumulatorHalf::EMPTY,
        right: AccumulatorHalf::EMPTY,
    };

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    #[inline]
    pub fn half(&self, lane: Lane) -> &AccumulatorHalf {
        match lane {
            Lane::Left => &self.left,
            Lane::Right => &self.right,
        }
    }

    #[inline]
    pub fn half_mut(&mut self, lane: Lane) -> &mut AccumulatorHalf {
        match lane {
            Lane::Left => &mut self.left,
            Lane::Right => &mut self.right,
        }
    }

    /// Disjoint mutable borrows of both lanes, for handing to two workers.
    #[inline]
    pub fn lanes_mut(&mut self) -> (&mut AccumulatorHalf, &mut AccumulatorHalf) {
        (&mut self.left, &mut self.right)
    }

    /// Total number of contributions across both lanes.
    #[inline]
    pub fn count(&self) -> u32 {
        self.left.count + self.right.count
    }

    /// Merge both lanes into a single mean contribution.
    ///
    /// Returns `None` when neither lane received anything; callers must treat
    /// that as "no steering" and never divide.
    pub fn merge(&self) -> Option<Contribution> {
        self.left.combine(self.right).mean()
    }

    /// Lane-wise sum: `left + left`, `right + right`.
    ///
    /// Used as the reduction operator when many accumulators are folded into one.
    #[inline]
    pub fn combine(self, other: Self) -> Self {
        Self {
            left: self.left.combine(other.left),
            right: self.right.combine(other.right),
        }
    }
}

/// Result of merging an accumulator: neighbor count and the mean neighbor state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contribution {
    pub count: u32,
    pub mean_pos: Vec3,
    pub mean_heading: Vec3,
}
