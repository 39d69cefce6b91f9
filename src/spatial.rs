//! Spatial hashing using Morton encoding (Z-order curve).
//!
//! Agents are bucketed into a cube of `grid_resolution^3` cells centered on
//! the origin. Each tick the live agents are sorted by the Morton code of their
//! cell and a start/end table is built over the sorted order, so a cell's
//! members are one contiguous run. Positions outside the grid clamp into the
//! edge cells; clamping never separates two agents that are within a radius of
//! each other, so queries stay exact.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::boid::Boid;

/// Configuration for the spatial hashing grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Size of each cell in world units
    pub cell_size: f32,
    /// Number of cells per dimension (grid is cell_count^3)
    pub grid_resolution: u32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cell_size: 5.0,
            grid_resolution: 16, // 16^3 = 4096 cells, covers a 80-unit cube
        }
    }
}

impl SpatialConfig {
    pub fn new(cell_size: f32, grid_resolution: u32) -> Self {
        assert!(grid_resolution.is_power_of_two(), "Grid resolution must be power of 2");
        assert!(grid_resolution <= 1024, "Grid resolution must be <= 1024 for 30-bit Morton codes");
        Self { cell_size, grid_resolution }
    }

    /// Total number of cells in the grid
    pub fn total_cells(&self) -> u32 {
        self.grid_resolution * self.grid_resolution * self.grid_resolution
    }

    /// Cell coordinates of a world position, clamped into the grid.
    #[inline]
    pub fn pos_to_cell(&self, pos: Vec3) -> IVec3 {
        let half_grid = self.grid_resolution as f32 * self.cell_size * 0.5;
        let normalized = (pos + Vec3::splat(half_grid)) / self.cell_size;
        let max = (self.grid_resolution - 1) as f32;
        // NaN clamps to 0 through the saturating float-to-int cast.
        normalized.floor().clamp(Vec3::ZERO, Vec3::splat(max)).as_ivec3()
    }
}

/// Expand a 10-bit integer to 30 bits by inserting 2 zeros between each bit.
#[inline]
pub fn expand_bits(v: u32) -> u32 {
    let mut x = v & 0x0000_03FF;
    x = (x | (x << 16)) & 0x0300_00FF;
    x = (x | (x << 8)) & 0x0300_F00F;
    x = (x | (x << 4)) & 0x030C_30C3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// Compute the 30-bit Morton code for a cell (each coordinate 0-1023).
#[inline]
pub fn morton_encode(x: u32, y: u32, z: u32) -> u32 {
    expand_bits(x) | (expand_bits(y) << 1) | (expand_bits(z) << 2)
}

/// Compact 30 bits to 10 bits by extracting every third bit.
#[inline]
pub fn compact_bits(v: u32) -> u32 {
    let mut x = v & 0x0924_9249;
    x = (x | (x >> 2)) & 0x030C_30C3;
    x = (x | (x >> 4)) & 0x0300_F00F;
    x = (x | (x >> 8)) & 0x0300_00FF;
    x = (x | (x >> 16)) & 0x0000_03FF;
    x
}

/// Decode a Morton code back to cell coordinates.
#[inline]
pub fn morton_decode(code: u32) -> (u32, u32, u32) {
    (compact_bits(code), compact_bits(code >> 1), compact_bits(code >> 2))
}

/// Uniform grid over the live agents of one frame.
pub struct SpatialGrid {
    config: SpatialConfig,
    /// `(morton code, agent index)`, sorted by code.
    sorted: Vec<(u32, u32)>,
    /// Start of each cell's run in `sorted`, indexed by Morton code.
    cell_start: Vec<u32>,
    /// One past the end of each cell's run.
    cell_end: Vec<u32>,
}

impl SpatialGrid {
    pub fn new(config: SpatialConfig) -> Self {
        let cells = config.total_cells() as usize;
        Self {
            config,
            sorted: Vec::new(),
            cell_start: vec![0; cells],
            cell_end: vec![0; cells],
        }
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Number of agents currently bucketed.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Rebuild the grid from a frame. Inert agents are left out.
    pub fn rebuild(&mut self, boids: &[Boid]) {
        self.sorted.clear();
        self.sorted.extend(boids.iter().enumerate().filter(|(_, b)| b.is_live()).map(|(i, b)| {
            let cell = self.config.pos_to_cell(b.position());
            (morton_encode(cell.x as u32, cell.y as u32, cell.z as u32), i as u32)
        }));
        self.sorted.sort_unstable();

        self.cell_start.fill(0);
        self.cell_end.fill(0);
        let n = self.sorted.len();
        for idx in 0..n {
            let code = self.sorted[idx].0 as usize;
            if idx == 0 || self.sorted[idx - 1].0 as usize != code {
                self.cell_start[code] = idx as u32;
            }
            if idx == n - 1 || self.sorted[idx + 1].0 as usize != code {
                self.cell_end[code] = idx as u32 + 1;
            }
        }
    }

    /// Agent indices bucketed in one cell.
    pub fn cell(&self, cell: IVec3) -> impl Iterator<Item = usize> + '_ {
        let code = morton_encode(cell.x as u32, cell.y as u32, cell.z as u32) as usize;
        let (start, end) = (self.cell_start[code] as usize, self.cell_end[code] as usize);
        self.sorted[start..end].iter().map(|&(_, i)| i as usize)
    }

    /// Visit every agent whose cell lies within `radius` of `pos`.
    ///
    /// This is a superset of the agents within `radius`; callers still test
    /// the exact distance.
    pub fn for_each_candidate(&self, pos: Vec3, radius: f32, mut f: impl FnMut(usize)) {
        let res = self.config.grid_resolution as i32;
        // One extra cell: rounding in `pos_to_cell` can push an agent exactly
        // `radius` away one cell past `ceil(radius / cell_size)`.
        let reach = ((radius / self.config.cell_size).ceil() as i32 + 1).clamp(0, res);
        let center = self.config.pos_to_cell(pos);
        let lo = (center - IVec3::splat(reach)).max(IVec3::ZERO);
        let hi = (center + IVec3::splat(reach)).min(IVec3::splat(res - 1));

        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    for idx in self.cell(IVec3::new(x, y, z)) {
                        f(idx);
                    }
                }
            }
        }
    }
}
