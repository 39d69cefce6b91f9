//! Per-agent flocking state.
//!
//! [`Boid`] is laid out for direct upload to GPU storage buffers: two
//! `vec3<f32>` + `u32` pairs, 32 bytes, no implicit padding. Group membership
//! and hierarchy tier are plain numeric tags filtered with flat predicates so
//! every agent runs the same scan code.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Number of hierarchy levels. Valid levels are `0..MAX_LEVELS`.
pub const MAX_LEVELS: u32 = 16;

/// Mask value of a culled agent. Inert agents never interact.
pub const MASK_INERT: u32 = 0;

/// Mask value of an agent that belongs to every flock.
pub const MASK_ALL: u32 = u32::MAX;

/// A single flocking agent.
///
/// Matches the WGSL struct:
///
/// ```text
/// struct Boid {
///     pos: vec3<f32>,
///     level: u32,
///     heading: vec3<f32>,
///     mask: u32,
/// };
/// ```
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Boid {
    /// World-space position.
    pub pos: [f32; 3],
    /// Hierarchy tier; coarser tiers (lower numbers) perceive a wider radius.
    pub level: u32,
    /// Direction of travel, bounded in magnitude.
    pub heading: [f32; 3],
    /// Flock membership bits. Zero means inert.
    pub mask: u32,
}

impl Boid {
    /// Create a live agent at level 0 that belongs to every flock.
    pub fn new(pos: Vec3, heading: Vec3) -> Self {
        Self {
            pos: pos.to_array(),
            level: 0,
            heading: heading.to_array(),
            mask: MASK_ALL,
        }
    }

    /// Set the hierarchy level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Set the flock membership mask.
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.pos)
    }

    #[inline]
    pub fn heading(&self) -> Vec3 {
        Vec3::from_array(self.heading)
    }

    /// Whether the agent takes part in neighbor scans.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.mask != MASK_INERT
    }

    /// Whether the two agents may influence each other.
    ///
    /// True when the masks share a bit. Inert agents share no bits with anyone.
    #[inline]
    pub fn shares_flock(&self, other: &Boid) -> bool {
        self.mask & other.mask != 0
    }

    /// Whether position and heading are free of NaN and infinity.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position().is_finite() && self.heading().is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_gpu_struct() {
        assert_eq!(std::mem::size_of::<Boid>(), 32);
        assert_eq!(std::mem::offset_of!(Boid, pos), 0);
        assert_eq!(std::mem::offset_of!(Boid, level), 12);
        assert_eq!(std::mem::offset_of!(Boid, heading), 16);
        assert_eq!(std::mem::offset_of!(Boid, mask), 28);
    }

    #[test]
    fn test_zeroed_boid_is_inert() {
        let boid: Boid = Zeroable::zeroed();
        assert!(!boid.is_live());
        assert_eq!(boid, Boid::default());
    }

    #[test]
    fn test_shares_flock() {
        let a = Boid::new(Vec3::ZERO, Vec3::X).with_mask(0b0011);
        let b = Boid::new(Vec3::ZERO, Vec3::X).with_mask(0b0110);
        let c = Boid::new(Vec3::ZERO, Vec3::X).with_mask(0b1000);
        let inert = Boid::new(Vec3::ZERO, Vec3::X).with_mask(MASK_INERT);

        assert!(a.shares_flock(&b));
        assert!(!a.shares_flock(&c));
        assert!(!a.shares_flock(&inert));
        assert!(!inert.shares_flock(&inert));
    }

    #[test]
    fn test_cast_slice_roundtrip_bytes() {
        let boids = [Boid::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y).with_level(2)];
        let bytes: &[u8] = bytemuck::cast_slice(&boids);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[12..16], &2u32.to_ne_bytes());
        assert_eq!(&bytes[28..32], &u32::MAX.to_ne_bytes());
    }

    #[test]
    fn test_is_finite() {
        let mut boid = Boid::new(Vec3::ONE, Vec3::X);
        assert!(boid.is_finite());
        boid.heading[1] = f32::NAN;
        assert!(!boid.is_finite());
    }
}
