//! Flocking rules and integration.
//!
//! Steering works from the merged neighbor means, not from individual
//! neighbors: cohesion pulls toward the mean position, alignment toward the
//! mean heading, separation pushes away from the mean position once it gets
//! closer than `separation_distance`.

use glam::Vec3;

use crate::accumulator::Contribution;
use crate::boid::Boid;
use crate::config::{Boundary, FlockConfig, SteeringWeights};

/// Per-tick constants for the steer and integrate phase.
#[derive(Clone, Debug)]
pub struct Steering {
    pub weights: SteeringWeights,
    pub time_step: f32,
    pub speed: f32,
    pub max_heading: f32,
    pub boundary: Boundary,
}

/// Outcome of updating one agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Integrated {
    pub boid: Boid,
    /// A non-finite heading or position was replaced.
    pub sanitized: bool,
}

impl Steering {
    pub fn from_config(config: &FlockConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            time_step: config.time_step,
            speed: config.speed,
            max_heading: config.max_heading,
            boundary: config.boundary,
        }
    }

    /// Combined steering force from the neighbor means.
    pub fn force(&self, boid: &Boid, neighbors: &Contribution) -> Vec3 {
        let pos = boid.position();
        let heading = boid.heading();
        let w = &self.weights;

        let cohesion = (neighbors.mean_pos - pos) * w.cohesion;
        let alignment = (neighbors.mean_heading - heading) * w.alignment;

        let away = pos - neighbors.mean_pos;
        let d = away.length();
        let separation = if d < w.separation_distance {
            away.normalize_or_zero() * (1.0 - d / w.separation_distance) * w.separation
        } else {
            Vec3::ZERO
        };

        cohesion + alignment + separation
    }

    /// New heading for one agent.
    ///
    /// With no neighbors the heading is returned untouched.
    pub fn heading(&self, boid: &Boid, neighbors: Option<&Contribution>) -> Vec3 {
        match neighbors {
            None => boid.heading(),
            Some(n) => {
                let steered = boid.heading() + self.force(boid, n) * self.time_step;
                clamp_length(steered, self.max_heading)
            }
        }
    }

    /// Steer, integrate, and sanitize one agent.
    ///
    /// Inert agents are returned unchanged.
    pub fn update(&self, boid: &Boid, neighbors: Option<&Contribution>) -> Integrated {
        if !boid.is_live() {
            return Integrated {
                boid: *boid,
                sanitized: false,
            };
        }

        let mut sanitized = false;
        let mut heading = self.heading(boid, neighbors);
        if !heading.is_finite() {
            sanitized = true;
            let prior = boid.heading();
            heading = if prior.is_finite() {
                clamp_length(prior, self.max_heading)
            } else {
                Vec3::ZERO
            };
        }

        let mut pos = self.wrap(boid.position() + heading * self.speed * self.time_step);
        if !pos.is_finite() {
            sanitized = true;
            pos = boid.position();
        }

        Integrated {
            boid: Boid {
                pos: pos.to_array(),
                heading: heading.to_array(),
                ..*boid
            },
            sanitized,
        }
    }

    fn wrap(&self, pos: Vec3) -> Vec3 {
        match self.boundary {
            Boundary::Open => pos,
            Boundary::Wrap { half_extent } => {
                let size = 2.0 * half_extent;
                let shifted = pos + Vec3::splat(half_extent);
                shifted - size * (shifted / size).floor() - Vec3::splat(half_extent)
            }
        }
    }
}

/// Scale `v` down to `max` length if it is longer. NaN passes through.
#[inline]
pub fn clamp_length(v: Vec3, max: f32) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq > max * max {
        v * (max / len_sq.sqrt())
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steering() -> Steering {
        Steering::from_config(&FlockConfig::default())
    }

    fn contribution(pos: Vec3, heading: Vec3) -> Contribution {
        Contribution {
            count: 1,
            mean_pos: pos,
            mean_heading: heading,
        }
    }

    #[test]
    fn test_no_neighbors_keeps_heading_exactly() {
        let s = steering();
        let boid = Boid::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.3, -0.2, 0.1));
        let out = s.update(&boid, None);
        assert_eq!(out.boid.heading, boid.heading);
        assert!(!out.sanitized);
        let expected = boid.position() + boid.heading() * s.speed * s.time_step;
        assert!((out.boid.position() - expected).length() < 1e-6);
    }

    #[test]
    fn test_cohesion_pulls_toward_mean() {
        let mut s = steering();
        s.weights.alignment = 0.0;
        s.weights.separation = 0.0;
        let boid = Boid::new(Vec3::ZERO, Vec3::ZERO);
        let n = contribution(Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO);
        assert!(s.heading(&boid, Some(&n)).x > 0.0);
    }

    #[test]
    fn test_separation_pushes_away_when_close() {
        let mut s = steering();
        s.weights.alignment = 0.0;
        s.weights.cohesion = 0.0;
        let boid = Boid::new(Vec3::ZERO, Vec3::ZERO);
        let n = contribution(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO);
        assert!(s.force(&boid, &n).x < 0.0);

        let far = contribution(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(s.force(&boid, &far), Vec3::ZERO);
    }

    #[test]
    fn test_alignment_turns_toward_mean_heading() {
        let mut s = steering();
        s.weights.cohesion = 0.0;
        s.weights.separation = 0.0;
        let boid = Boid::new(Vec3::ZERO, Vec3::X);
        let n = contribution(Vec3::ZERO, Vec3::Y);
        let h = s.heading(&boid, Some(&n));
        assert!(h.y > 0.0 && h.x < 1.0);
    }

    #[test]
    fn test_heading_is_clamped() {
        let mut s = steering();
        s.weights.cohesion = 1000.0;
        let boid = Boid::new(Vec3::ZERO, Vec3::X);
        let n = contribution(Vec3::new(50.0, 50.0, 0.0), Vec3::X);
        let h = s.heading(&boid, Some(&n));
        assert!(h.length() <= s.max_heading + 1e-5);
    }

    #[test]
    fn test_nan_is_sanitized_per_agent() {
        let s = steering();
        let boid = Boid::new(Vec3::ZERO, Vec3::X);
        let n = contribution(Vec3::splat(f32::NAN), Vec3::X);
        let out = s.update(&boid, Some(&n));
        assert!(out.sanitized);
        assert!(out.boid.is_finite());
        assert_eq!(out.boid.heading, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_inert_agent_is_frozen() {
        let s = steering();
        let boid = Boid::new(Vec3::ONE, Vec3::X).with_mask(0);
        assert_eq!(s.update(&boid, None).boid, boid);
    }

    #[test]
    fn test_wrap_boundary() {
        let mut s = steering();
        s.boundary = Boundary::Wrap { half_extent: 10.0 };
        let wrapped = s.wrap(Vec3::new(10.5, -10.5, 3.0));
        assert!((wrapped - Vec3::new(-9.5, 9.5, 3.0)).length() < 1e-5);
    }
}
