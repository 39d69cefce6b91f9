//! Per-eye camera transforms.
//!
//! The GPU sees one uniform block with two view-projection matrices. The
//! multiview view index selects the row: 0 is the left eye, 1 the right.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Which eye a view index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Eye {
    Left = 0,
    Right = 1,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Map a multiview view index to an eye. Only 0 and 1 are valid.
    pub fn from_view_index(view_index: u32) -> Option<Eye> {
        match view_index {
            0 => Some(Eye::Left),
            1 => Some(Eye::Right),
            _ => None,
        }
    }
}

/// Camera uniform block: `struct Camera { views: array<mat4x4<f32>, 2> }`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub views: [[[f32; 4]; 4]; 2],
}

/// A pair of view-projection matrices, one per eye.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StereoCamera {
    views: [Mat4; 2],
}

impl StereoCamera {
    pub fn new(left: Mat4, right: Mat4) -> Self {
        Self {
            views: [left, right],
        }
    }

    /// Both eyes share one matrix.
    pub fn mono(view_proj: Mat4) -> Self {
        Self::new(view_proj, view_proj)
    }

    /// Parallel-axis stereo pair around an orbit camera.
    pub fn from_orbit(orbit: &OrbitCamera, eye_separation: f32, aspect: f32) -> Self {
        let proj = orbit.projection(aspect);
        Self::new(
            proj * orbit.eye_view(Eye::Left, eye_separation),
            proj * orbit.eye_view(Eye::Right, eye_separation),
        )
    }

    #[inline]
    pub fn view(&self, eye: Eye) -> Mat4 {
        self.views[eye.index()]
    }

    pub fn set_view(&mut self, eye: Eye, view_proj: Mat4) {
        self.views[eye.index()] = view_proj;
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            views: [
                self.views[0].to_cols_array_2d(),
                self.views[1].to_cols_array_2d(),
            ],
        }
    }

    /// `camera[eye] * model * instance * local`, as the vertex shader computes it.
    pub fn clip_position(&self, eye: Eye, model: Mat4, instance: Mat4, local: Vec3) -> Vec4 {
        self.view(eye) * model * instance * local.extend(1.0)
    }
}

/// Orbit camera for viewing the flock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    /// Create a new camera with default positioning.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance: 35.0,
            target: Vec3::ZERO,
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 200.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// View matrix for one eye, shifted sideways by half the eye separation.
    pub fn eye_view(&self, eye: Eye, eye_separation: f32) -> Mat4 {
        let forward = self.target - self.position();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let sign = match eye {
            Eye::Left => -0.5,
            Eye::Right => 0.5,
        };
        let offset = right * eye_separation * sign;
        Mat4::look_at_rh(self.position() + offset, self.target + offset, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}
