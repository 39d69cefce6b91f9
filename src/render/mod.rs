//! Render adapter: turns committed agent state into draw instances.
//!
//! Nothing here mutates the simulation. The adapter trusts the store's
//! invariants (finite, bounded headings) and only guards against headings too
//! short or too vertical to build a basis from.

mod camera;
mod shader;

pub use camera::{CameraUniform, Eye, OrbitCamera, StereoCamera};
pub use shader::STEREO_WGSL;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use rayon::prelude::*;

use crate::boid::Boid;
use crate::partition::Group;

/// Mesh vertex: position and a color attribute the shader ignores.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

/// Line mesh: vertices plus `u16` index pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct LineMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

/// A boid is a unit segment along local +Y.
pub fn boid_mesh() -> LineMesh {
    let color = [1.0; 3];
    LineMesh {
        vertices: vec![
            Vertex::new([0.0, 0.0, 0.0], color),
            Vertex::new([0.0, 1.0, 0.0], color),
        ],
        indices: vec![0, 1],
    }
}

/// Square outline of half-size `size` in the local XY plane.
pub fn plane_mesh(size: f32) -> LineMesh {
    let color = [1.0, 0.3, 0.0];
    LineMesh {
        vertices: vec![
            Vertex::new([size, size, 0.0], color),
            Vertex::new([size, -size, 0.0], color),
            Vertex::new([-size, -size, 0.0], color),
            Vertex::new([-size, size, 0.0], color),
        ],
        indices: vec![0, 1, 1, 2, 2, 3, 3, 0],
    }
}

/// Per-instance transform, uploaded as four `vec4` columns.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub transform: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            transform: m.to_cols_array_2d(),
        }
    }

    pub fn mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform)
    }
}

/// Per-draw push-constant block.
///
/// Matches `struct DrawParams { model: mat4x4<f32>, anim: f32 }`, padded to
/// the struct's 16-byte alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawParams {
    pub model: [[f32; 4]; 4],
    pub anim: f32,
    pub _padding: [f32; 3],
}

impl DrawParams {
    pub fn new(model: Mat4, anim: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            anim,
            _padding: [0.0; 3],
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

/// Rotation taking local +Y onto `dir`.
///
/// `x = normalize(dir × Y)`, `z = x × y`. A zero direction yields the
/// identity; a vertical one uses world X as the side axis.
pub fn point_towards(dir: Vec3) -> Mat4 {
    let y = dir.normalize_or_zero();
    if y == Vec3::ZERO {
        return Mat4::IDENTITY;
    }
    let side = y.cross(Vec3::Y);
    let x = if side.length_squared() < 1e-12 {
        Vec3::X
    } else {
        side.normalize()
    };
    let z = x.cross(y).normalize();
    Mat4::from_mat3(Mat3::from_cols(x, y, z))
}

/// Translation to the agent's position, oriented along its heading.
pub fn agent_transform(boid: &Boid) -> Mat4 {
    Mat4::from_translation(boid.position()) * point_towards(boid.heading())
}

/// Plane through a group's center, facing along its mean heading.
pub fn group_transform(group: &Group) -> Mat4 {
    Mat4::from_translation(group.center()) * point_towards(group.heading())
}

/// One instance per live agent, in store order.
pub fn build_instances(boids: &[Boid]) -> Vec<InstanceRaw> {
    boids
        .par_iter()
        .filter(|b| b.is_live())
        .map(|b| InstanceRaw::from_mat4(agent_transform(b)))
        .collect()
}

/// One instance per partition group.
pub fn group_instances<'a>(groups: impl IntoIterator<Item = &'a Group>) -> Vec<InstanceRaw> {
    groups
        .into_iter()
        .map(|g| InstanceRaw::from_mat4(group_transform(g)))
        .collect()
}

/// Fold an orientation axis into a flat color.
///
/// Green and blue swap when the axis points into negative Z, then every
/// channel takes its absolute value.
#[inline]
pub fn fold_color(axis: Vec3) -> Vec3 {
    let folded = if axis.z < 0.0 {
        Vec3::new(axis.x, axis.z, axis.y)
    } else {
        axis
    };
    folded.abs()
}

/// Color the shader assigns to an instance: [`fold_color`] of the local X axis
/// of `model * instance`.
pub fn instance_color(model: Mat4, instance: Mat4) -> Vec3 {
    fold_color((model * instance).x_axis.truncate())
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    pub agents: Vec<InstanceRaw>,
    pub planes: Vec<InstanceRaw>,
    pub params: DrawParams,
}

impl RenderFrame {
    pub fn new(boids: &[Boid], groups: &[Group], model: Mat4, anim: f32) -> Self {
        Self {
            agents: build_instances(boids),
            planes: group_instances(groups),
            params: DrawParams::new(model, anim),
        }
    }
}
