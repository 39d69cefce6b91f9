//! WGSL for the stereo line renderer.

/// Multiview vertex shader and flat-color fragment shader.
///
/// Bindings:
/// - `@group(0) @binding(0)`: camera uniform, two view-projection matrices.
/// - push constants: [`DrawParams`](super::DrawParams), the per-draw model
///   matrix and animation parameter.
/// - vertex buffer 0 (per vertex): position at location 0, color attribute at
///   location 1 (declared but not used for shading).
/// - vertex buffer 1 (per instance): agent transform columns at locations 2-5.
pub const STEREO_WGSL: &str = r#"
struct Camera {
    views: array<mat4x4<f32>, 2>,
};

struct DrawParams {
    model: mat4x4<f32>,
    anim: f32,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

var<push_constant> draw: DrawParams;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(
    @builtin(view_index) view_index: i32,
    @location(0) position: vec3<f32>,
    @location(1) tint: vec3<f32>,
    @location(2) col0: vec4<f32>,
    @location(3) col1: vec4<f32>,
    @location(4) col2: vec4<f32>,
    @location(5) col3: vec4<f32>,
) -> VertexOutput {
    let placement = mat4x4<f32>(col0, col1, col2, col3);
    let world = draw.model * placement;

    var out: VertexOutput;
    out.clip_position = camera.views[view_index] * world * vec4<f32>(position, 1.0);

    // Color comes from the local X axis, folded into the positive octant.
    var axis = world[0].xyz;
    if axis.z < 0.0 {
        axis = vec3<f32>(axis.x, axis.z, axis.y);
    }
    out.color = abs(axis);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;
