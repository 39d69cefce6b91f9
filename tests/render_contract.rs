//! The render adapter's contract with the multiview shader.

use glam::{Mat4, Vec3};
use stereo_flock::render::{
    agent_transform, build_instances, fold_color, instance_color, CameraUniform, DrawParams,
    InstanceRaw, STEREO_WGSL,
};
use stereo_flock::{Boid, Eye, OrbitCamera, Simulation, StereoCamera};

#[test]
fn color_fold_matches_the_reference_cases() {
    let swapped = fold_color(Vec3::new(0.2, 0.5, -0.3));
    assert!((swapped - Vec3::new(0.2, 0.3, 0.5)).length() < 1e-6);

    let kept = fold_color(Vec3::new(0.2, 0.5, 0.3));
    assert!((kept - Vec3::new(0.2, 0.5, 0.3)).length() < 1e-6);

    // Zero Z is not negative.
    assert_eq!(fold_color(Vec3::new(-1.0, 0.0, 0.0)), Vec3::X);
}

#[test]
fn colors_are_always_non_negative() {
    let sim = Simulation::builder()
        .with_agent_count(64)
        .with_seed(23)
        .build()
        .unwrap();
    let model = Mat4::from_rotation_y(1.1) * Mat4::from_rotation_x(-0.4);
    let frame = sim.frame(model);
    for instance in &frame.agents {
        let color = instance_color(model, instance.mat4());
        assert!(color.min_element() >= 0.0);
        assert!(color.is_finite());
    }
}

#[test]
fn eyes_select_their_own_view() {
    let orbit = OrbitCamera::default();
    let stereo = StereoCamera::from_orbit(&orbit, 0.5, 16.0 / 9.0);
    let boid = Boid::new(Vec3::new(1.0, 2.0, -3.0), Vec3::new(0.0, 0.0, 1.0));
    let instance = agent_transform(&boid);
    let local = Vec3::new(0.0, 1.0, 0.0);

    let left = stereo.clip_position(Eye::Left, Mat4::IDENTITY, instance, local);
    let right = stereo.clip_position(Eye::Right, Mat4::IDENTITY, instance, local);
    assert!((left - right).length() > 1e-4);

    let expected = stereo.view(Eye::Right) * instance * local.extend(1.0);
    assert!((right - expected).length() < 1e-4);

    let mono = StereoCamera::mono(orbit.projection(1.0) * orbit.view_matrix());
    let a = mono.clip_position(Eye::Left, Mat4::IDENTITY, instance, local);
    let b = mono.clip_position(Eye::Right, Mat4::IDENTITY, instance, local);
    assert_eq!(a, b);
}

#[test]
fn uploaded_layouts_match_the_shader_structs() {
    assert_eq!(std::mem::size_of::<CameraUniform>(), 128);
    assert_eq!(std::mem::size_of::<DrawParams>(), 80);
    assert_eq!(std::mem::size_of::<InstanceRaw>(), 64);

    let params = DrawParams::new(Mat4::from_translation(Vec3::ONE), 2.5);
    let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&params));
    assert_eq!(&floats[12..16], &[1.0, 1.0, 1.0, 1.0]);
    assert_eq!(floats[16], 2.5);
}

#[test]
fn instances_carry_position_in_the_last_column() {
    let boids = vec![
        Boid::new(Vec3::new(3.0, 4.0, 5.0), Vec3::new(1.0, 1.0, 0.0)),
        Boid::new(Vec3::ZERO, Vec3::ZERO),
    ];
    let instances = build_instances(&boids);
    assert_eq!(instances[0].transform[3], [3.0, 4.0, 5.0, 1.0]);
    // A zero heading still yields a usable transform.
    assert_eq!(instances[1].mat4(), Mat4::IDENTITY);
}

#[test]
fn shader_declares_the_expected_interface() {
    let module = naga::front::wgsl::parse_str(STEREO_WGSL).unwrap();
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).unwrap();

    let vs = module
        .entry_points
        .iter()
        .find(|e| e.name == "vs_main")
        .unwrap();
    assert_eq!(vs.stage, naga::ShaderStage::Vertex);
    // view index plus six vertex and instance attributes
    assert_eq!(vs.function.arguments.len(), 7);
}
