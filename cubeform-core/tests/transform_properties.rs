//! End-to-end properties of the accumulate/compose pipeline.

use approx::assert_abs_diff_eq;
use cubeform_core::transform::{rotation_matrix, MAX_SCALE, MIN_SCALE};
use cubeform_core::{
    compose, transform_point, Axis, DeltaOp, FrameInput, InputMapper, KeySet, Scene,
    TransformState,
};
use nalgebra::{Matrix4, Point3};

#[test]
fn single_axis_rotations_sum_their_angles() {
    let angles = [3.5, -12.0, 47.25, 0.125, 90.0, -1.5, 33.0, 7.75];

    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let mut state = TransformState::new();
        for angle in angles {
            state.accumulate_rotation(axis, angle);
        }

        let total: f32 = angles.iter().sum();
        assert_abs_diff_eq!(
            state.rotation_matrix(),
            rotation_matrix(axis, total),
            epsilon = 1e-4
        );
    }
}

#[test]
fn many_small_rotations_sum_across_renormalization() {
    let mut state = TransformState::new();
    for _ in 0..600 {
        state.accumulate_rotation(Axis::Y, 0.5);
    }
    assert_abs_diff_eq!(
        state.rotation_matrix(),
        rotation_matrix(Axis::Y, 300.0),
        epsilon = 1e-4
    );
}

#[test]
fn rotation_then_inverse_is_identity() {
    let mut state = TransformState::new();
    state.accumulate_rotation(Axis::Z, 20.0);
    let before = state.rotation_matrix();

    state.accumulate_rotation(Axis::X, 71.0);
    state.accumulate_rotation(Axis::X, -71.0);
    assert_abs_diff_eq!(state.rotation_matrix(), before, epsilon = 1e-5);
}

#[test]
fn translation_then_negation_restores_exactly() {
    let mut state = TransformState::new();
    state.accumulate_translation(0.75, -2.0, 4.5);
    let before = state.translation_matrix();

    state.accumulate_translation(0.25, 1.5, -0.125);
    state.accumulate_translation(-0.25, -1.5, 0.125);
    assert_eq!(state.translation_matrix(), before);
}

#[test]
fn reset_after_near_singular_scale() {
    let mut state = TransformState::new();
    for _ in 0..2_000 {
        state.accumulate_scale(0.9, 1.0, 1.1);
    }
    state.accumulate_rotation(Axis::Y, 45.0);
    state.accumulate_translation(3.0, 3.0, 3.0);
    assert_eq!(state.scale_factors().x, MIN_SCALE);
    assert_eq!(state.scale_factors().z, MAX_SCALE);

    state.reset();
    assert_eq!(state.scale_matrix(), Matrix4::identity());
    assert_eq!(state.rotation_matrix(), Matrix4::identity());
    assert_eq!(state.translation_matrix(), Matrix4::identity());
    assert_eq!(compose(&state), Matrix4::identity());
}

#[test]
fn composition_order_is_translate_rotate_scale() {
    let mut state = TransformState::new();
    state.apply(&DeltaOp::Scale(nalgebra::Vector3::new(2.0, 1.0, 1.0)));
    state.apply(&DeltaOp::Rotate {
        axis: Axis::Z,
        degrees: 90.0,
    });
    state.apply(&DeltaOp::Translate(nalgebra::Vector3::new(1.0, 0.0, 0.0)));

    let p = transform_point(&compose(&state), &Point3::new(1.0, 0.0, 0.0));
    assert_abs_diff_eq!(p, Point3::new(1.0, 2.0, 0.0), epsilon = 1e-6);
}

#[test]
fn rotation_and_translation_keys_only_rotate() {
    let mapper = InputMapper::default();
    let keys = KeySet::RIGHT | KeySet::W | KeySet::D;

    assert_eq!(
        mapper.map(keys, 1.0),
        Some(DeltaOp::Rotate {
            axis: Axis::Y,
            degrees: 90.0
        })
    );

    // Allow a whole second in one frame
    let mut scene = Scene::default().with_max_frame_time(1.0);
    scene.step(&FrameInput {
        held: keys,
        elapsed: 1.0,
        ..FrameInput::default()
    });
    assert_eq!(scene.transform().translation_matrix(), Matrix4::identity());
    assert_abs_diff_eq!(
        scene.transform().rotation_matrix(),
        rotation_matrix(Axis::Y, 90.0),
        epsilon = 1e-6
    );
}

#[test]
fn frame_rate_independent_motion() {
    // One second of holding D moves one unit at 30 fps or at 120 fps
    for fps in [30u32, 120] {
        let mut scene = Scene::default();
        for _ in 0..fps {
            scene.step(&FrameInput {
                held: KeySet::D,
                elapsed: 1.0 / fps as f32,
                ..FrameInput::default()
            });
        }
        assert_abs_diff_eq!(scene.model_matrix()[(0, 3)], 1.0, epsilon = 1e-4);
    }
}
