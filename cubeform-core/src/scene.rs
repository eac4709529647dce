//! One frame of the cube loop: input in, transform updated, draw calls out.
use log::{debug, info};
use nalgebra::{Matrix4, Point3};

use crate::compose::{compose, transform_vertices};
use crate::geometry::Geometry;
use crate::input::{InputMapper, KeySet};
use crate::render::{dispatch, RenderTarget};
use crate::transform::TransformState;

/// Longest frame time fed to the mapper, in seconds
pub const DEFAULT_MAX_FRAME_TIME: f32 = 0.25;

/// Everything the loop gathered from the outside world for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Keys currently held
    pub held: KeySet,
    /// Keys that went down since the previous frame
    pub pressed: KeySet,
    /// Window close or equivalent
    pub quit_requested: bool,
    /// Seconds since the previous frame
    pub elapsed: f32,
}

/// The single object, its transform and the view flags
#[derive(Debug, Clone)]
pub struct Scene {
    geometry: Geometry,
    transform: TransformState,
    mapper: InputMapper,
    max_frame_time: f32,
    solid: bool,
    running: bool,
}

impl Scene {
    pub fn new(geometry: Geometry, mapper: InputMapper) -> Self {
        Self {
            geometry,
            transform: TransformState::new(),
            mapper,
            max_frame_time: DEFAULT_MAX_FRAME_TIME,
            solid: false,
            running: true,
        }
    }

    pub fn with_max_frame_time(mut self, seconds: f32) -> Self {
        self.max_frame_time = seconds;
        self
    }

    pub fn with_solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    /// Advance one frame
    pub fn step(&mut self, input: &FrameInput) {
        if input.quit_requested || input.held.contains(KeySet::QUIT) {
            if self.running {
                info!("quit requested");
            }
            self.running = false;
        }

        if input.pressed.contains(KeySet::TOGGLE_SOLID) {
            self.solid = !self.solid;
            debug!("solid mode {}", if self.solid { "on" } else { "off" });
        }

        let elapsed = if input.elapsed.is_finite() {
            input.elapsed.clamp(0.0, self.max_frame_time)
        } else {
            0.0
        };

        if let Some(delta) = self.mapper.map(input.held, elapsed) {
            self.transform.apply(&delta);
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        compose(&self.transform)
    }

    /// The geometry's vertices under the current model matrix
    pub fn transformed_vertices(&self) -> Vec<Point3<f32>> {
        transform_vertices(&self.model_matrix(), self.geometry.vertices())
    }

    /// Draw the current frame into `target`
    pub fn render(&self, target: &mut dyn RenderTarget) {
        let positions = self.transformed_vertices();
        dispatch(&self.geometry, &positions, self.solid, target);
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut TransformState {
        &mut self.transform
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Geometry::cube(), InputMapper::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{Call, RecordingTarget};
    use approx::assert_abs_diff_eq;

    fn held(keys: KeySet, elapsed: f32) -> FrameInput {
        FrameInput {
            held: keys,
            elapsed,
            ..FrameInput::default()
        }
    }

    #[test]
    fn test_idle_frames_stay_identity() {
        let mut scene = Scene::default();
        for _ in 0..120 {
            scene.step(&held(KeySet::empty(), 1.0 / 60.0));
            assert_eq!(scene.model_matrix(), Matrix4::identity());
        }
        assert!(scene.is_running());
    }

    #[test]
    fn test_toggle_solid_is_edge_triggered() {
        let mut scene = Scene::default();
        let press = FrameInput {
            held: KeySet::TOGGLE_SOLID,
            pressed: KeySet::TOGGLE_SOLID,
            ..FrameInput::default()
        };

        scene.step(&press);
        assert!(scene.is_solid());

        // Holding the key does not flip it again
        for _ in 0..10 {
            scene.step(&held(KeySet::TOGGLE_SOLID, 0.016));
        }
        assert!(scene.is_solid());

        scene.step(&press);
        assert!(!scene.is_solid());
    }

    #[test]
    fn test_quit_from_event_or_key() {
        let mut scene = Scene::default();
        scene.step(&FrameInput {
            quit_requested: true,
            ..FrameInput::default()
        });
        assert!(!scene.is_running());

        let mut scene = Scene::default();
        scene.step(&held(KeySet::QUIT, 0.016));
        assert!(!scene.is_running());
    }

    #[test]
    fn test_elapsed_time_is_clamped() {
        let mut scene = Scene::default().with_max_frame_time(0.1);
        scene.step(&held(KeySet::D, 5.0));
        assert_abs_diff_eq!(scene.model_matrix()[(0, 3)], 0.1, epsilon = 1e-6);

        scene.step(&held(KeySet::D, f32::NAN));
        scene.step(&held(KeySet::D, -3.0));
        assert_abs_diff_eq!(scene.model_matrix()[(0, 3)], 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_reset_key_restores_identity() {
        let mut scene = Scene::default();
        scene.step(&held(KeySet::LEFT, 0.2));
        scene.step(&held(KeySet::W, 0.2));
        scene.step(&held(KeySet::X | KeySet::DECREASE, 0.2));
        assert_ne!(scene.model_matrix(), Matrix4::identity());

        scene.step(&held(KeySet::RESET, 0.2));
        assert_eq!(scene.model_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_render_uses_solid_flag() {
        let mut scene = Scene::default().with_solid(true);
        scene.step(&held(KeySet::D, 0.25));

        let mut target = RecordingTarget::default();
        scene.render(&mut target);
        assert_eq!(target.calls[2], Call::Triangles(12));

        // Every drawn endpoint has been moved along +X
        for [a, _] in &target.lines {
            assert!(a.x == 1.25 || a.x == -0.75);
        }
    }
}
