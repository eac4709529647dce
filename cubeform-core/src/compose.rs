//! Composes the transform state into one matrix and applies it to vertices.
use nalgebra::{Matrix4, Point3, Vector4};

use crate::transform::TransformState;

/// Final model matrix `T * R * S`.
///
/// Scale acts first and rotation second, both about the object's own origin;
/// translation then places the result in the world.
pub fn compose(state: &TransformState) -> Matrix4<f32> {
    state.translation_matrix() * state.rotation_matrix() * state.scale_matrix()
}

/// Transform a point as the column vector `(x, y, z, 1)`.
///
/// The matrices built here are affine, so w stays 1 and is never divided by.
pub fn transform_point(matrix: &Matrix4<f32>, point: &Point3<f32>) -> Point3<f32> {
    let homogeneous = matrix * Vector4::new(point.x, point.y, point.z, 1.0);
    debug_assert!(
        (homogeneous.w - 1.0).abs() < 1e-4,
        "affine transform produced w = {}",
        homogeneous.w
    );
    Point3::new(homogeneous.x, homogeneous.y, homogeneous.z)
}

pub fn transform_vertices(matrix: &Matrix4<f32>, vertices: &[Point3<f32>]) -> Vec<Point3<f32>> {
    vertices
        .iter()
        .map(|vertex| transform_point(matrix, vertex))
        .collect()
}
