//! Draw-call dispatch for wireframe and solid modes.
//!
//! Rasterization lives behind [`RenderTarget`]; this module only decides
//! which primitives are emitted and which depth state they are drawn with.
use nalgebra::Point3;

use crate::geometry::Geometry;

/// Depth bias applied to filled triangles, in the usual factor/units form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

/// Offset pushing solid faces slightly behind their edge overlay
pub const SOLID_POLYGON_OFFSET: PolygonOffset = PolygonOffset {
    factor: 1.0,
    units: 1.0,
};

pub trait RenderTarget {
    fn set_depth_test(&mut self, enabled: bool);

    /// `None` disables the offset
    fn set_polygon_offset(&mut self, offset: Option<PolygonOffset>);

    fn draw_lines(&mut self, lines: &[[Point3<f32>; 2]]);

    fn draw_triangles(&mut self, triangles: &[[Point3<f32>; 3]]);
}

pub fn edge_lines(geometry: &Geometry, positions: &[Point3<f32>]) -> Vec<[Point3<f32>; 2]> {
    geometry
        .edges()
        .iter()
        .map(|&(a, b)| [positions[a], positions[b]])
        .collect()
}

pub fn face_triangles(geometry: &Geometry, positions: &[Point3<f32>]) -> Vec<[Point3<f32>; 3]> {
    geometry
        .faces()
        .iter()
        .map(|&[a, b, c]| [positions[a], positions[b], positions[c]])
        .collect()
}

/// Emit draw calls for `positions`, the geometry's transformed vertices.
///
/// Wireframe draws one line per edge with depth testing off. Solid draws
/// every face with depth testing and [`SOLID_POLYGON_OFFSET`], then the
/// edges on top.
pub fn dispatch(
    geometry: &Geometry,
    positions: &[Point3<f32>],
    solid: bool,
    target: &mut dyn RenderTarget,
) {
    debug_assert_eq!(positions.len(), geometry.vertices().len());

    if solid {
        target.set_depth_test(true);
        target.set_polygon_offset(Some(SOLID_POLYGON_OFFSET));
        target.draw_triangles(&face_triangles(geometry, positions));
    } else {
        target.set_depth_test(false);
        target.set_polygon_offset(None);
    }

    target.draw_lines(&edge_lines(geometry, positions));
}
