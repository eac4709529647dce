//! cubeform core: transform state and per-frame logic for one interactive cube.
//!
//! A frame reads a snapshot of held keys, turns it into at most one
//! [`DeltaOp`] through a fixed rule table, folds that into the persistent
//! scale, rotation and translation state, composes `T * R * S` and hands the
//! transformed vertices to a [`RenderTarget`]. Windowing, input polling and
//! rasterization belong to the front end.

pub mod compose;
pub mod geometry;
pub mod input;
pub mod render;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use compose::{compose, transform_point, transform_vertices};
pub use geometry::{triangle_normal, Geometry, GeometryError};
pub use input::{DeltaOp, InputMapper, KeySet, Rates};
pub use render::{dispatch, PolygonOffset, RenderTarget};
pub use scene::{FrameInput, Scene};
pub use transform::{Axis, TransformError, TransformState};
