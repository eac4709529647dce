//! Persistent scale, rotation and translation state for a single rigid body.
use std::fmt;
use std::str::FromStr;

use log::debug;
use nalgebra::{Matrix3, Matrix4, Vector3};
use thiserror::Error;

use crate::input::DeltaOp;

/// Smallest scale factor any axis may shrink to
pub const MIN_SCALE: f32 = 1e-3;

/// Largest scale factor any axis may grow to
pub const MAX_SCALE: f32 = 1e3;

/// Number of rotation accumulations between re-orthonormalizations of R
pub const RENORMALIZE_INTERVAL: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("invalid rotation axis {0:?}, expected one of x, y, z")]
    InvalidAxis(String),
}

/// A world coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

impl FromStr for Axis {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(TransformError::InvalidAxis(s.to_string())),
        }
    }
}

/// Rotation about a world axis, angle in degrees
pub fn rotation_matrix(axis: Axis, degrees: f32) -> Matrix4<f32> {
    Matrix4::new_rotation(axis.unit() * degrees.to_radians())
}

/// Rotation about an axis given by name.
///
/// Unknown names produce the identity, so a bad axis leaves the object
/// untouched instead of failing. Use [`Axis::from_str`] to detect them.
pub fn rotation_matrix_named(axis: &str, degrees: f32) -> Matrix4<f32> {
    match axis.parse::<Axis>() {
        Ok(axis) => rotation_matrix(axis, degrees),
        Err(_) => Matrix4::identity(),
    }
}

/// Create a translation matrix
pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// Create a scale matrix
pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
    Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
}

/// The three accumulated transforms of the object.
///
/// Scale is kept as three per-axis factors rather than a matrix. Every scale
/// delta is diagonal, so the product stays diagonal and no shear can appear;
/// storing the factors also lets each one be floored at [`MIN_SCALE`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    scale: Vector3<f32>,
    rotation: Matrix4<f32>,
    translation: Matrix4<f32>,
    rotations_since_renormalize: u32,
}

impl TransformState {
    pub fn new() -> Self {
        Self {
            scale: Vector3::repeat(1.0),
            rotation: Matrix4::identity(),
            translation: Matrix4::identity(),
            rotations_since_renormalize: 0,
        }
    }

    /// Return S, R and T to the identity
    pub fn reset(&mut self) {
        *self = Self::new();
        debug!("transform state reset");
    }

    /// R <- Rot(axis, degrees) * R, so rotations compose in world space
    pub fn accumulate_rotation(&mut self, axis: Axis, degrees: f32) {
        self.rotation = rotation_matrix(axis, degrees) * self.rotation;

        self.rotations_since_renormalize += 1;
        if self.rotations_since_renormalize >= RENORMALIZE_INTERVAL {
            self.renormalize();
        }
    }

    /// T <- T * Trans(dx, dy, dz), so the offset is taken in T's own frame
    pub fn accumulate_translation(&mut self, dx: f32, dy: f32, dz: f32) {
        self.translation *= translation_matrix(dx, dy, dz);
    }

    /// S <- S * Scale(sx, sy, sz), each factor kept within
    /// [`MIN_SCALE`]..=[`MAX_SCALE`] so S never becomes singular
    pub fn accumulate_scale(&mut self, sx: f32, sy: f32, sz: f32) {
        let scaled = self.scale.component_mul(&Vector3::new(sx, sy, sz));
        self.scale = scaled.map(|factor| {
            if factor.is_nan() {
                MIN_SCALE
            } else {
                factor.clamp(MIN_SCALE, MAX_SCALE)
            }
        });

        if self.scale != scaled {
            debug!("scale {:?} clamped to {:?}", scaled.as_slice(), self.scale.as_slice());
        }
    }

    /// Apply a single delta operation
    pub fn apply(&mut self, delta: &DeltaOp) {
        match *delta {
            DeltaOp::Rotate { axis, degrees } => self.accumulate_rotation(axis, degrees),
            DeltaOp::Translate(d) => self.accumulate_translation(d.x, d.y, d.z),
            DeltaOp::Scale(s) => self.accumulate_scale(s.x, s.y, s.z),
            DeltaOp::Reset => self.reset(),
        }
    }

    /// Snap R back onto the nearest proper rotation.
    ///
    /// Gram-Schmidt over the columns of the 3x3 block; the third column is
    /// rebuilt from a cross product so the determinant is +1.
    pub fn renormalize(&mut self) {
        let block: Matrix3<f32> = self.rotation.fixed_view::<3, 3>(0, 0).into_owned();

        let x = block.column(0).normalize();
        let y = (block.column(1) - x * x.dot(&block.column(1))).normalize();
        let z = x.cross(&y);

        let mut rotation = Matrix4::identity();
        rotation.fixed_view_mut::<3, 1>(0, 0).copy_from(&x);
        rotation.fixed_view_mut::<3, 1>(0, 1).copy_from(&y);
        rotation.fixed_view_mut::<3, 1>(0, 2).copy_from(&z);

        self.rotation = rotation;
        self.rotations_since_renormalize = 0;
        debug!("rotation re-orthonormalized");
    }

    pub fn scale_factors(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn scale_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&self.scale)
    }

    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        self.rotation
    }

    pub fn translation_matrix(&self) -> Matrix4<f32> {
        self.translation
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new()
    }
}
