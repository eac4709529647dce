//! Static cube geometry: vertex positions, wireframe edges and face triangles.
use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// An edge as an unordered pair of vertex indices
pub type Edge = (usize, usize);

/// A triangle as three vertex indices, wound counter-clockwise seen from outside
pub type Face = [usize; 3];

/// Errors raised while validating geometry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("edge {edge} references vertex {index}, but only {count} vertices exist")]
    EdgeOutOfBounds { edge: usize, index: usize, count: usize },

    #[error("face {face} references vertex {index}, but only {count} vertices exist")]
    FaceOutOfBounds { face: usize, index: usize, count: usize },

    #[error("edge {0} connects a vertex to itself")]
    DegenerateEdge(usize),

    #[error("face {0} repeats a vertex index")]
    DegenerateFace(usize),
}

const CUBE_VERTICES: [[f32; 3]; 8] = [
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, -1.0, -1.0],
];

const CUBE_EDGES: [Edge; 12] = [
    (0, 1),
    (0, 2),
    (0, 4),
    (1, 3),
    (1, 5),
    (2, 3),
    (2, 6),
    (3, 7),
    (4, 5),
    (4, 6),
    (5, 7),
    (6, 7),
];

// Two triangles per quad, split along one diagonal each.
const CUBE_FACES: [Face; 12] = [
    // +Y
    [0, 1, 5],
    [0, 5, 4],
    // -Y
    [2, 7, 3],
    [2, 6, 7],
    // -X
    [4, 5, 7],
    [4, 7, 6],
    // +X
    [0, 3, 1],
    [0, 2, 3],
    // +Z
    [0, 6, 2],
    [0, 4, 6],
    // -Z
    [1, 3, 7],
    [1, 7, 5],
];

/// Immutable indexed geometry, validated on construction
#[derive(Debug, Clone)]
pub struct Geometry {
    vertices: Vec<Point3<f32>>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
}

impl Geometry {
    /// Build geometry, rejecting any index that does not name a vertex
    pub fn new(
        vertices: Vec<Point3<f32>>,
        edges: Vec<Edge>,
        faces: Vec<Face>,
    ) -> Result<Self, GeometryError> {
        validate(vertices.len(), &edges, &faces)?;

        Ok(Self {
            vertices,
            edges,
            faces,
        })
    }

    /// The cube spanning [-1, 1] on every axis.
    ///
    /// The tables go through the same [`validate`] as [`Geometry::new`], at
    /// compile time, so this cannot fail.
    pub fn cube() -> Self {
        let vertices = CUBE_VERTICES
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect();

        Self {
            vertices,
            edges: CUBE_EDGES.to_vec(),
            faces: CUBE_FACES.to_vec(),
        }
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Unit normal of face `face` when its vertices sit at `positions`.
    ///
    /// `positions` is indexed like [`Geometry::vertices`], so transformed
    /// positions can be passed to shade the object as it currently appears.
    /// Returns `None` for an unknown face, a short `positions` slice or a
    /// face collapsed to zero area.
    pub fn face_normal(&self, face: usize, positions: &[Point3<f32>]) -> Option<Vector3<f32>> {
        let [a, b, c] = *self.faces.get(face)?;
        triangle_normal(&[*positions.get(a)?, *positions.get(b)?, *positions.get(c)?])
    }
}

/// Unit normal of a counter-clockwise triangle, `None` when it has no area
pub fn triangle_normal(triangle: &[Point3<f32>; 3]) -> Option<Vector3<f32>> {
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    edge1.cross(&edge2).try_normalize(1e-12)
}

/// Check every edge and face index against `count` vertices
pub const fn validate(count: usize, edges: &[Edge], faces: &[Face]) -> Result<(), GeometryError> {
    let mut i = 0;
    while i < edges.len() {
        let (a, b) = edges[i];
        if a >= count {
            return Err(GeometryError::EdgeOutOfBounds { edge: i, index: a, count });
        }
        if b >= count {
            return Err(GeometryError::EdgeOutOfBounds { edge: i, index: b, count });
        }
        if a == b {
            return Err(GeometryError::DegenerateEdge(i));
        }
        i += 1;
    }

    let mut i = 0;
    while i < faces.len() {
        let face = faces[i];
        let mut corner = 0;
        while corner < 3 {
            if face[corner] >= count {
                return Err(GeometryError::FaceOutOfBounds {
                    face: i,
                    index: face[corner],
                    count,
                });
            }
            corner += 1;
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(GeometryError::DegenerateFace(i));
        }
        i += 1;
    }

    Ok(())
}

const _: () = assert!(validate(CUBE_VERTICES.len(), &CUBE_EDGES, &CUBE_FACES).is_ok());

impl Default for Geometry {
    fn default() -> Self {
        Self::cube()
    }
}
