//! Mesh and shader source data as supplied by the embedding application.
//!
//! The rendering core does not parse model files. Whatever loads the mesh
//! (an STL reader, a procedural generator, hardcoded arrays) hands the core
//! flat float data through [`MeshData`], which validates the structural
//! invariants once so the renderer can trust them afterwards:
//!
//! - one color triple per vertex position triple,
//! - every triangle index refers to an existing vertex,
//! - the index list describes whole triangles.
//!
//! # Example
//!
//! ```
//! use spinmesh::MeshData;
//!
//! // A single triangle, uniformly red.
//! let mesh = MeshData::new(
//!     vec![0.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0],
//!     vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
//!     vec![0, 1, 2],
//! )
//! .unwrap();
//!
//! assert_eq!(mesh.vertex_count(), 3);
//! assert_eq!(mesh.triangle_count(), 1);
//! ```

/// Errors produced when mesh data violates its structural invariants.
#[derive(Debug, PartialEq, Eq)]
pub enum MeshError {
    /// `positions.len()` is not a multiple of 3.
    IncompleteVertex(usize),
    /// The color list is not the same length as the position list.
    ColorCountMismatch { positions: usize, colors: usize },
    /// An index refers past the last vertex.
    IndexOutOfRange { index: u16, vertex_count: usize },
    /// `indices.len()` is not a multiple of 3.
    IncompleteTriangle(usize),
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::IncompleteVertex(len) => {
                write!(f, "position list length {} is not a multiple of 3", len)
            }
            MeshError::ColorCountMismatch { positions, colors } => {
                write!(
                    f,
                    "color list length {} does not match position list length {}",
                    colors, positions
                )
            }
            MeshError::IndexOutOfRange {
                index,
                vertex_count,
            } => {
                write!(
                    f,
                    "index {} out of range for {} vertices",
                    index, vertex_count
                )
            }
            MeshError::IncompleteTriangle(len) => {
                write!(f, "index list length {} is not a multiple of 3", len)
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// A validated triangle mesh: vertex positions, per-vertex colors, and a
/// triangle index list.
///
/// Positions and colors are tightly packed `[x, y, z]` / `[r, g, b]`
/// triples; indices are a `u16` triangle list. Construction via
/// [`MeshData::new`] enforces the invariants documented on [`MeshError`],
/// after which the data is immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    positions: Vec<f32>,
    colors: Vec<f32>,
    indices: Vec<u16>,
}

impl MeshData {
    /// Validate and wrap raw mesh data.
    pub fn new(
        positions: Vec<f32>,
        colors: Vec<f32>,
        indices: Vec<u16>,
    ) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::IncompleteVertex(positions.len()));
        }
        if colors.len() != positions.len() {
            return Err(MeshError::ColorCountMismatch {
                positions: positions.len(),
                colors: colors.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle(indices.len()));
        }
        let vertex_count = positions.len() / 3;
        for &index in &indices {
            if usize::from(index) >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(Self {
            positions,
            colors,
            indices,
        })
    }

    /// Packed vertex positions, three floats per vertex.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Packed vertex colors, three floats per vertex.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Triangle list indices into the position/color arrays.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Number of vertices described by the position list.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles described by the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A vertex/fragment shader source pair.
///
/// The text is opaque to the core; it is handed to the backend compiler
/// unmodified, and any diagnostics come back verbatim through
/// [`RenderError::Compile`](crate::RenderError::Compile). The sources are
/// expected to expose `position` and `color` attributes and `Pmatrix`,
/// `Vmatrix`, and `Mmatrix` uniforms; a pair that does not will fail
/// renderer construction with a missing-binding error.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    /// Vertex stage source text.
    pub vertex: String,
    /// Fragment stage source text.
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}
