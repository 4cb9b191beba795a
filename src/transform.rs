//! Projection, view, and model matrix computation.
//!
//! The camera is deliberately fixed: a 45 degree perspective projection
//! looking from `(3, 3, 3)` at the origin with `+Y` up. Only two things
//! ever change at runtime — the projection's aspect ratio when the surface
//! is resized, and the model matrix, recomputed every frame from the
//! accumulated rotation angle and the per-axis speed factors.
//!
//! Matrices leave this module for the GPU only through
//! [`to_column_major`], keeping the upload format independent of
//! [`glam`]'s in-memory layout.

use glam::{Mat4, Vec3};

/// Vertical field of view of the fixed camera, in radians.
pub const FIELD_OF_VIEW: f32 = 45.0 * (std::f32::consts::PI / 180.0);
/// Near clip plane distance.
pub const NEAR_PLANE: f32 = 1.0;
/// Far clip plane distance.
pub const FAR_PLANE: f32 = 100.0;

const EYE: Vec3 = Vec3::new(3.0, 3.0, 3.0);

/// Axes a rotation speed can be set on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Per-axis rotation speed factors.
///
/// Each factor multiplies the shared rotation angle from the frame clock,
/// so the axes spin at independent rates. Any sign and magnitude is
/// allowed; a negative factor reverses direction, zero pins the axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationSpeed {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationSpeed {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Replace the factor for one axis.
    pub fn set(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }
}

/// Serialize a matrix to the 16-float column-major layout uniform uploads
/// expect.
pub fn to_column_major(matrix: &Mat4) -> [f32; 16] {
    matrix.to_cols_array()
}

/// The three matrices of the fixed-camera pipeline.
///
/// Owned by the renderer and advanced once per frame; see the module docs
/// for what varies and what is constant.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPipeline {
    projection: Mat4,
    view: Mat4,
    model: Mat4,
}

impl TransformPipeline {
    /// Build the pipeline for a surface of the given pixel size.
    ///
    /// The projection is derived from the aspect ratio, the view is the
    /// fixed look-at, and the model starts as the identity (zero rotation).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            projection: Self::projection_for(width, height),
            view: Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Y),
            model: Mat4::IDENTITY,
        }
    }

    fn projection_for(width: u32, height: u32) -> Mat4 {
        let aspect = width as f32 / height as f32;
        Mat4::perspective_rh_gl(FIELD_OF_VIEW, aspect, NEAR_PLANE, FAR_PLANE)
    }

    /// Recompute the projection for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection = Self::projection_for(width, height);
    }

    /// Recompute the model matrix for the given speeds and rotation angle.
    ///
    /// The composition order is a fixed commitment:
    /// `RotateX(sx·θ) · RotateY(sy·θ) · RotateZ(sz·θ)`. Rotation is
    /// non-commutative, so reordering would change the visual trajectory.
    pub fn update_model(&mut self, speed: RotationSpeed, angle: f32) -> &Mat4 {
        self.model = Mat4::from_rotation_x(speed.x * angle)
            * Mat4::from_rotation_y(speed.y * angle)
            * Mat4::from_rotation_z(speed.z * angle);
        &self.model
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn model(&self) -> &Mat4 {
        &self.model
    }
}
