//! # Spinmesh
//!
//! **A small rendering core that spins one triangle mesh in front of a
//! fixed camera.**
//!
//! Spinmesh owns the GPU side of a minimal model viewer: buffer and shader
//! lifecycle, the projection/view/model matrix pipeline, and a frame-clock
//! that turns timestamps into rotation. Everything around it — loading an
//! STL file into flat vertex arrays, creating the GL context, pumping
//! frame callbacks — belongs to the embedding application.
//!
//! ## Quick Start
//!
//! ```ignore
//! use spinmesh::{GlowBackend, MeshData, Renderer, RendererConfig, RotationSpeed, ShaderSource};
//!
//! // The embedder creates the GL context (winit + glutin, a canvas, ...).
//! let backend = GlowBackend::new(gl);
//!
//! let mut renderer = Renderer::new(backend, RendererConfig {
//!     width: 800,
//!     height: 600,
//!     speed: RotationSpeed::new(0.5, 0.3, 0.2),
//!     mesh: MeshData::new(positions, colors, indices)?,
//!     shaders: ShaderSource::new(vertex_glsl, fragment_glsl),
//! })?;
//!
//! // Drive it with one timestamp per frame:
//! renderer.render_frame(timestamp);
//! ```
//!
//! ## Design
//!
//! - **One mesh, one program, one camera** — the camera looks at the
//!   origin from `(3, 3, 3)`; per-axis speed factors control the spin.
//! - **Backend behind a trait** — the core draws through
//!   [`RenderBackend`]; [`GlowBackend`] implements it for any
//!   [`glow`] context, and tests substitute a recording fake.
//! - **Deterministic resources** — every handle is owned by the
//!   [`Renderer`], swapped allocate-then-free, and released explicitly.
//! - **Hot-swap friendly** — geometry buffers and shader stages can be
//!   replaced between frames without reconstructing the renderer.

mod backend;
mod clock;
mod glow_backend;
mod mesh;
mod renderer;
mod transform;

pub use backend::{RenderBackend, RenderError, ShaderStage};
pub use clock::{FrameClock, ROTATION_RATE_DIVISOR};
pub use glow_backend::GlowBackend;
pub use mesh::{MeshData, MeshError, ShaderSource};
pub use renderer::{Renderer, RendererConfig};
pub use transform::{
    Axis, FAR_PLANE, FIELD_OF_VIEW, NEAR_PLANE, RotationSpeed, TransformPipeline, to_column_major,
};
