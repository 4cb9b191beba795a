//! The backend capability interface the renderer draws through.
//!
//! The core never talks to a graphics API directly. Everything it needs —
//! shader compilation and linkage, buffer upload, uniform writes, the draw
//! call itself — goes through [`RenderBackend`], a small trait whose
//! associated types are opaque handles minted by the backend. The production
//! implementation is [`GlowBackend`](crate::GlowBackend); tests substitute
//! a recording fake to exercise the full renderer protocol without a GPU.
//!
//! Handles are deliberately opaque: the core stores and returns them but
//! never inspects their representation, so a backend is free to hand out
//! GL object names, table indices, or anything else.
//!
//! # Error checkpoints
//!
//! Compilation, linkage, name lookup, and buffer allocation are the points
//! where a well-behaved driver reports failure synchronously, so those
//! return `Result`. The remaining calls (uploads, uniform writes, clears,
//! draws) are fire-and-forget: once a valid handle exists the backend
//! contract guarantees they succeed.

use std::fmt;

/// The two programmable pipeline stages the core compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Errors surfaced by the rendering core and its backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A shader stage was rejected by the backend compiler. `log` carries
    /// the driver's diagnostic text verbatim.
    Compile { stage: ShaderStage, log: String },
    /// Program linkage was rejected. `log` carries the driver's diagnostic
    /// text verbatim.
    Link { log: String },
    /// An attribute or uniform name was absent from a successfully linked
    /// program. A shader/geometry mismatch is a programming error, so this
    /// is fatal at setup time and never retried.
    MissingBinding(String),
    /// The backend could not allocate a GPU object.
    ResourceExhausted(String),
    /// An operation was invoked outside its valid lifecycle state, e.g.
    /// rendering after release or before the program linked.
    InvalidState(&'static str),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Compile { stage, log } => {
                write!(f, "{} shader failed to compile: {}", stage, log)
            }
            RenderError::Link { log } => write!(f, "shader program failed to link: {}", log),
            RenderError::MissingBinding(name) => {
                write!(f, "shader program has no binding named '{}'", name)
            }
            RenderError::ResourceExhausted(what) => {
                write!(f, "GPU resource allocation failed: {}", what)
            }
            RenderError::InvalidState(op) => write!(f, "invalid state: {}", op),
        }
    }
}

impl std::error::Error for RenderError {}

/// Capabilities the renderer requires from a graphics backend.
///
/// The trait is shaped after the classic GL object model: shaders compile
/// individually, link into a program, and expose attributes and uniforms
/// by name; buffers are allocated empty and filled with static draw data.
/// Methods take `&mut self` because backends are single-threaded stateful
/// contexts, matching the renderer's own threading contract.
pub trait RenderBackend {
    /// Opaque handle to a GPU data buffer.
    type Buffer: Clone;
    /// Opaque handle to a compiled shader stage.
    type Shader: Clone;
    /// Opaque handle to a linked shader program.
    type Program: Clone;
    /// Opaque location of a per-vertex attribute.
    type Attribute: Clone;
    /// Opaque location of a program uniform.
    type Uniform: Clone;

    /// Compile one shader stage from source.
    ///
    /// On rejection the returned [`RenderError::Compile`] carries the
    /// backend's diagnostic log verbatim.
    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Shader, RenderError>;

    /// Release a compiled shader stage.
    fn delete_shader(&mut self, shader: Self::Shader);

    /// Link a vertex/fragment pair into an executable program.
    fn link_program(
        &mut self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, RenderError>;

    /// Release a linked program.
    fn delete_program(&mut self, program: Self::Program);

    /// Make `program` the active program for subsequent draws.
    fn use_program(&mut self, program: Self::Program);

    /// Look up a per-vertex attribute by name in a linked program.
    fn attribute_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Result<Self::Attribute, RenderError>;

    /// Look up a uniform by name in a linked program.
    fn uniform_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Result<Self::Uniform, RenderError>;

    /// Allocate a new, empty GPU buffer.
    fn create_buffer(&mut self) -> Result<Self::Buffer, RenderError>;

    /// Release a GPU buffer.
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    /// Fill `buffer` with float data as a static draw array buffer.
    fn upload_array_buffer(&mut self, buffer: Self::Buffer, data: &[f32]);

    /// Fill `buffer` with `u16` indices as a static draw element buffer.
    fn upload_index_buffer(&mut self, buffer: Self::Buffer, data: &[u16]);

    /// Point `attribute` at `buffer` (tightly packed floats, `components`
    /// per vertex, no normalization) and enable it for drawing.
    fn bind_attribute(&mut self, buffer: Self::Buffer, attribute: Self::Attribute, components: i32);

    /// Make `buffer` the active element buffer for indexed draws.
    fn bind_index_buffer(&mut self, buffer: Self::Buffer);

    /// Write a 4x4 matrix, given as 16 column-major floats, to a uniform.
    fn set_uniform_matrix4(&mut self, uniform: &Self::Uniform, values: &[f32; 16]);

    /// Set the fixed clear color and clear depth used by [`clear_frame`].
    ///
    /// [`clear_frame`]: RenderBackend::clear_frame
    fn set_clear_state(&mut self, color: [f32; 4], depth: f32);

    /// Set the drawable viewport to `width` x `height` pixels.
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear the color and depth targets with the configured clear state,
    /// leaving depth testing enabled.
    fn clear_frame(&mut self);

    /// Draw `index_count` indices from the active element buffer as a
    /// triangle list.
    fn draw_indexed_triangles(&mut self, index_count: i32);
}
