//! The renderer: wires geometry, shaders, and transforms to a backend.
//!
//! A [`Renderer`] owns every GPU handle it creates — three geometry
//! buffers, two shader stages, one linked program — and drives them
//! through a fixed lifecycle:
//!
//! 1. **Construction** uploads the mesh, compiles and links the shaders,
//!    binds the `position`/`color` attributes, sets the fixed context
//!    state (clear color, depth comparison, viewport), and uploads the
//!    projection and view matrices. Any failure aborts construction;
//!    there is no partially initialized renderer.
//! 2. **Frames** arrive as timestamps from an external driver (a browser
//!    `requestAnimationFrame` loop, a native event loop). Each
//!    [`render_frame`](Renderer::render_frame) advances the clock,
//!    re-uploads the model matrix, clears, and draws.
//! 3. **Release** frees every handle; after that, rendering fails with
//!    [`RenderError::InvalidState`].
//!
//! Geometry and shader stages can be hot-swapped between frames. Buffer
//! swaps allocate the replacement before freeing the old buffer so a
//! bound buffer always exists, and swapping one shader stage does not
//! relink until both stages are present.
//!
//! The renderer is single-threaded by design: all calls must come from
//! the thread that owns the drawing surface, and nothing here locks.
//!
//! # Example
//!
//! ```ignore
//! use spinmesh::{GlowBackend, MeshData, Renderer, RendererConfig, RotationSpeed, ShaderSource};
//!
//! let backend = GlowBackend::new(gl); // glow context from your windowing setup
//! let mut renderer = Renderer::new(
//!     backend,
//!     RendererConfig {
//!         width: 800,
//!         height: 600,
//!         speed: RotationSpeed::new(0.5, 0.3, 0.2),
//!         mesh,
//!         shaders: ShaderSource::new(vertex_glsl, fragment_glsl),
//!     },
//! )?;
//!
//! // Per-frame callback:
//! renderer.render_frame(timestamp_ms)?;
//! ```

use log::{debug, error, info};

use crate::backend::{RenderBackend, RenderError, ShaderStage};
use crate::clock::FrameClock;
use crate::mesh::{MeshData, ShaderSource};
use crate::transform::{Axis, RotationSpeed, TransformPipeline, to_column_major};

/// Fixed clear color (a light gray, mostly opaque).
const CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 0.9];
/// Depth value the depth target is cleared to.
const CLEAR_DEPTH: f32 = 1.0;

/// Attribute and uniform names the shader pair must expose.
const POSITION_ATTRIBUTE: &str = "position";
const COLOR_ATTRIBUTE: &str = "color";
const PROJECTION_UNIFORM: &str = "Pmatrix";
const VIEW_UNIFORM: &str = "Vmatrix";
const MODEL_UNIFORM: &str = "Mmatrix";

/// Everything a [`Renderer`] needs at construction time.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Drawing surface width in pixels.
    pub width: u32,
    /// Drawing surface height in pixels.
    pub height: u32,
    /// Initial per-axis rotation speeds.
    pub speed: RotationSpeed,
    /// The mesh to render.
    pub mesh: MeshData,
    /// Vertex and fragment shader sources.
    pub shaders: ShaderSource,
}

/// A linked program together with the locations resolved from it.
struct ProgramBindings<B: RenderBackend> {
    program: B::Program,
    projection: B::Uniform,
    view: B::Uniform,
    model: B::Uniform,
    position: B::Attribute,
    color: B::Attribute,
}

/// Renders one rotating mesh through a [`RenderBackend`].
///
/// See the [module docs](self) for the lifecycle. All GPU handles are
/// owned exclusively by this struct and released deterministically by
/// [`release`](Renderer::release) or replaced through the
/// allocate-then-free swap protocol of the `update_*` methods.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    width: u32,
    height: u32,
    speed: RotationSpeed,
    clock: FrameClock,
    transforms: TransformPipeline,
    projection_dirty: bool,
    vertex_buffer: Option<B::Buffer>,
    color_buffer: Option<B::Buffer>,
    index_buffer: Option<B::Buffer>,
    index_count: i32,
    vertex_shader: Option<B::Shader>,
    fragment_shader: Option<B::Shader>,
    bindings: Option<ProgramBindings<B>>,
    released: bool,
}

impl<B: RenderBackend> std::fmt::Debug for Renderer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("speed", &self.speed)
            .field("index_count", &self.index_count)
            .field("linked", &self.bindings.is_some())
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl<B: RenderBackend> Renderer<B> {
    /// Build a ready-to-render renderer in one go.
    ///
    /// Runs the full construction sequence: geometry upload, shader
    /// compile and link, attribute binding, context flags, initial
    /// matrices. On any failure every handle created so far is released
    /// and the error is returned; the renderer never escapes half-built.
    pub fn new(backend: B, config: RendererConfig) -> Result<Self, RenderError> {
        let RendererConfig {
            width,
            height,
            speed,
            mesh,
            shaders,
        } = config;
        let mut renderer = Self::with_geometry(backend, width, height, speed, &mesh)?;
        if let Err(err) = renderer.attach_shaders(&shaders) {
            renderer.release();
            return Err(err);
        }
        Ok(renderer)
    }

    /// Build a renderer with geometry uploaded but no shader program yet.
    ///
    /// Useful when shader sources arrive separately from the mesh. The
    /// renderer stays in a not-linked state — [`render_frame`] fails with
    /// [`RenderError::InvalidState`] — until both
    /// [`update_vertex_shader`] and [`update_fragment_shader`] have
    /// succeeded.
    ///
    /// [`render_frame`]: Renderer::render_frame
    /// [`update_vertex_shader`]: Renderer::update_vertex_shader
    /// [`update_fragment_shader`]: Renderer::update_fragment_shader
    pub fn with_geometry(
        backend: B,
        width: u32,
        height: u32,
        speed: RotationSpeed,
        mesh: &MeshData,
    ) -> Result<Self, RenderError> {
        info!("initializing renderer for a {}x{} surface", width, height);
        let mut renderer = Self {
            backend,
            width,
            height,
            speed,
            clock: FrameClock::new(),
            transforms: TransformPipeline::new(width, height),
            projection_dirty: false,
            vertex_buffer: None,
            color_buffer: None,
            index_buffer: None,
            index_count: 0,
            vertex_shader: None,
            fragment_shader: None,
            bindings: None,
            released: false,
        };
        if let Err(err) = renderer.upload_geometry(mesh) {
            renderer.release();
            return Err(err);
        }
        renderer.backend.set_clear_state(CLEAR_COLOR, CLEAR_DEPTH);
        renderer.backend.set_viewport(width, height);
        Ok(renderer)
    }

    fn upload_geometry(&mut self, mesh: &MeshData) -> Result<(), RenderError> {
        self.update_colors(mesh.colors())?;
        self.update_vertices(mesh.positions())?;
        self.update_indices(mesh.indices())
    }

    fn attach_shaders(&mut self, shaders: &ShaderSource) -> Result<(), RenderError> {
        self.update_vertex_shader(&shaders.vertex)?;
        self.update_fragment_shader(&shaders.fragment)
    }

    /// Render one frame for the given timestamp.
    ///
    /// Advances the frame clock, recomputes and uploads the model matrix,
    /// applies any pending surface resize, clears the color and depth
    /// targets, and issues the indexed draw. Fails with
    /// [`RenderError::InvalidState`] if the renderer was released, the
    /// program has not linked, or geometry is missing — checked before
    /// the clock advances, so a rejected frame leaves no state behind.
    pub fn render_frame(&mut self, timestamp: f32) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::InvalidState("renderer has been released"));
        }
        let Some(bindings) = &self.bindings else {
            return Err(RenderError::InvalidState("shader program is not linked"));
        };
        if self.vertex_buffer.is_none() || self.color_buffer.is_none() {
            return Err(RenderError::InvalidState("geometry buffers are not uploaded"));
        }
        let Some(index_buffer) = self.index_buffer.clone() else {
            return Err(RenderError::InvalidState("geometry buffers are not uploaded"));
        };

        let angle = self.clock.tick(timestamp);

        if self.projection_dirty {
            self.backend.set_viewport(self.width, self.height);
            let projection = to_column_major(self.transforms.projection());
            self.backend
                .set_uniform_matrix4(&bindings.projection, &projection);
            self.projection_dirty = false;
        }

        let model = to_column_major(self.transforms.update_model(self.speed, angle));
        self.backend.set_uniform_matrix4(&bindings.model, &model);

        // Color and depth are cleared every frame, geometry change or not.
        self.backend.clear_frame();
        self.backend.bind_index_buffer(index_buffer);
        self.backend.draw_indexed_triangles(self.index_count);
        Ok(())
    }

    /// Replace the vertex position buffer.
    ///
    /// The replacement is allocated and filled before the old buffer is
    /// freed, so there is never a moment without a live vertex buffer. If
    /// a program is active, the `position` attribute is re-pointed at the
    /// new buffer.
    pub fn update_vertices(&mut self, positions: &[f32]) -> Result<(), RenderError> {
        self.ensure_live()?;
        debug!("uploading vertex buffer ({} floats)", positions.len());
        let buffer = self.backend.create_buffer()?;
        self.backend.upload_array_buffer(buffer.clone(), positions);
        if let Some(old) = self.vertex_buffer.replace(buffer.clone()) {
            debug!("releasing replaced vertex buffer");
            self.backend.delete_buffer(old);
        }
        if let Some(bindings) = &self.bindings {
            self.backend
                .bind_attribute(buffer, bindings.position.clone(), 3);
        }
        Ok(())
    }

    /// Replace the vertex color buffer. Same swap protocol as
    /// [`update_vertices`](Renderer::update_vertices).
    pub fn update_colors(&mut self, colors: &[f32]) -> Result<(), RenderError> {
        self.ensure_live()?;
        debug!("uploading color buffer ({} floats)", colors.len());
        let buffer = self.backend.create_buffer()?;
        self.backend.upload_array_buffer(buffer.clone(), colors);
        if let Some(old) = self.color_buffer.replace(buffer.clone()) {
            debug!("releasing replaced color buffer");
            self.backend.delete_buffer(old);
        }
        if let Some(bindings) = &self.bindings {
            self.backend
                .bind_attribute(buffer, bindings.color.clone(), 3);
        }
        Ok(())
    }

    /// Replace the triangle index buffer and the recorded index count.
    pub fn update_indices(&mut self, indices: &[u16]) -> Result<(), RenderError> {
        self.ensure_live()?;
        debug!("uploading index buffer ({} indices)", indices.len());
        let buffer = self.backend.create_buffer()?;
        self.backend.upload_index_buffer(buffer.clone(), indices);
        if let Some(old) = self.index_buffer.replace(buffer) {
            debug!("releasing replaced index buffer");
            self.backend.delete_buffer(old);
        }
        self.index_count = indices.len() as i32;
        Ok(())
    }

    /// Replace the vertex shader stage and relink if the fragment stage
    /// is also present.
    ///
    /// On compile or link failure the previous program stays active and
    /// the error is returned.
    pub fn update_vertex_shader(&mut self, source: &str) -> Result<(), RenderError> {
        self.ensure_live()?;
        debug!("compiling vertex shader");
        let shader = match self.backend.compile_shader(ShaderStage::Vertex, source) {
            Ok(shader) => shader,
            Err(err) => {
                error!("vertex shader rejected: {}", err);
                return Err(err);
            }
        };
        if let Some(old) = self.vertex_shader.replace(shader) {
            self.backend.delete_shader(old);
        }
        self.relink_if_ready()
    }

    /// Replace the fragment shader stage and relink if the vertex stage
    /// is also present. Same failure behavior as
    /// [`update_vertex_shader`](Renderer::update_vertex_shader).
    pub fn update_fragment_shader(&mut self, source: &str) -> Result<(), RenderError> {
        self.ensure_live()?;
        debug!("compiling fragment shader");
        let shader = match self.backend.compile_shader(ShaderStage::Fragment, source) {
            Ok(shader) => shader,
            Err(err) => {
                error!("fragment shader rejected: {}", err);
                return Err(err);
            }
        };
        if let Some(old) = self.fragment_shader.replace(shader) {
            self.backend.delete_shader(old);
        }
        self.relink_if_ready()
    }

    /// Link the current shader pair and activate the resulting program.
    ///
    /// A no-op while either stage is missing. On success the old program
    /// is freed, the geometry attributes are re-pointed, and the
    /// projection and view matrices are uploaded to the fresh program.
    fn relink_if_ready(&mut self) -> Result<(), RenderError> {
        let (Some(vertex), Some(fragment)) =
            (self.vertex_shader.clone(), self.fragment_shader.clone())
        else {
            return Ok(());
        };
        debug!("linking shader program");
        let program = match self.backend.link_program(vertex, fragment) {
            Ok(program) => program,
            Err(err) => {
                error!("shader program rejected: {}", err);
                return Err(err);
            }
        };
        let bindings = match self.locate_bindings(program.clone()) {
            Ok(bindings) => bindings,
            Err(err) => {
                self.backend.delete_program(program);
                return Err(err);
            }
        };
        if let Some(old) = self.bindings.take() {
            self.backend.delete_program(old.program);
        }
        if let Some(buffer) = self.vertex_buffer.clone() {
            self.backend
                .bind_attribute(buffer, bindings.position.clone(), 3);
        }
        if let Some(buffer) = self.color_buffer.clone() {
            self.backend
                .bind_attribute(buffer, bindings.color.clone(), 3);
        }
        self.backend.use_program(bindings.program.clone());
        self.bindings = Some(bindings);
        self.upload_static_matrices()
    }

    fn locate_bindings(&mut self, program: B::Program) -> Result<ProgramBindings<B>, RenderError> {
        let projection = self
            .backend
            .uniform_location(program.clone(), PROJECTION_UNIFORM)?;
        let view = self.backend.uniform_location(program.clone(), VIEW_UNIFORM)?;
        let model = self.backend.uniform_location(program.clone(), MODEL_UNIFORM)?;
        let position = self
            .backend
            .attribute_location(program.clone(), POSITION_ATTRIBUTE)?;
        let color = self
            .backend
            .attribute_location(program.clone(), COLOR_ATTRIBUTE)?;
        Ok(ProgramBindings {
            program,
            projection,
            view,
            model,
            position,
            color,
        })
    }

    fn upload_static_matrices(&mut self) -> Result<(), RenderError> {
        let Some(bindings) = &self.bindings else {
            return Err(RenderError::InvalidState("shader program is not linked"));
        };
        let projection = to_column_major(self.transforms.projection());
        let view = to_column_major(self.transforms.view());
        self.backend
            .set_uniform_matrix4(&bindings.projection, &projection);
        self.backend.set_uniform_matrix4(&bindings.view, &view);
        Ok(())
    }

    /// Update the stored surface size.
    ///
    /// The projection matrix is recomputed immediately; the viewport and
    /// the re-upload are deferred to the next [`render_frame`], which
    /// applies them before drawing.
    ///
    /// [`render_frame`]: Renderer::render_frame
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        info!("surface resized to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.transforms.resize(width, height);
        self.projection_dirty = true;
    }

    /// Current surface size as `(width, height)`.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Current per-axis rotation speeds.
    pub fn speed(&self) -> RotationSpeed {
        self.speed
    }

    /// Set the rotation speed for one axis. Pure state mutation, takes
    /// effect on the next frame.
    pub fn set_speed(&mut self, axis: Axis, value: f32) {
        self.speed.set(axis, value);
    }

    pub fn set_speed_x(&mut self, value: f32) {
        self.speed.x = value;
    }

    pub fn set_speed_y(&mut self, value: f32) {
        self.speed.y = value;
    }

    pub fn set_speed_z(&mut self, value: f32) {
        self.speed.z = value;
    }

    /// Read-only view of the current projection/view/model matrices.
    pub fn transforms(&self) -> &TransformPipeline {
        &self.transforms
    }

    /// Release every GPU handle. Idempotent; after the first call the
    /// renderer only answers pure accessors, and anything touching the
    /// backend fails with [`RenderError::InvalidState`].
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        info!("releasing renderer");
        for buffer in [
            self.vertex_buffer.take(),
            self.color_buffer.take(),
            self.index_buffer.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.backend.delete_buffer(buffer);
        }
        if let Some(shader) = self.vertex_shader.take() {
            self.backend.delete_shader(shader);
        }
        if let Some(shader) = self.fragment_shader.take() {
            self.backend.delete_shader(shader);
        }
        if let Some(bindings) = self.bindings.take() {
            self.backend.delete_program(bindings.program);
        }
        self.index_count = 0;
        self.released = true;
    }

    /// Release all handles and hand the backend back to the caller.
    pub fn into_backend(mut self) -> B {
        self.release();
        self.backend
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.released {
            Err(RenderError::InvalidState("renderer has been released"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::f32::consts::FRAC_PI_4;
    use std::rc::Rc;

    /// Observable state shared between a [`RecordingBackend`] and the test
    /// that owns it.
    #[derive(Default)]
    struct BackendState {
        next_handle: u32,
        live_buffers: BTreeSet<u32>,
        live_shaders: BTreeSet<u32>,
        live_programs: BTreeSet<u32>,
        array_uploads: Vec<(u32, usize)>,
        index_uploads: Vec<(u32, usize)>,
        attribute_binds: Vec<(u32, String)>,
        bound_index_buffer: Option<u32>,
        active_program: Option<u32>,
        matrix_writes: Vec<(String, [f32; 16])>,
        clear_state: Option<([f32; 4], f32)>,
        viewports: Vec<(u32, u32)>,
        clears: usize,
        draws: Vec<i32>,
        missing_bindings: Vec<String>,
        rejected_sources: Vec<String>,
    }

    /// A [`RenderBackend`] that hands out integer handles and records every
    /// call. Deleting a handle twice, or using one after deletion, panics.
    #[derive(Clone, Default)]
    struct RecordingBackend {
        state: Rc<RefCell<BackendState>>,
    }

    impl RecordingBackend {
        fn alloc(&self) -> u32 {
            let mut state = self.state.borrow_mut();
            state.next_handle += 1;
            state.next_handle
        }
    }

    impl RenderBackend for RecordingBackend {
        type Buffer = u32;
        type Shader = u32;
        type Program = u32;
        type Attribute = String;
        type Uniform = String;

        fn compile_shader(
            &mut self,
            stage: ShaderStage,
            source: &str,
        ) -> Result<u32, RenderError> {
            if self
                .state
                .borrow()
                .rejected_sources
                .iter()
                .any(|rejected| rejected == source)
            {
                return Err(RenderError::Compile {
                    stage,
                    log: format!("mock rejected {} shader", stage),
                });
            }
            let handle = self.alloc();
            self.state.borrow_mut().live_shaders.insert(handle);
            Ok(handle)
        }

        fn delete_shader(&mut self, shader: u32) {
            assert!(
                self.state.borrow_mut().live_shaders.remove(&shader),
                "double free of shader {shader}"
            );
        }

        fn link_program(&mut self, vertex: u32, fragment: u32) -> Result<u32, RenderError> {
            {
                let state = self.state.borrow();
                assert!(state.live_shaders.contains(&vertex), "linking dead shader");
                assert!(state.live_shaders.contains(&fragment), "linking dead shader");
            }
            let handle = self.alloc();
            self.state.borrow_mut().live_programs.insert(handle);
            Ok(handle)
        }

        fn delete_program(&mut self, program: u32) {
            assert!(
                self.state.borrow_mut().live_programs.remove(&program),
                "double free of program {program}"
            );
        }

        fn use_program(&mut self, program: u32) {
            let mut state = self.state.borrow_mut();
            assert!(state.live_programs.contains(&program));
            state.active_program = Some(program);
        }

        fn attribute_location(&mut self, program: u32, name: &str) -> Result<String, RenderError> {
            let state = self.state.borrow();
            assert!(state.live_programs.contains(&program));
            if state.missing_bindings.iter().any(|missing| missing == name) {
                return Err(RenderError::MissingBinding(name.to_string()));
            }
            Ok(name.to_string())
        }

        fn uniform_location(&mut self, program: u32, name: &str) -> Result<String, RenderError> {
            self.attribute_location(program, name)
        }

        fn create_buffer(&mut self) -> Result<u32, RenderError> {
            let handle = self.alloc();
            self.state.borrow_mut().live_buffers.insert(handle);
            Ok(handle)
        }

        fn delete_buffer(&mut self, buffer: u32) {
            assert!(
                self.state.borrow_mut().live_buffers.remove(&buffer),
                "double free of buffer {buffer}"
            );
        }

        fn upload_array_buffer(&mut self, buffer: u32, data: &[f32]) {
            let mut state = self.state.borrow_mut();
            assert!(state.live_buffers.contains(&buffer), "upload to dead buffer");
            state.array_uploads.push((buffer, data.len()));
        }

        fn upload_index_buffer(&mut self, buffer: u32, data: &[u16]) {
            let mut state = self.state.borrow_mut();
            assert!(state.live_buffers.contains(&buffer), "upload to dead buffer");
            state.index_uploads.push((buffer, data.len()));
        }

        fn bind_attribute(&mut self, buffer: u32, attribute: String, components: i32) {
            let mut state = self.state.borrow_mut();
            assert!(state.live_buffers.contains(&buffer), "binding dead buffer");
            assert_eq!(components, 3);
            state.attribute_binds.push((buffer, attribute));
        }

        fn bind_index_buffer(&mut self, buffer: u32) {
            let mut state = self.state.borrow_mut();
            assert!(state.live_buffers.contains(&buffer), "binding dead buffer");
            state.bound_index_buffer = Some(buffer);
        }

        fn set_uniform_matrix4(&mut self, uniform: &String, values: &[f32; 16]) {
            self.state
                .borrow_mut()
                .matrix_writes
                .push((uniform.clone(), *values));
        }

        fn set_clear_state(&mut self, color: [f32; 4], depth: f32) {
            self.state.borrow_mut().clear_state = Some((color, depth));
        }

        fn set_viewport(&mut self, width: u32, height: u32) {
            self.state.borrow_mut().viewports.push((width, height));
        }

        fn clear_frame(&mut self) {
            self.state.borrow_mut().clears += 1;
        }

        fn draw_indexed_triangles(&mut self, index_count: i32) {
            self.state.borrow_mut().draws.push(index_count);
        }
    }

    fn triangle() -> MeshData {
        MeshData::new(
            vec![0.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    fn config(speed: RotationSpeed) -> RendererConfig {
        RendererConfig {
            width: 800,
            height: 600,
            speed,
            mesh: triangle(),
            shaders: ShaderSource::new("vertex source", "fragment source"),
        }
    }

    fn ready_renderer(
        speed: RotationSpeed,
    ) -> (Renderer<RecordingBackend>, Rc<RefCell<BackendState>>) {
        let backend = RecordingBackend::default();
        let state = backend.state.clone();
        let renderer = Renderer::new(backend, config(speed)).unwrap();
        (renderer, state)
    }

    fn writes_to<'a>(
        state: &'a BackendState,
        uniform: &str,
    ) -> Vec<&'a [f32; 16]> {
        state
            .matrix_writes
            .iter()
            .filter(|(name, _)| name == uniform)
            .map(|(_, values)| values)
            .collect()
    }

    #[test]
    fn construction_runs_the_full_setup_sequence() {
        let (renderer, state) = ready_renderer(RotationSpeed::default());
        let state = state.borrow();

        assert_eq!(state.live_buffers.len(), 3);
        assert_eq!(state.live_shaders.len(), 2);
        assert_eq!(state.live_programs.len(), 1);
        assert_eq!(state.active_program, state.live_programs.first().copied());
        assert_eq!(state.clear_state, Some(([0.5, 0.5, 0.5, 0.9], 1.0)));
        assert_eq!(state.viewports, vec![(800, 600)]);

        // Both attributes bound, 3 components each, after the link.
        let attributes: Vec<&str> = state
            .attribute_binds
            .iter()
            .map(|(_, name)| name.as_str())
            .collect();
        assert_eq!(attributes, vec!["position", "color"]);

        // Projection and view uploaded once; the model waits for a frame.
        assert_eq!(writes_to(&state, "Pmatrix").len(), 1);
        assert_eq!(writes_to(&state, "Vmatrix").len(), 1);
        assert!(writes_to(&state, "Mmatrix").is_empty());

        assert_eq!(renderer.surface_size(), (800, 600));
    }

    #[test]
    fn missing_uniform_aborts_construction_and_frees_everything() {
        let backend = RecordingBackend::default();
        let state = backend.state.clone();
        state.borrow_mut().missing_bindings.push("Mmatrix".into());

        let err = Renderer::new(backend, config(RotationSpeed::default())).unwrap_err();
        assert_eq!(err, RenderError::MissingBinding("Mmatrix".into()));

        let state = state.borrow();
        assert!(state.live_buffers.is_empty());
        assert!(state.live_shaders.is_empty());
        assert!(state.live_programs.is_empty());
    }

    #[test]
    fn rejected_shader_aborts_construction() {
        let backend = RecordingBackend::default();
        let state = backend.state.clone();
        state.borrow_mut().rejected_sources.push("fragment source".into());

        let err = Renderer::new(backend, config(RotationSpeed::default())).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));

        let state = state.borrow();
        assert!(state.live_buffers.is_empty());
        assert!(state.live_shaders.is_empty());
        assert!(state.live_programs.is_empty());
    }

    #[test]
    fn zero_speed_model_stays_identity_across_frames() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        renderer.render_frame(0.0).unwrap();
        renderer.render_frame(16.0).unwrap();

        let identity = to_column_major(&Mat4::IDENTITY);
        let state = state.borrow();
        let models = writes_to(&state, "Mmatrix");
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|values| **values == identity));
        assert_eq!(state.draws, vec![3, 3]);
        assert_eq!(state.clears, 2);
        assert!(state.bound_index_buffer.is_some());
    }

    #[test]
    fn rotation_follows_the_frame_clock() {
        let (mut renderer, _) = ready_renderer(RotationSpeed::new(1.0, 0.0, 0.0));

        // First frame only seeds the clock.
        renderer.render_frame(100.0).unwrap();
        assert!(renderer.transforms().model().abs_diff_eq(Mat4::IDENTITY, 1e-6));

        // 500 time units per unit of rotation angle.
        renderer.render_frame(100.0 + 500.0 * FRAC_PI_4).unwrap();
        let expected = Mat4::from_rotation_x(FRAC_PI_4);
        assert!(renderer.transforms().model().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn vertex_swap_keeps_exactly_one_live_vertex_buffer() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        assert_eq!(state.borrow().live_buffers.len(), 3);

        renderer.update_vertices(&[0.5; 9]).unwrap();
        renderer.update_vertices(&[0.25; 9]).unwrap();

        let state = state.borrow();
        assert_eq!(state.live_buffers.len(), 3);
        // The position attribute always points at the newest buffer.
        let (buffer, attribute) = state.attribute_binds.last().unwrap();
        assert_eq!(attribute, "position");
        assert!(state.live_buffers.contains(buffer));
    }

    #[test]
    fn index_swap_updates_the_draw_count() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        renderer
            .update_indices(&[0, 1, 2, 0, 2, 1])
            .unwrap();
        renderer.render_frame(0.0).unwrap();
        assert_eq!(state.borrow().draws, vec![6]);
    }

    #[test]
    fn fragment_only_renderer_is_not_linked() {
        let backend = RecordingBackend::default();
        let state = backend.state.clone();
        let mut renderer = Renderer::with_geometry(
            backend,
            800,
            600,
            RotationSpeed::default(),
            &triangle(),
        )
        .unwrap();

        renderer.update_fragment_shader("fragment source").unwrap();
        assert!(state.borrow().live_programs.is_empty());

        let err = renderer.render_frame(0.0).unwrap_err();
        assert_eq!(err, RenderError::InvalidState("shader program is not linked"));
        assert_eq!(state.borrow().clears, 0);
        assert!(state.borrow().draws.is_empty());

        // Supplying the vertex stage completes the link.
        renderer.update_vertex_shader("vertex source").unwrap();
        renderer.render_frame(0.0).unwrap();
        assert_eq!(state.borrow().draws, vec![3]);
    }

    #[test]
    fn shader_hot_swap_replaces_the_program() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        let first_program = state.borrow().active_program.unwrap();

        renderer.update_fragment_shader("brighter fragment").unwrap();

        let state = state.borrow();
        assert_eq!(state.live_programs.len(), 1);
        let second_program = state.active_program.unwrap();
        assert_ne!(first_program, second_program);
        // The fresh program received the static matrices again.
        assert_eq!(writes_to(&state, "Pmatrix").len(), 2);
        assert_eq!(writes_to(&state, "Vmatrix").len(), 2);
    }

    #[test]
    fn failed_hot_swap_keeps_the_previous_program() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        let original_program = state.borrow().active_program.unwrap();
        state.borrow_mut().rejected_sources.push("broken".into());

        let err = renderer.update_fragment_shader("broken").unwrap_err();
        assert!(matches!(err, RenderError::Compile { .. }));

        assert_eq!(state.borrow().active_program, Some(original_program));
        renderer.render_frame(0.0).unwrap();
        assert_eq!(state.borrow().draws, vec![3]);
    }

    #[test]
    fn resize_defers_projection_upload_to_the_next_frame() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        renderer.render_frame(0.0).unwrap();
        renderer.set_surface_size(400, 600);

        {
            let state = state.borrow();
            assert_eq!(writes_to(&state, "Pmatrix").len(), 1);
            assert_eq!(state.viewports, vec![(800, 600)]);
        }

        renderer.render_frame(16.0).unwrap();

        let state = state.borrow();
        let projections = writes_to(&state, "Pmatrix");
        assert_eq!(projections.len(), 2);
        // Halving the aspect ratio doubles the horizontal scale term.
        assert!((projections[1][0] - 2.0 * projections[0][0]).abs() < 1e-6);
        assert_eq!(projections[1][5], projections[0][5]);
        assert_eq!(state.viewports.last(), Some(&(400, 600)));
    }

    #[test]
    fn release_frees_everything_and_is_idempotent() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        renderer.release();

        {
            let state = state.borrow();
            assert!(state.live_buffers.is_empty());
            assert!(state.live_shaders.is_empty());
            assert!(state.live_programs.is_empty());
        }

        // A second release must not double-free (the mock would panic).
        renderer.release();

        let err = renderer.render_frame(0.0).unwrap_err();
        assert_eq!(err, RenderError::InvalidState("renderer has been released"));
        let err = renderer.update_vertices(&[0.0; 9]).unwrap_err();
        assert!(matches!(err, RenderError::InvalidState(_)));
    }

    #[test]
    fn speed_setters_are_pure_state() {
        let (mut renderer, state) = ready_renderer(RotationSpeed::default());
        let calls_before = state.borrow().matrix_writes.len();

        renderer.set_speed(Axis::Y, 2.0);
        renderer.set_speed_x(-1.0);
        renderer.set_speed_z(0.5);

        assert_eq!(renderer.speed(), RotationSpeed::new(-1.0, 2.0, 0.5));
        assert_eq!(state.borrow().matrix_writes.len(), calls_before);
    }
}
