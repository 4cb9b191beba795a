//! [`RenderBackend`] implementation over a [`glow`] OpenGL / WebGL context.
//!
//! The backend is generic over [`glow::HasContext`], so the same code drives
//! a native GL context on desktop and a WebGL2 context in the browser. The
//! embedding application owns context creation (windowing, canvas lookup,
//! function loading) and hands the finished context in; see [`glow`'s
//! documentation](https://docs.rs/glow) for the per-platform setup dance.
//!
//! All GL entry points are `unsafe` in glow. The blocks below are sound
//! under glow's stated contract: handles passed in were minted by this
//! context and have not been deleted, which the renderer's ownership
//! protocol guarantees.

use glow::HasContext;

use crate::backend::{RenderBackend, RenderError, ShaderStage};

/// A [`RenderBackend`] backed by a glow GL context.
pub struct GlowBackend<C: HasContext> {
    gl: C,
}

impl<C: HasContext> GlowBackend<C> {
    /// Wrap an already-created GL context.
    pub fn new(gl: C) -> Self {
        Self { gl }
    }

    /// Access the underlying context, e.g. for capability queries.
    pub fn context(&self) -> &C {
        &self.gl
    }

    /// Consume the backend and hand the context back to the caller.
    pub fn into_context(self) -> C {
        self.gl
    }
}

impl<C: HasContext> RenderBackend for GlowBackend<C> {
    type Buffer = C::Buffer;
    type Shader = C::Shader;
    type Program = C::Program;
    type Attribute = u32;
    type Uniform = C::UniformLocation;

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Shader, RenderError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(RenderError::ResourceExhausted)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(RenderError::Compile { stage, log });
            }
            Ok(shader)
        }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe {
            self.gl.delete_shader(shader);
        }
    }

    fn link_program(
        &mut self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, RenderError> {
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(RenderError::ResourceExhausted)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(RenderError::Link { log });
            }
            Ok(program)
        }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe {
            self.gl.delete_program(program);
        }
    }

    fn use_program(&mut self, program: Self::Program) {
        unsafe {
            self.gl.use_program(Some(program));
        }
    }

    fn attribute_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Result<Self::Attribute, RenderError> {
        unsafe {
            self.gl
                .get_attrib_location(program, name)
                .ok_or_else(|| RenderError::MissingBinding(name.to_string()))
        }
    }

    fn uniform_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Result<Self::Uniform, RenderError> {
        unsafe {
            self.gl
                .get_uniform_location(program, name)
                .ok_or_else(|| RenderError::MissingBinding(name.to_string()))
        }
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, RenderError> {
        unsafe {
            self.gl
                .create_buffer()
                .map_err(RenderError::ResourceExhausted)
        }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe {
            self.gl.delete_buffer(buffer);
        }
    }

    fn upload_array_buffer(&mut self, buffer: Self::Buffer, data: &[f32]) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
        }
    }

    fn upload_index_buffer(&mut self, buffer: Self::Buffer, data: &[u16]) {
        unsafe {
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
        }
    }

    fn bind_attribute(
        &mut self,
        buffer: Self::Buffer,
        attribute: Self::Attribute,
        components: i32,
    ) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl
                .vertex_attrib_pointer_f32(attribute, components, glow::FLOAT, false, 0, 0);
            self.gl.enable_vertex_attrib_array(attribute);
        }
    }

    fn bind_index_buffer(&mut self, buffer: Self::Buffer) {
        unsafe {
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
        }
    }

    fn set_uniform_matrix4(&mut self, uniform: &Self::Uniform, values: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(uniform), false, values);
        }
    }

    fn set_clear_state(&mut self, color: [f32; 4], depth: f32) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear_depth_f64(f64::from(depth));
            self.gl.depth_func(glow::LEQUAL);
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
    }

    fn clear_frame(&mut self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_indexed_triangles(&mut self, index_count: i32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, index_count, glow::UNSIGNED_SHORT, 0);
        }
    }
}
