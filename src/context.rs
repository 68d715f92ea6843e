use std::fmt::Debug;

use glow::HasContext;

/// Everything the renderer asks of the graphics driver.
///
/// The bound buffer, the active program and the bound texture all live behind
/// this object instead of in ambient global state, so every component that
/// issues a bind or a draw does it through the context it was created with.
/// Method names follow OpenGL (and `glow`) one to one.
pub trait RenderContext {
    type Shader: Copy + Debug + PartialEq;
    type Program: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug + PartialEq;
    type VertexArray: Copy + Debug + PartialEq;
    type Texture: Copy + Debug + PartialEq;
    type UniformLocation: Debug;

    // Shaders and programs
    fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn get_program_link_status(&self, program: Self::Program) -> bool;
    fn get_program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    // Uniforms
    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32);
    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32);
    fn uniform_4_f32(
        &self,
        location: Option<&Self::UniformLocation>,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    );
    fn uniform_matrix_4_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    );

    // Buffers and vertex arrays
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&self, index: u32);

    // Textures
    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    fn tex_image_2d_rgba(&self, target: u32, width: i32, height: i32, pixels: &[u8]);
    fn generate_mipmap(&self, target: u32);
    fn delete_texture(&self, texture: Self::Texture);

    // Drawing

    /// # Safety
    ///
    /// A vertex array must be bound whose element buffer holds at least
    /// `count` indices of `element_type` past byte `offset`, and every one of
    /// those indices must address a vertex inside the bound vertex buffers.
    /// The driver reads exactly that range without checking it.
    unsafe fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear(&self, mask: u32);
    fn polygon_mode(&self, face: u32, mode: u32);
}

// Calls below forward to the driver. Each one needs a current context on
// this thread, which main keeps for as long as the glow::Context lives.
// Calls that read caller memory need more: `tex_image_2d_rgba` checks the
// pixel slice against the declared size itself, and `draw_elements` passes
// its buffer-range contract on to the caller as `unsafe`.
impl RenderContext for glow::Context {
    type Shader = glow::NativeShader;
    type Program = glow::NativeProgram;
    type Buffer = glow::NativeBuffer;
    type VertexArray = glow::NativeVertexArray;
    type Texture = glow::NativeTexture;
    type UniformLocation = glow::NativeUniformLocation;

    fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, shader_type) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn get_program_link_status(&self, program: Self::Program) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    fn get_program_info_log(&self, program: Self::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32) {
        unsafe { HasContext::uniform_1_i32(self, location, x) }
    }

    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32) {
        unsafe { HasContext::uniform_1_f32(self, location, x) }
    }

    fn uniform_4_f32(
        &self,
        location: Option<&Self::UniformLocation>,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    ) {
        unsafe { HasContext::uniform_4_f32(self, location, x, y, z, w) }
    }

    fn uniform_matrix_4_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    ) {
        unsafe { HasContext::uniform_matrix_4_f32_slice(self, location, transpose, v) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self, index, size, data_type, normalized, stride, offset,
            )
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, unit) }
    }

    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        unsafe { HasContext::bind_texture(self, target, texture) }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { HasContext::tex_parameter_i32(self, target, parameter, value) }
    }

    fn tex_image_2d_rgba(&self, target: u32, width: i32, height: i32, pixels: &[u8]) {
        let expected = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h)?.checked_mul(4));
        if expected != Some(pixels.len()) {
            log::error!(
                "Refusing texture upload: {} bytes for a {width}x{height} RGBA image",
                pixels.len()
            );
            return;
        }

        unsafe {
            HasContext::tex_image_2d(
                self,
                target,
                0,
                glow::RGBA as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            )
        }
    }

    fn generate_mipmap(&self, target: u32) {
        unsafe { HasContext::generate_mipmap(self, target) }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    unsafe fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { HasContext::draw_elements(self, mode, count, element_type, offset) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { HasContext::clear_color(self, red, green, blue, alpha) }
    }

    fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }

    fn polygon_mode(&self, face: u32, mode: u32) {
        unsafe { HasContext::polygon_mode(self, face, mode) }
    }
}
