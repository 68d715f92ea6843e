//! Recording stand-in for a GL driver used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Once;

use crate::context::RenderContext;

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps log records per thread, so each test only sees its own.
struct ThreadLogger;

impl log::Log for ThreadLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS.with_borrow_mut(|records| {
            records.push((record.level(), record.args().to_string()));
        });
    }

    fn flush(&self) {}
}

static LOGGER: ThreadLogger = ThreadLogger;
static INSTALL_LOGGER: Once = Once::new();

/// Starts capturing log records emitted on the current thread.
pub fn capture_logs() {
    INSTALL_LOGGER.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    RECORDS.with_borrow_mut(Vec::clear);
}

/// Error-level messages logged on this thread since `capture_logs`.
pub fn logged_errors() -> Vec<String> {
    RECORDS.with_borrow(|records| {
        records
            .iter()
            .filter(|(level, _)| *level == log::Level::Error)
            .map(|(_, message)| message.clone())
            .collect()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(u32, u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    GetUniformLocation(u32, String),
    Uniform1i(String, i32),
    Uniform1f(String, f32),
    Uniform4f(String, [f32; 4]),
    UniformMatrix4(String, Vec<f32>),
    CreateBuffer(u32),
    BindBuffer(u32, Option<u32>),
    BufferData(u32, usize, u32),
    DeleteBuffer(u32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        stride: i32,
        offset: i32,
    },
    EnableVertexAttribArray(u32),
    CreateTexture(u32),
    ActiveTexture(u32),
    BindTexture(u32, Option<u32>),
    TexParameter(u32, i32),
    TexImage2d(i32, i32, usize),
    GenerateMipmap(u32),
    DeleteTexture(u32),
    DrawElements {
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
    },
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear(u32),
    PolygonMode(u32, u32),
}

/// Hands out sequential non-zero handles and records every call.
///
/// A shader "compiles" when its source contains `void main`. A program links
/// unless `fail_link` is set. A uniform resolves when its name appears in the
/// source of a stage attached to the program.
#[derive(Default)]
pub struct RecordingContext {
    calls: RefCell<Vec<Call>>,
    next_handle: Cell<u32>,
    sources: RefCell<HashMap<u32, String>>,
    attached: RefCell<HashMap<u32, Vec<u32>>>,
    pub fail_link: Cell<bool>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|&c| predicate(c)).count()
    }

    /// Handles created minus handles deleted, across every object kind.
    pub fn live_objects(&self) -> i64 {
        self.calls.borrow().iter().fold(0, |live, call| match call {
            Call::CreateShader(..)
            | Call::CreateProgram(_)
            | Call::CreateBuffer(_)
            | Call::CreateVertexArray(_)
            | Call::CreateTexture(_) => live + 1,
            Call::DeleteShader(_)
            | Call::DeleteProgram(_)
            | Call::DeleteBuffer(_)
            | Call::DeleteVertexArray(_)
            | Call::DeleteTexture(_) => live - 1,
            _ => live,
        })
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn next(&self) -> u32 {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        handle
    }
}

impl RenderContext for RecordingContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type Texture = u32;
    type UniformLocation = String;

    fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let handle = self.next();
        self.record(Call::CreateShader(shader_type, handle));
        Ok(handle)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.sources.borrow_mut().insert(shader, source.to_string());
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));
    }

    fn get_shader_compile_status(&self, shader: u32) -> bool {
        self.sources
            .borrow()
            .get(&shader)
            .is_some_and(|source| source.contains("void main"))
    }

    fn get_shader_info_log(&self, shader: u32) -> String {
        if self.get_shader_compile_status(shader) {
            String::new()
        } else {
            "0:1(1): error: syntax error, unexpected end of file".to_string()
        }
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, String> {
        let handle = self.next();
        self.record(Call::CreateProgram(handle));
        Ok(handle)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.attached
            .borrow_mut()
            .entry(program)
            .or_default()
            .push(shader);
        self.record(Call::AttachShader(program, shader));
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader(program, shader));
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));
    }

    fn get_program_link_status(&self, _program: u32) -> bool {
        !self.fail_link.get()
    }

    fn get_program_info_log(&self, program: u32) -> String {
        if self.get_program_link_status(program) {
            String::new()
        } else {
            "error: vertex shader output not read by fragment shader".to_string()
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
    }

    fn get_uniform_location(&self, program: u32, name: &str) -> Option<String> {
        self.record(Call::GetUniformLocation(program, name.to_string()));
        let attached = self.attached.borrow();
        let sources = self.sources.borrow();
        attached
            .get(&program)?
            .iter()
            .filter_map(|shader| sources.get(shader))
            .any(|source| source.contains(name))
            .then(|| name.to_string())
    }

    fn uniform_1_i32(&self, location: Option<&String>, x: i32) {
        if let Some(name) = location {
            self.record(Call::Uniform1i(name.clone(), x));
        }
    }

    fn uniform_1_f32(&self, location: Option<&String>, x: f32) {
        if let Some(name) = location {
            self.record(Call::Uniform1f(name.clone(), x));
        }
    }

    fn uniform_4_f32(&self, location: Option<&String>, x: f32, y: f32, z: f32, w: f32) {
        if let Some(name) = location {
            self.record(Call::Uniform4f(name.clone(), [x, y, z, w]));
        }
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&String>, _transpose: bool, v: &[f32]) {
        if let Some(name) = location {
            self.record(Call::UniformMatrix4(name.clone(), v.to_vec()));
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let handle = self.next();
        self.record(Call::CreateBuffer(handle));
        Ok(handle)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        self.record(Call::BufferData(target, data.len(), usage));
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let handle = self.next();
        self.record(Call::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.record(Call::DeleteVertexArray(vertex_array));
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        _data_type: u32,
        _normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.record(Call::VertexAttribPointer {
            index,
            size,
            stride,
            offset,
        });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(Call::EnableVertexAttribArray(index));
    }

    fn create_texture(&self) -> Result<u32, String> {
        let handle = self.next();
        self.record(Call::CreateTexture(handle));
        Ok(handle)
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: u32, texture: Option<u32>) {
        self.record(Call::BindTexture(target, texture));
    }

    fn tex_parameter_i32(&self, _target: u32, parameter: u32, value: i32) {
        self.record(Call::TexParameter(parameter, value));
    }

    fn tex_image_2d_rgba(&self, _target: u32, width: i32, height: i32, pixels: &[u8]) {
        self.record(Call::TexImage2d(width, height, pixels.len()));
    }

    fn generate_mipmap(&self, target: u32) {
        self.record(Call::GenerateMipmap(target));
    }

    fn delete_texture(&self, texture: u32) {
        self.record(Call::DeleteTexture(texture));
    }

    unsafe fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        self.record(Call::DrawElements {
            mode,
            count,
            element_type,
            offset,
        });
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record(Call::ClearColor([red, green, blue, alpha]));
    }

    fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }

    fn polygon_mode(&self, face: u32, mode: u32) {
        self.record(Call::PolygonMode(face, mode));
    }
}
