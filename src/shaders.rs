use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::RenderContext;
use crate::error::{RenderError, Result};

/// Orange fill for position-only geometry.
pub const BASIC_VERTEX_SOURCE: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

pub const BASIC_FRAGMENT_SOURCE: &str = "#version 330 core
out vec4 FragColor;
void main()
{
    FragColor = vec4(1.0f, 0.5f, 0.2f, 1.0f);
}
";

/// Position, colour and UV. Kept in sync with `shaders/vertex.glsl`.
pub const TEXTURED_VERTEX_SOURCE: &str = include_str!("../shaders/vertex.glsl");
pub const TEXTURED_FRAGMENT_SOURCE: &str = include_str!("../shaders/fragment.glsl");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_type(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "VERTEX"),
            ShaderStage::Fragment => write!(f, "FRAGMENT"),
        }
    }
}

/// Where the two stages of a program come from.
#[derive(Debug, Clone)]
pub enum ShaderSource {
    Inline { vertex: String, fragment: String },
    Files { vertex: PathBuf, fragment: PathBuf },
}

impl ShaderSource {
    pub fn basic() -> Self {
        ShaderSource::Inline {
            vertex: BASIC_VERTEX_SOURCE.to_string(),
            fragment: BASIC_FRAGMENT_SOURCE.to_string(),
        }
    }

    pub fn textured() -> Self {
        ShaderSource::Inline {
            vertex: TEXTURED_VERTEX_SOURCE.to_string(),
            fragment: TEXTURED_FRAGMENT_SOURCE.to_string(),
        }
    }
}

/// A linked vertex + fragment program. Immutable once built; the program
/// object is deleted when this is dropped.
pub struct ShaderProgram<C: RenderContext> {
    context: Arc<C>,
    handle: C::Program,
    vertex_source: String,
    fragment_source: String,
}

impl<C: RenderContext> ShaderProgram<C> {
    pub fn new(context: Arc<C>, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        let handle = link_program(&*context, vertex_source, fragment_source).inspect_err(|e| {
            log::error!("{e}");
        })?;
        log::debug!("Linked shader program {handle:?}");

        Ok(Self {
            context,
            handle,
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
        })
    }

    /// Reads both stages whole from disk, then compiles and links them.
    pub fn from_files(
        context: Arc<C>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;
        Self::new(context, &vertex_source, &fragment_source)
    }

    pub fn from_source(context: Arc<C>, source: &ShaderSource) -> Result<Self> {
        match source {
            ShaderSource::Inline { vertex, fragment } => Self::new(context, vertex, fragment),
            ShaderSource::Files { vertex, fragment } => Self::from_files(context, vertex, fragment),
        }
    }

    pub fn handle(&self) -> C::Program {
        self.handle
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Makes this the program used by subsequent draws and uniform writes.
    pub fn activate(&self) {
        self.context.use_program(Some(self.handle));
    }

    // Uniform setters write to the active program, so activate() first.
    // Names that don't resolve are ignored, same as the driver does.

    pub fn set_bool(&self, name: &str, value: bool) {
        let location = self.context.get_uniform_location(self.handle, name);
        self.context.uniform_1_i32(location.as_ref(), value as i32);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        let location = self.context.get_uniform_location(self.handle, name);
        self.context.uniform_1_i32(location.as_ref(), value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        let location = self.context.get_uniform_location(self.handle, name);
        self.context.uniform_1_f32(location.as_ref(), value);
    }

    pub fn set_vec4(&self, name: &str, value: cgmath::Vector4<f32>) {
        let location = self.context.get_uniform_location(self.handle, name);
        self.context
            .uniform_4_f32(location.as_ref(), value.x, value.y, value.z, value.w);
    }

    pub fn set_mat4(&self, name: &str, value: &cgmath::Matrix4<f32>) {
        let location = self.context.get_uniform_location(self.handle, name);
        let columns: &[f32; 16] = value.as_ref();
        self.context
            .uniform_matrix_4_f32_slice(location.as_ref(), false, columns);
    }
}

impl<C: RenderContext> Drop for ShaderProgram<C> {
    fn drop(&mut self) {
        log::trace!("Deleting shader program {:?}", self.handle);
        self.context.delete_program(self.handle);
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| {
        let error = RenderError::FileRead {
            path: path.to_path_buf(),
            source,
        };
        log::error!("{error}");
        error
    })
}

fn compile_stage<C: RenderContext>(
    context: &C,
    stage: ShaderStage,
    source: &str,
) -> Result<C::Shader> {
    let shader = context
        .create_shader(stage.gl_type())
        .map_err(|reason| RenderError::Allocation {
            object: "shader",
            reason,
        })?;
    context.shader_source(shader, source);
    context.compile_shader(shader);

    if !context.get_shader_compile_status(shader) {
        let log = context.get_shader_info_log(shader);
        context.delete_shader(shader);
        return Err(RenderError::ShaderCompile { stage, log });
    }

    Ok(shader)
}

fn link_program<C: RenderContext>(
    context: &C,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<C::Program> {
    let vertex_shader = compile_stage(context, ShaderStage::Vertex, vertex_source)?;
    let fragment_shader = match compile_stage(context, ShaderStage::Fragment, fragment_source) {
        Ok(shader) => shader,
        Err(e) => {
            context.delete_shader(vertex_shader);
            return Err(e);
        }
    };

    let program = match context.create_program() {
        Ok(program) => program,
        Err(reason) => {
            context.delete_shader(vertex_shader);
            context.delete_shader(fragment_shader);
            return Err(RenderError::Allocation {
                object: "program",
                reason,
            });
        }
    };

    context.attach_shader(program, vertex_shader);
    context.attach_shader(program, fragment_shader);
    context.link_program(program);

    // The stage objects aren't needed once linking has been attempted.
    for shader in [vertex_shader, fragment_shader] {
        context.detach_shader(program, shader);
        context.delete_shader(shader);
    }

    if !context.get_program_link_status(program) {
        let log = context.get_program_info_log(program);
        context.delete_program(program);
        return Err(RenderError::ShaderLink { log });
    }

    Ok(program)
}
