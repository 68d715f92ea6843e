use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use crate::{
    context::RenderContext,
    error::{RenderError, Result},
    opengl::{GpuBuffers, VertexFormat},
    shaders::{ShaderProgram, ShaderSource},
    textures::Texture,
};

pub const TRANSFORM_UNIFORM: &str = "transform";
pub const USE_TEXTURE_UNIFORM: &str = "useTexture";
pub const SAMPLER_UNIFORM: &str = "texture1";

/// Anything the frame loop can draw.
pub trait Drawable {
    fn name(&self) -> &str;
    fn draw(&self);
}

/// Everything needed to build a [`Mesh`].
#[derive(Debug, Clone)]
pub struct MeshDescriptor {
    pub name: String,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub index_count: usize,
    pub format: VertexFormat,
    pub shader: ShaderSource,
    pub texture: Option<PathBuf>,
    /// vec4 uniform that gets a green channel pulsing with time.
    pub pulse_uniform: Option<String>,
}

impl MeshDescriptor {
    pub fn new(name: impl Into<String>, vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        let index_count = indices.len();
        Self {
            name: name.into(),
            vertices,
            indices,
            index_count,
            format: VertexFormat::Position,
            shader: ShaderSource::basic(),
            texture: None,
            pulse_uniform: None,
        }
    }

    pub fn format(mut self, format: VertexFormat) -> Self {
        self.format = format;
        self
    }

    pub fn shader(mut self, shader: ShaderSource) -> Self {
        self.shader = shader;
        self
    }

    pub fn texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture = Some(path.into());
        self
    }

    pub fn pulse_uniform(mut self, name: impl Into<String>) -> Self {
        self.pulse_uniform = Some(name.into());
        self
    }
}

/// Indexed triangle geometry with its own program and, optionally, a texture.
///
/// Every GL object the mesh owns is released when it is dropped.
pub struct Mesh<C: RenderContext> {
    context: Arc<C>,
    name: String,
    format: VertexFormat,
    index_count: usize,

    buffers: GpuBuffers<C>,
    program: ShaderProgram<C>,
    texture: Option<Texture<C>>,
    texture_error: Option<RenderError>,
    pulse_uniform: Option<String>,

    transform: Matrix4<f32>,
    created: Instant,
}

impl<C: RenderContext> Mesh<C> {
    pub fn new(context: Arc<C>, descriptor: MeshDescriptor) -> Result<Self> {
        validate(&descriptor)?;
        let program = ShaderProgram::from_source(context.clone(), &descriptor.shader)?;
        Self::with_program(context, descriptor, program)
    }

    /// Builds the mesh around an already linked program. The descriptor's
    /// shader source is ignored.
    pub fn with_program(
        context: Arc<C>,
        descriptor: MeshDescriptor,
        program: ShaderProgram<C>,
    ) -> Result<Self> {
        validate(&descriptor)?;

        let buffers = GpuBuffers::new(
            context.clone(),
            &descriptor.vertices,
            &descriptor.indices,
            descriptor.format,
        )
        .inspect_err(|e| log::error!("Mesh {}: {e}", descriptor.name))?;

        // A texture that fails to load leaves the mesh drawable, just untextured.
        let (texture, texture_error) = match &descriptor.texture {
            Some(path) => match Texture::from_path(context.clone(), path) {
                Ok(texture) => (Some(texture), None),
                Err(e) => {
                    log::error!("Mesh {}: {e}", descriptor.name);
                    (None, Some(e))
                }
            },
            None => (None, None),
        };

        log::info!(
            "Created mesh {} ({} vertices, {} indices{})",
            descriptor.name,
            buffers.vertex_count,
            descriptor.index_count,
            if texture.is_some() { ", textured" } else { "" }
        );

        Ok(Self {
            context,
            name: descriptor.name,
            format: descriptor.format,
            index_count: descriptor.index_count,
            buffers,
            program,
            texture,
            texture_error,
            pulse_uniform: descriptor.pulse_uniform,
            transform: Matrix4::identity(),
            created: Instant::now(),
        })
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn format(&self) -> VertexFormat {
        self.format
    }

    pub fn program(&self) -> &ShaderProgram<C> {
        &self.program
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Why the requested texture isn't bound, if it failed to load.
    pub fn texture_error(&self) -> Option<&RenderError> {
        self.texture_error.as_ref()
    }

    pub fn transform(&self) -> Matrix4<f32> {
        self.transform
    }

    /// Where the transform currently puts the model origin.
    pub fn origin(&self) -> Vector4<f32> {
        self.transform * Vector4::new(0.0, 0.0, 0.0, 1.0)
    }

    pub fn translate(&mut self, translation: Vector3<f32>) {
        self.transform = Matrix4::from_translation(translation) * self.transform;
    }

    pub fn scale(&mut self, scale: Vector3<f32>) {
        self.transform = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z) * self.transform;
    }

    /// Rotation has no agreed convention yet (axis order, degrees or
    /// radians), so it is refused instead of guessed.
    pub fn rotate(&mut self, rotation: Vector3<f32>) -> Result<()> {
        log::warn!(
            "Mesh {}: rotate({:?}) requested but rotation is not supported",
            self.name,
            rotation
        );
        Err(RenderError::Unsupported("rotate"))
    }

    /// Draws as if `seconds` had passed since the mesh was created.
    pub fn draw_at(&self, seconds: f32) {
        self.program.activate();

        if let Some(uniform) = &self.pulse_uniform {
            self.program.set_vec4(uniform, pulse_color(seconds));
        }
        self.program.set_mat4(TRANSFORM_UNIFORM, &self.transform);
        self.program
            .set_bool(USE_TEXTURE_UNIFORM, self.texture.is_some());

        self.buffers.bind();

        if let Some(texture) = &self.texture {
            self.program.set_int(SAMPLER_UNIFORM, 0);
            texture.bind(0);
        }

        // SAFETY: validate() keeps index_count within i32 and equal to the
        // uploaded indices, each of which addresses a vertex in the uploaded
        // buffer. Both buffers belong to the VAO bound above.
        unsafe {
            self.context.draw_elements(
                glow::TRIANGLES,
                self.index_count as i32,
                glow::UNSIGNED_INT,
                0,
            );
        }

        // The VAO stays bound; only the array buffer binding is reset.
        self.context.bind_buffer(glow::ARRAY_BUFFER, None);
    }
}

impl<C: RenderContext> Drawable for Mesh<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw(&self) {
        self.draw_at(self.created.elapsed().as_secs_f32());
    }
}

/// Green channel swings between 0 and 1 once every 2π seconds.
pub fn pulse_color(seconds: f32) -> Vector4<f32> {
    Vector4::new(0.0, seconds.sin() / 2.0 + 0.5, 0.0, 1.0)
}

fn validate(descriptor: &MeshDescriptor) -> Result<()> {
    let vertex_count = descriptor.vertices.len() / descriptor.format.floats_per_vertex();

    let error = if i32::try_from(descriptor.index_count).is_err() {
        RenderError::TooManyIndices(descriptor.index_count)
    } else if descriptor.index_count != descriptor.indices.len() {
        RenderError::IndexCount {
            declared: descriptor.index_count,
            supplied: descriptor.indices.len(),
        }
    } else if let Some(&index) = descriptor
        .indices
        .iter()
        .find(|&&index| index as usize >= vertex_count)
    {
        RenderError::IndexOutOfRange {
            index,
            vertex_count,
        }
    } else {
        return Ok(());
    };

    log::error!("Mesh {}: {error}", descriptor.name);
    Err(error)
}
