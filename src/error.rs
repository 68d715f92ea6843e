use std::path::PathBuf;

use crate::shaders::ShaderStage;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("ERROR::SHADER::{stage}::COMPILATION_FAILED\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("ERROR::SHADER::PROGRAM::LINKING_FAILED\n{log}")]
    ShaderLink { log: String },

    #[error("failed to load texture {path:?}: {source}")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read shader file {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create {object}: {reason}")]
    Allocation { object: &'static str, reason: String },

    #[error("{len} floats is not a whole number of {floats_per_vertex}-float vertices")]
    InvalidVertexData { len: usize, floats_per_vertex: usize },

    #[error("index count {declared} does not match the {supplied} indices supplied")]
    IndexCount { declared: usize, supplied: usize },

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("{0} indices is more than a single draw call can take")]
    TooManyIndices(usize),

    #[error("{supplied} bytes is not a {width}x{height} RGBA image")]
    PixelData {
        width: u32,
        height: u32,
        supplied: usize,
    },

    #[error("{0} is not supported yet")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, RenderError>;
