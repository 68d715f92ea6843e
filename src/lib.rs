//! Shader programs, indexed meshes and textures drawn through a
//! [`RenderContext`](context::RenderContext).

pub mod config;
pub mod controls;
pub mod context;
pub mod error;
pub mod mesh;
pub mod opengl;
pub mod renderer;
pub mod shaders;
pub mod textures;
pub mod viewport;

#[cfg(test)]
mod testing;
