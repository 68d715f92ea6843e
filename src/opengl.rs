use std::sync::Arc;

use crate::context::RenderContext;
use crate::error::{RenderError, Result};

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// One vertex attribute inside an interleaved vertex record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub index: u32,
    pub size: i32,
    pub gl_type: u32,
    pub normalized: bool,
    pub offset: usize,
}

impl Layout {
    pub fn new(index: u32, size: i32, gl_type: u32, normalized: bool, offset: usize) -> Self {
        Self {
            index,
            size,
            gl_type,
            normalized,
            offset,
        }
    }
}

/// What a vertex record holds. Position is always slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    /// x, y, z
    Position,
    /// x, y, z, r, g, b, u, v
    PositionColorUv,
}

impl VertexFormat {
    pub fn components(self) -> &'static [usize] {
        match self {
            VertexFormat::Position => &[3],
            VertexFormat::PositionColorUv => &[3, 3, 2],
        }
    }

    pub fn floats_per_vertex(self) -> usize {
        self.components().iter().sum()
    }

    pub fn layout(self) -> VertexLayout {
        VertexLayout::interleaved(self.components())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub layouts: Vec<Layout>,
    pub stride: i32,
}

impl VertexLayout {
    /// Float attributes packed back to back: attribute `i` sits in slot `i`
    /// at the byte offset of everything before it.
    pub fn interleaved(components: &[usize]) -> Self {
        let mut layouts = Vec::with_capacity(components.len());
        let mut offset = 0;

        for (index, &size) in components.iter().enumerate() {
            layouts.push(Layout::new(
                index as u32,
                size as i32,
                glow::FLOAT,
                false,
                offset,
            ));
            offset += size * FLOAT_SIZE;
        }

        Self {
            layouts,
            stride: offset as i32,
        }
    }

    pub fn apply<C: RenderContext>(&self, context: &C) {
        for layout in &self.layouts {
            context.vertex_attrib_pointer_f32(
                layout.index,
                layout.size,
                layout.gl_type,
                layout.normalized,
                self.stride,
                layout.offset as i32,
            );
            context.enable_vertex_attrib_array(layout.index);
        }
    }
}

/// Vertex array, vertex buffer and index buffer for one piece of static
/// geometry. All three are deleted on drop.
pub struct GpuBuffers<C: RenderContext> {
    context: Arc<C>,
    pub vao: C::VertexArray,
    pub vbo: C::Buffer,
    pub ebo: C::Buffer,
    pub layout: VertexLayout,
    pub vertex_count: usize,
}

impl<C: RenderContext> GpuBuffers<C> {
    pub fn new(
        context: Arc<C>,
        vertices: &[f32],
        indices: &[u32],
        format: VertexFormat,
    ) -> Result<Self> {
        let floats_per_vertex = format.floats_per_vertex();
        if vertices.len() % floats_per_vertex != 0 {
            return Err(RenderError::InvalidVertexData {
                len: vertices.len(),
                floats_per_vertex,
            });
        }

        let layout = format.layout();

        let vao = context
            .create_vertex_array()
            .map_err(|reason| RenderError::Allocation {
                object: "vertex array",
                reason,
            })?;
        let vbo = match context.create_buffer() {
            Ok(vbo) => vbo,
            Err(reason) => {
                context.delete_vertex_array(vao);
                return Err(RenderError::Allocation {
                    object: "vertex buffer",
                    reason,
                });
            }
        };
        let ebo = match context.create_buffer() {
            Ok(ebo) => ebo,
            Err(reason) => {
                context.delete_buffer(vbo);
                context.delete_vertex_array(vao);
                return Err(RenderError::Allocation {
                    object: "index buffer",
                    reason,
                });
            }
        };

        // The element buffer binding and the attribute pointers are recorded
        // into the VAO, so it has to be bound first.
        context.bind_vertex_array(Some(vao));

        context.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        context.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(vertices),
            glow::STATIC_DRAW,
        );

        context.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
        context.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(indices),
            glow::STATIC_DRAW,
        );

        layout.apply(&*context);

        Ok(Self {
            context,
            vao,
            vbo,
            ebo,
            layout,
            vertex_count: vertices.len() / floats_per_vertex,
        })
    }

    pub fn bind(&self) {
        self.context.bind_vertex_array(Some(self.vao));
    }
}

impl<C: RenderContext> Drop for GpuBuffers<C> {
    fn drop(&mut self) {
        log::trace!(
            "Deleting vertex array {:?} and buffers {:?}, {:?}",
            self.vao,
            self.vbo,
            self.ebo
        );
        self.context.delete_vertex_array(self.vao);
        self.context.delete_buffer(self.vbo);
        self.context.delete_buffer(self.ebo);
    }
}
