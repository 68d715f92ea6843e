use crate::context::RenderContext;

/// The visible drawing rectangle, in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Whole-window viewport anchored at the lower left corner.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn apply<C: RenderContext>(&self, context: &C) {
        context.viewport(self.x, self.y, self.width, self.height);
    }
}
