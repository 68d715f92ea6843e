use std::time::Instant;

use crate::{context::RenderContext, mesh::Drawable, viewport::Viewport};

/// Per-frame state that isn't owned by any mesh.
#[derive(Debug, Clone)]
pub struct Renderer {
    pub clear_color: [f32; 4],
    pub wireframe: bool,
    pub viewport: Viewport,
}

impl Renderer {
    pub fn new(clear_color: [f32; 4], wireframe: bool, width: u32, height: u32) -> Self {
        Self {
            clear_color,
            wireframe,
            viewport: Viewport::from_size(width, height),
        }
    }

    /// Declares the initial viewport. Call once the context is current.
    pub fn init<C: RenderContext>(&self, context: &C) {
        self.viewport.apply(context);
    }

    /// Framebuffer size callback: the viewport follows the window.
    pub fn resize<C: RenderContext>(&mut self, context: &C, width: u32, height: u32) {
        log::debug!("Resizing viewport to {width}x{height}");
        self.viewport = Viewport::from_size(width, height);
        self.viewport.apply(context);
    }

    pub fn begin_frame<C: RenderContext>(&self, context: &C) {
        let mode = if self.wireframe { glow::LINE } else { glow::FILL };
        context.polygon_mode(glow::FRONT_AND_BACK, mode);

        let [r, g, b, a] = self.clear_color;
        context.clear_color(r, g, b, a);
        context.clear(glow::COLOR_BUFFER_BIT);
    }

    pub fn render<C: RenderContext>(&self, context: &C, drawables: &[&dyn Drawable]) {
        self.begin_frame(context);
        for drawable in drawables {
            log::trace!("Drawing {}", drawable.name());
            drawable.draw();
        }
    }
}

/// Time between consecutive frames.
pub struct FrameTimer {
    last_frame: Instant,
    delta_time: f64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
        }
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;

    use super::*;
    use crate::mesh::{Mesh, MeshDescriptor};
    use crate::testing::{Call, RecordingContext};

    struct Recorder<'a> {
        name: &'static str,
        log: &'a RefCell<Vec<&'static str>>,
    }

    impl Drawable for Recorder<'_> {
        fn name(&self) -> &str {
            self.name
        }

        fn draw(&self) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn frame_starts_with_polygon_mode_and_clear() {
        let context = RecordingContext::new();
        let renderer = Renderer::new([0.2, 0.3, 0.3, 1.0], false, 800, 600);

        renderer.render(&context, &[]);

        assert_eq!(
            context.calls(),
            vec![
                Call::PolygonMode(glow::FRONT_AND_BACK, glow::FILL),
                Call::ClearColor([0.2, 0.3, 0.3, 1.0]),
                Call::Clear(glow::COLOR_BUFFER_BIT),
            ]
        );
    }

    #[test]
    fn wireframe_switches_polygon_mode() {
        let context = RecordingContext::new();
        Renderer::new([0.0; 4], true, 1, 1).begin_frame(&context);

        assert_eq!(
            context.calls().first(),
            Some(&Call::PolygonMode(glow::FRONT_AND_BACK, glow::LINE))
        );
    }

    #[test]
    fn drawables_are_drawn_in_order() {
        let context = RecordingContext::new();
        let log = RefCell::new(Vec::new());
        let first = Recorder { name: "first", log: &log };
        let second = Recorder { name: "second", log: &log };

        Renderer::new([0.0; 4], false, 1, 1).render(&context, &[&first, &second]);

        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn resize_redeclares_the_viewport() {
        let context = RecordingContext::new();
        let mut renderer = Renderer::new([0.0; 4], false, 800, 600);

        renderer.init(&context);
        renderer.resize(&context, 1280, 720);

        assert_eq!(renderer.viewport, Viewport::new(0, 0, 1280, 720));
        assert_eq!(
            context.calls(),
            vec![Call::Viewport(0, 0, 800, 600), Call::Viewport(0, 0, 1280, 720)]
        );
    }

    #[test]
    fn a_frame_with_one_mesh_issues_one_draw() {
        let context = Arc::new(RecordingContext::new());
        let mesh = Mesh::new(
            context.clone(),
            MeshDescriptor::new("Triangle", vec![0.0; 9], vec![0, 1, 2]),
        )
        .unwrap();
        context.clear_calls();

        Renderer::new([0.0; 4], false, 1, 1).render(&*context, &[&mesh]);

        assert_eq!(
            context.count(|c| matches!(c, Call::DrawElements { count: 3, .. })),
            1
        );
    }

    #[test]
    fn timer_measures_time_between_updates() {
        let mut timer = FrameTimer::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer.update();

        assert!(timer.delta_time() >= 0.005);
    }
}
