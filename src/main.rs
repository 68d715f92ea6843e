use std::num::NonZeroU32;
use std::process::ExitCode;
use std::sync::Arc;

use glutin::config::ConfigTemplateBuilder;
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::raw_window_handle::{HandleError, HasDisplayHandle, HasWindowHandle};
use winit::window::{Window, WindowId};

use gl_renderer::config::{ConfigError, RendererConfig};
use gl_renderer::controls;
use gl_renderer::error::RenderError;
use gl_renderer::mesh::{Mesh, MeshDescriptor};
use gl_renderer::opengl::VertexFormat;
use gl_renderer::renderer::{FrameTimer, Renderer};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("could not create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("window handle unavailable: {0}")]
    Handle(#[from] HandleError),
    #[error("OpenGL setup failed: {0}")]
    Gl(#[from] glutin::error::Error),
    #[error("no OpenGL config matches this window")]
    NoGlConfig,
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[rustfmt::skip]
const QUAD_VERTICES: [f32; 32] = [
    // positions        colors           texture coords
     0.5,  0.5, 0.0,    1.0, 0.0, 0.0,   1.0, 1.0, // top right
     0.5, -0.5, 0.0,    0.0, 1.0, 0.0,   1.0, 0.0, // bottom right
    -0.5, -0.5, 0.0,    0.0, 0.0, 1.0,   0.0, 0.0, // bottom left
    -0.5,  0.5, 0.0,    1.0, 1.0, 0.0,   0.0, 1.0, // top left
];

const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Everything that only exists while a GL context does. Field order is drop
/// order: the mesh releases its GL objects before the context goes away.
struct GlState {
    mesh: Mesh<glow::Context>,
    renderer: Renderer,
    timer: FrameTimer,
    gl: Arc<glow::Context>,
    surface: Surface<WindowSurface>,
    current_context: PossiblyCurrentContext,
    window: Window,
}

struct App {
    config: RendererConfig,
    state: Option<GlState>,
    failed: bool,
}

impl App {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            state: None,
            failed: false,
        }
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<GlState, AppError> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = event_loop.create_window(attributes)?;

        let raw_display = window.display_handle()?.as_raw();
        let raw_window = window.window_handle()?.as_raw();

        #[cfg(target_os = "windows")]
        let preference = DisplayApiPreference::Wgl(Some(raw_window));
        #[cfg(target_os = "macos")]
        let preference = DisplayApiPreference::Cgl;
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let preference = DisplayApiPreference::Egl;

        let display = unsafe { Display::new(raw_display, preference)? };

        let template = ConfigTemplateBuilder::new()
            .compatible_with_native_window(raw_window)
            .build();
        let gl_config = unsafe { display.find_configs(template)? }
            .reduce(|best, candidate| {
                if candidate.num_samples() > best.num_samples() {
                    candidate
                } else {
                    best
                }
            })
            .ok_or(AppError::NoGlConfig)?;

        let size = window.inner_size();
        let width = NonZeroU32::new(size.width).unwrap_or(NonZeroU32::MIN);
        let height = NonZeroU32::new(size.height).unwrap_or(NonZeroU32::MIN);

        let surface_attributes =
            SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window, width, height);
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes)? };

        // OpenGL 3.3 core, the oldest profile with vertex array objects.
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_window));
        let non_current_context = unsafe { display.create_context(&gl_config, &context_attributes)? };
        let current_context = non_current_context.make_current(&surface)?;

        let gl = Arc::new(unsafe {
            glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s))
        });

        let renderer = Renderer::new(
            self.config.clear_color,
            self.config.wireframe,
            size.width,
            size.height,
        );
        renderer.init(&*gl);

        let mut descriptor =
            MeshDescriptor::new("Quad", QUAD_VERTICES.to_vec(), QUAD_INDICES.to_vec())
                .format(VertexFormat::PositionColorUv)
                .shader(self.config.shader.clone())
                .pulse_uniform("pulseColor");
        if let Some(texture) = &self.config.texture {
            descriptor = descriptor.texture(texture);
        }
        let mesh = Mesh::new(gl.clone(), descriptor)?;

        Ok(GlState {
            mesh,
            renderer,
            timer: FrameTimer::new(),
            gl,
            surface,
            current_context,
            window,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.init(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                match e {
                    // Already logged with full detail where it happened.
                    AppError::Render(_) => log::error!("Start-up aborted while building the scene"),
                    e => log::error!("Start-up failed: {e}"),
                }
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested; stopping");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if logical_key == Key::Named(NamedKey::Escape) {
                    log::info!("Escape pressed; stopping");
                    event_loop.exit();
                } else if controls::apply_key(&mut state.mesh, logical_key.as_ref()) {
                    log::debug!("Quad origin now at {:?}", state.mesh.origin());
                }
            }
            WindowEvent::Resized(size) => {
                if let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                {
                    state
                        .surface
                        .resize(&state.current_context, width, height);
                    state
                        .renderer
                        .resize(&*state.gl, size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                state.renderer.render(&*state.gl, &[&state.mesh]);
                state.timer.update();
                log::trace!("Frame time {:.4}s", state.timer.delta_time());

                if let Err(e) = state.surface.swap_buffers(&state.current_context) {
                    log::error!("Failed to swap buffers: {e}");
                    self.failed = true;
                    event_loop.exit();
                    return;
                }

                state.window.request_redraw();
            }
            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release GL objects while the context is still current.
        self.state = None;
    }
}

fn main() -> ExitCode {
    let config = match RendererConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
        return ExitCode::FAILURE;
    }

    if app.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
