//! Desktop host: one winit window driving a [`SceneController`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::backend::RenderError;
use crate::config::SceneConfig;
use crate::container::Container;
use crate::controller::SceneController;
use crate::input::{mouse_button_from_winit, PointerEvent};
use crate::render::WgpuBackend;

/// A window seen as a container: logical inner size and its scale factor.
#[derive(Debug, Clone)]
pub struct WindowContainer {
    window: Arc<Window>,
}

impl WindowContainer {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl Container for WindowContainer {
    fn size(&self) -> (u32, u32) {
        let size: LogicalSize<f64> = self.window.inner_size().to_logical(self.window.scale_factor());
        (size.width.round() as u32, size.height.round() as u32)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }
}

/// Raised when no window can be opened, e.g. without a display server.
#[derive(Debug)]
pub struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

/// Opens a window of `size` logical pixels and runs until it is closed.
pub fn run(config: SceneConfig, size: (u32, u32)) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = HoverPlaneApp::new(config, size);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct HoverPlaneApp {
    config: SceneConfig,
    initial_size: (u32, u32),
    window: Option<Arc<Window>>,
    controller: Option<SceneController<WindowContainer, WgpuBackend>>,
    cursor: Vec2,
    last_frame: Option<Instant>,
    last_error: Option<anyhow::Error>,
}

impl HoverPlaneApp {
    fn new(config: SceneConfig, initial_size: (u32, u32)) -> Self {
        Self {
            config,
            initial_size,
            window: None,
            controller: None,
            cursor: Vec2::ZERO,
            last_frame: None,
            last_error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = self.initial_size;
        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title("Hover Plane")
                    .with_inner_size(LogicalSize::new(width, height)),
            )
            .map_err(|err| WindowInitError::from_error("window", err))?;
        let window = Arc::new(window);

        let container = WindowContainer::new(Arc::clone(&window));
        let (width, height) = container.size();
        let backend = pollster::block_on(WgpuBackend::new(Arc::clone(&window), width, height))?;
        let controller = SceneController::new(container, backend, self.config.clone())
            .map_err(|err| anyhow!("failed to start scene controller: {err}"))?;

        window.request_redraw();
        self.window = Some(window);
        self.controller = Some(controller);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(controller) = self.controller.as_mut() else {
            return Ok(());
        };
        let now = Instant::now();
        let delta = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);

        match controller.update(delta) {
            Ok(()) => Ok(()),
            Err(RenderError::SurfaceLost | RenderError::SurfaceOutdated) => {
                controller.backend_mut().reconfigure();
                Ok(())
            }
            Err(RenderError::Timeout) => {
                info!("surface timeout; retrying next frame");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn pointer(&self, position: PhysicalPosition<f64>) -> Vec2 {
        let scale = self
            .window
            .as_ref()
            .map(|window| window.scale_factor())
            .unwrap_or(1.0);
        let logical = position.to_logical::<f64>(scale);
        Vec2::new(logical.x as f32, logical.y as f32)
    }
}

impl ApplicationHandler for HoverPlaneApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|window| window.id()) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. }
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(controller) = self.controller.as_mut() {
                    controller.on_resize();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = self.pointer(position);
                if let Some(controller) = self.controller.as_mut() {
                    controller.on_mouse_move(PointerEvent::moved(self.cursor.x, self.cursor.y));
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let event =
                    PointerEvent::button(self.cursor.x, self.cursor.y, mouse_button_from_winit(button));
                if let Some(controller) = self.controller.as_mut() {
                    match state {
                        ElementState::Pressed => controller.on_mouse_down(event),
                        ElementState::Released => controller.on_mouse_up(event),
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(controller) = self.controller.as_mut() {
            let report = controller.destroy();
            info!(
                "released {} geometries and {} textures",
                report.geometries, report.textures
            );
        }
    }
}
