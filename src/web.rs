#![cfg(target_arch = "wasm32")]

//! Browser entry point: mounts a canvas into the page's container element
//! and forwards DOM events and animation frames to a [`SceneController`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent};

use crate::backend::{RenderBackend, RenderError};
use crate::camera::PerspectiveCamera;
use crate::config::SceneConfig;
use crate::container::{css_size, Container};
use crate::controller::SceneController;
use crate::input::{MouseButton, PointerEvent};
use crate::render::WgpuBackend;
use crate::scene::{GeometryId, Scene};
use crate::texture::{Texture, TextureError};

/// Element the canvas is mounted into when no selector is given.
pub const CONTAINER_SELECTOR: &str = ".threejs__canvas__container";

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Downloads `url` with the page's `fetch`.
pub(crate) async fn fetch_bytes(url: &str) -> Result<Vec<u8>, TextureError> {
    let failed = |message: String| TextureError::Http {
        url: url.to_string(),
        message,
    };
    let window = web_sys::window().ok_or_else(|| failed("window not available".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| failed(format!("{err:?}")))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| failed("fetch did not resolve to a Response".into()))?;
    if !response.ok() {
        return Err(failed(format!("HTTP {}", response.status())));
    }
    let body = response
        .array_buffer()
        .map_err(|err| failed(format!("{err:?}")))?;
    let buffer = JsFuture::from(body)
        .await
        .map_err(|err| failed(format!("{err:?}")))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// A DOM element seen as a container: CSS size and the page's pixel ratio.
#[derive(Debug, Clone)]
pub struct DomContainer {
    element: Element,
}

impl Container for DomContainer {
    /// Offset size, borders included. Non-HTML elements fall back to their
    /// client size.
    fn size(&self) -> (u32, u32) {
        let (width, height) = match self.element.dyn_ref::<HtmlElement>() {
            Some(html) => (html.offset_width(), html.offset_height()),
            None => (self.element.client_width(), self.element.client_height()),
        };
        css_size(width, height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window()
            .map(|window| window.device_pixel_ratio())
            .unwrap_or(1.0)
    }
}

/// [`WgpuBackend`] drawing into a canvas that `mount` appends to the
/// container element.
pub struct CanvasBackend {
    inner: WgpuBackend,
    canvas: HtmlCanvasElement,
    container: Element,
}

impl CanvasBackend {
    fn sync_canvas(&self) {
        let (width, height) = self.inner.surface_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }
}

impl RenderBackend for CanvasBackend {
    fn mount(&mut self) -> Result<(), RenderError> {
        self.container
            .append_child(&self.canvas)
            .map_err(|err| RenderError::Mount(format!("{err:?}")))?;
        self.inner.mount()
    }

    fn set_size(&mut self, width: u32, height: u32) {
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{width}px"));
        let _ = style.set_property("height", &format!("{height}px"));
        self.inner.set_size(width, height);
        self.sync_canvas();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.inner.set_pixel_ratio(ratio);
        self.sync_canvas();
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        self.inner.render(scene, camera)
    }

    fn dispose_geometry(&mut self, geometry: GeometryId) {
        self.inner.dispose_geometry(geometry);
    }

    fn dispose_texture(&mut self, texture: &Texture) {
        self.inner.dispose_texture(texture);
    }
}

type Listener = (EventTarget, &'static str, Closure<dyn FnMut(web_sys::Event)>);

struct WebState {
    controller: SceneController<DomContainer, CanvasBackend>,
    listeners: Vec<Listener>,
    last_timestamp: Option<f64>,
    running: bool,
}

impl WebState {
    fn frame(&mut self, timestamp: f64) {
        let delta = self
            .last_timestamp
            .map(|last| Duration::from_secs_f64(((timestamp - last) / 1000.0).max(0.0)))
            .unwrap_or_default();
        self.last_timestamp = Some(timestamp);
        match self.controller.update(delta) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost | RenderError::SurfaceOutdated) => {
                self.controller.on_resize();
            }
            Err(err) => log::error!("render failed: {err}"),
        }
    }
}

/// Handle returned to JavaScript.
#[wasm_bindgen]
pub struct HoverPlane {
    inner: Rc<RefCell<WebState>>,
}

#[wasm_bindgen]
impl HoverPlane {
    /// Mounts into the first element matching `selector`
    /// (default `.threejs__canvas__container`) and starts rendering.
    pub async fn create(selector: Option<String>) -> Result<HoverPlane, JsValue> {
        let selector = selector.unwrap_or_else(|| CONTAINER_SELECTOR.to_string());
        let state = create_state(&selector)
            .await
            .map_err(|err| JsValue::from_str(&format!("{err:#}")))?;
        let app = HoverPlane {
            inner: Rc::new(RefCell::new(state)),
        };
        attach_listeners(&app.inner).map_err(|err| JsValue::from_str(&format!("{err:#}")))?;
        start_animation_loop(Rc::clone(&app.inner))
            .map_err(|err| JsValue::from_str(&format!("{err:#}")))?;
        Ok(app)
    }

    #[wasm_bindgen(js_name = hoverState)]
    pub fn hover_state(&self) -> f32 {
        self.inner.borrow().controller.hover_state()
    }

    /// Stops the frame loop, removes listeners and releases GPU resources.
    /// The canvas stays in the page.
    pub fn destroy(&self) {
        let mut state = self.inner.borrow_mut();
        state.running = false;
        for (target, event, closure) in state.listeners.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
        state.controller.destroy();
    }
}

async fn create_state(selector: &str) -> Result<WebState> {
    let window = web_sys::window().ok_or_else(|| anyhow!("window not available"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow!("document not available"))?;
    let element = document
        .query_selector(selector)
        .map_err(|err| anyhow!("invalid selector {selector}: {err:?}"))?
        .ok_or_else(|| anyhow!("no element matches {selector}"))?;
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|err| anyhow!("unable to create canvas: {err:?}"))?
        .dyn_into()
        .map_err(|_| anyhow!("created element is not a canvas"))?;
    canvas.set_class_name("hover-plane__canvas");

    let container = DomContainer {
        element: element.clone(),
    };
    let (width, height) = container.size();
    let inner = WgpuBackend::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), width, height).await?;
    let backend = CanvasBackend {
        inner,
        canvas,
        container: element,
    };
    let controller = SceneController::new(container, backend, SceneConfig::default())
        .map_err(|err| anyhow!("failed to start scene controller: {err}"))?;

    Ok(WebState {
        controller,
        listeners: Vec::new(),
        last_timestamp: None,
        running: true,
    })
}

fn pointer_event(event: &web_sys::Event, with_button: bool) -> Option<PointerEvent> {
    let event = event.dyn_ref::<MouseEvent>()?;
    let (x, y) = (event.client_x() as f32, event.client_y() as f32);
    Some(if with_button {
        PointerEvent::button(x, y, MouseButton::new(event.button().max(0) as u8))
    } else {
        PointerEvent::moved(x, y)
    })
}

fn attach_listeners(app: &Rc<RefCell<WebState>>) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("window not available"))?;
    let target: EventTarget = window.into();

    let handlers: [(&'static str, fn(&mut WebState, &web_sys::Event)); 4] = [
        ("mousemove", |state, event| {
            if let Some(pointer) = pointer_event(event, false) {
                state.controller.on_mouse_move(pointer);
            }
        }),
        ("mousedown", |state, event| {
            if let Some(pointer) = pointer_event(event, true) {
                state.controller.on_mouse_down(pointer);
            }
        }),
        ("mouseup", |state, event| {
            if let Some(pointer) = pointer_event(event, true) {
                state.controller.on_mouse_up(pointer);
            }
        }),
        ("resize", |state, _| state.controller.on_resize()),
    ];

    let mut listeners = Vec::with_capacity(handlers.len());
    for (name, handler) in handlers {
        let app = Rc::clone(app);
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            if let Ok(mut state) = app.try_borrow_mut() {
                handler(&mut state, &event);
            }
        });
        target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("unable to listen for {name}: {err:?}"))?;
        listeners.push((target.clone(), name, closure));
    }
    app.borrow_mut().listeners = listeners;
    Ok(())
}

fn start_animation_loop(app: Rc<RefCell<WebState>>) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("window not available"))?;
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let handle = Rc::clone(&callback);
    let frame_window = window.clone();

    *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
        {
            let mut state = app.borrow_mut();
            if !state.running {
                drop(state);
                let _ = handle.borrow_mut().take();
                return;
            }
            state.frame(timestamp);
        }
        if let Some(next) = handle.borrow().as_ref() {
            if let Err(err) = frame_window.request_animation_frame(next.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {err:?}");
            }
        }
    }));

    let first = callback.borrow();
    let first = first
        .as_ref()
        .ok_or_else(|| anyhow!("animation callback missing"))?;
    window
        .request_animation_frame(first.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    Ok(())
}
