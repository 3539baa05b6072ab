//! Hover-distortion logo plane rendered with wgpu.
//!
//! [`SceneController`] owns a small scene (one subdivided plane with a
//! shader material), a perspective camera and a render backend. Hosts feed
//! it pointer, resize and frame events; pointer hits on the plane ease the
//! `hover_state` uniform toward one, misses ease it back to zero.
//!
//! Rendering goes through the [`RenderBackend`] trait so the controller can
//! run headless against [`RecordingBackend`]; [`render::WgpuBackend`] is the
//! GPU implementation used by the desktop [`app`] and the browser entry point.

#[cfg(not(target_arch = "wasm32"))]
pub mod app;
pub mod backend;
pub mod camera;
pub mod config;
pub mod container;
pub mod controller;
pub mod geometry;
pub mod input;
pub mod material;
pub mod picking;
pub mod render;
pub mod scene;
pub mod texture;
pub mod tween;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use backend::{BackendCall, RecordingBackend, RenderBackend, RenderError};
pub use camera::PerspectiveCamera;
pub use config::{ConfigError, SceneConfig};
pub use container::{Container, FixedContainer};
pub use controller::SceneController;
pub use geometry::PlaneGeometry;
pub use input::{MouseButton, PointerEvent};
pub use material::{
    MaterialProperty, ShaderMaterial, Side, DISPLACEMENT, HOVER_STATE, LOGO_PRIMARY,
    LOGO_SECONDARY,
};
pub use picking::{Intersection, Ray, Raycaster};
pub use scene::{DisposeReport, GeometryId, Node, NodeId, Scene};
pub use texture::{Texture, TextureError, TextureId, TextureLoader, TextureState};
pub use tween::{Ease, Tween, TweenedScalar};
