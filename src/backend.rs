use thiserror::Error;

use crate::camera::PerspectiveCamera;
use crate::material::HOVER_STATE;
use crate::scene::{GeometryId, Scene};
use crate::texture::{Texture, TextureId};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render surface was lost")]
    SurfaceLost,
    #[error("render surface is outdated")]
    SurfaceOutdated,
    #[error("timed out acquiring the next frame")]
    Timeout,
    #[error("GPU is out of memory")]
    OutOfMemory,
    #[error("unable to attach render surface: {0}")]
    Mount(String),
}

/// What a controller needs from a renderer. The real implementation is
/// [`WgpuBackend`](crate::render::WgpuBackend); [`RecordingBackend`] stands in
/// for it headless and in tests.
pub trait RenderBackend {
    /// Attaches the output surface to its container.
    fn mount(&mut self) -> Result<(), RenderError>;

    /// Sets the output size in logical pixels.
    fn set_size(&mut self, width: u32, height: u32);

    /// Sets the physical/logical pixel ratio of the output surface.
    fn set_pixel_ratio(&mut self, ratio: f64);

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Frees whatever the backend holds for a geometry.
    fn dispose_geometry(&mut self, geometry: GeometryId);

    /// Frees whatever the backend holds for a texture.
    fn dispose_texture(&mut self, texture: &Texture);
}

/// A call observed by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Mount,
    SetSize(u32, u32),
    SetPixelRatio(f64),
    Render {
        meshes: usize,
        hover_state: Option<f32>,
        aspect: f32,
    },
    DisposeGeometry(GeometryId),
    DisposeTexture(TextureId),
}

/// Backend that draws nothing and remembers every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    size: (u32, u32),
    pixel_ratio: f64,
    mounted: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Size of the backing surface in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        physical_size(self.size, self.pixel_ratio)
    }

    pub fn render_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Render { .. }))
            .count()
    }
}

impl RenderBackend for RecordingBackend {
    fn mount(&mut self) -> Result<(), RenderError> {
        self.mounted = true;
        self.calls.push(BackendCall::Mount);
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.calls.push(BackendCall::SetSize(width, height));
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.calls.push(BackendCall::SetPixelRatio(ratio));
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let meshes: Vec<_> = scene.meshes().collect();
        let hover_state = meshes
            .first()
            .and_then(|(_, mesh, _)| mesh.material.float(HOVER_STATE));
        self.calls.push(BackendCall::Render {
            meshes: meshes.len(),
            hover_state,
            aspect: camera.aspect,
        });
        Ok(())
    }

    fn dispose_geometry(&mut self, geometry: GeometryId) {
        self.calls.push(BackendCall::DisposeGeometry(geometry));
    }

    fn dispose_texture(&mut self, texture: &Texture) {
        self.calls.push(BackendCall::DisposeTexture(texture.id()));
    }
}

/// Logical size scaled by the pixel ratio, never below one pixel.
pub fn physical_size(logical: (u32, u32), pixel_ratio: f64) -> (u32, u32) {
    let scale = |value: u32| ((value as f64 * pixel_ratio).floor() as u32).max(1);
    (scale(logical.0), scale(logical.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_buffer_follows_pixel_ratio() {
        let mut backend = RecordingBackend::new();
        backend.set_size(1024, 768);
        assert_eq!(backend.drawing_buffer_size(), (1024, 768));
        backend.set_pixel_ratio(2.0);
        assert_eq!(backend.drawing_buffer_size(), (2048, 1536));
        assert_eq!(
            backend.calls(),
            &[BackendCall::SetSize(1024, 768), BackendCall::SetPixelRatio(2.0)]
        );
    }

    #[test]
    fn physical_size_never_collapses_to_zero() {
        assert_eq!(physical_size((0, 0), 2.0), (1, 1));
        assert_eq!(physical_size((801, 601), 1.5), (1201, 901));
    }

    #[test]
    fn render_reports_empty_scene() {
        let mut backend = RecordingBackend::new();
        let scene = Scene::new();
        let camera = PerspectiveCamera::new(75.0, 2.0, 0.1, 1000.0);
        backend.render(&scene, &camera).unwrap();
        assert_eq!(
            backend.calls(),
            &[BackendCall::Render {
                meshes: 0,
                hover_state: None,
                aspect: 2.0
            }]
        );
        assert_eq!(backend.render_count(), 1);
    }
}
