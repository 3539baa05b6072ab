use std::time::Duration;

use glam::Vec2;
use log::{debug, info, trace};

use crate::backend::{RenderBackend, RenderError};
use crate::camera::PerspectiveCamera;
use crate::config::SceneConfig;
use crate::container::{capped_pixel_ratio, Container};
use crate::geometry::PlaneGeometry;
use crate::input::{pointer_to_ndc, PointerEvent};
use crate::material::{
    MaterialProperty, ShaderMaterial, DISPLACEMENT, HOVER_STATE, LOGO_PRIMARY, LOGO_SECONDARY,
};
use crate::picking::Raycaster;
use crate::render::shader::{PLANE_FRAGMENT_SHADER, PLANE_VERTEX_SHADER};
use crate::scene::{DisposeReport, Node, NodeId, Scene};
use crate::texture::TextureLoader;
use crate::tween::TweenedScalar;

/// Owns the scene, camera and plane, and reacts to pointer, resize and frame
/// events forwarded by whoever hosts it.
pub struct SceneController<C: Container, B: RenderBackend> {
    container: C,
    backend: B,
    config: SceneConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    raycaster: Raycaster,
    pointer: Vec2,
    width: u32,
    height: u32,
    loader: TextureLoader,
    plane: Option<NodeId>,
    hover: TweenedScalar,
    destroyed: bool,
}

impl<C: Container, B: RenderBackend> SceneController<C, B> {
    pub fn new(container: C, backend: B, config: SceneConfig) -> Result<Self, RenderError> {
        Self::with_loader(container, backend, config, TextureLoader::new())
    }

    /// Like [`new`](Self::new) with a caller-supplied texture loader.
    pub fn with_loader(
        container: C,
        mut backend: B,
        config: SceneConfig,
        loader: TextureLoader,
    ) -> Result<Self, RenderError> {
        let (width, height) = clamp_size(container.size());
        let camera = PerspectiveCamera::from_config(&config.camera, width as f32 / height as f32);

        backend.set_size(width, height);
        backend.set_pixel_ratio(capped_pixel_ratio(
            container.device_pixel_ratio(),
            config.max_pixel_ratio,
        ));
        backend.mount()?;

        let hover = TweenedScalar::new(0.0, config.hover.transition(), config.hover.ease);

        let mut controller = Self {
            container,
            backend,
            config,
            scene: Scene::new(),
            camera,
            raycaster: Raycaster::new(),
            pointer: Vec2::ZERO,
            width,
            height,
            loader,
            plane: None,
            hover,
            destroyed: false,
        };
        controller.load_textures();
        info!("scene controller ready at {width}x{height}");
        Ok(controller)
    }

    /// Starts the three texture loads and puts the plane in the scene right
    /// away; textures fill in as their loads finish.
    pub fn load_textures(&mut self) {
        if self.destroyed || self.plane.is_some() {
            return;
        }
        let assets = &self.config.assets;
        let logo_primary = self.loader.load(&assets.logo_primary);
        let logo_secondary = self.loader.load(&assets.logo_secondary);
        let displacement = self.loader.load(&assets.displacement);

        let material = ShaderMaterial::new(PLANE_VERTEX_SHADER, PLANE_FRAGMENT_SHADER)
            .with_uniform(HOVER_STATE, MaterialProperty::Float(0.0))
            .with_uniform(LOGO_PRIMARY, MaterialProperty::Texture(Some(logo_primary)))
            .with_uniform(
                LOGO_SECONDARY,
                MaterialProperty::Texture(Some(logo_secondary)),
            )
            .with_uniform(DISPLACEMENT, MaterialProperty::Texture(Some(displacement)));
        let geometry = PlaneGeometry::from_config(&self.config.plane);
        let mesh = self.scene.create_mesh(geometry, material);
        self.plane = Some(self.scene.add(Node::mesh("plane", mesh)));
    }

    pub fn on_mouse_move(&mut self, event: PointerEvent) {
        let Some(plane) = self.plane else {
            return;
        };
        self.pointer = pointer_to_ndc(event.client, (self.width, self.height));
        self.raycaster.set_from_camera(self.pointer, &self.camera);

        let hit = !self
            .raycaster
            .intersect_objects(&self.scene, &[plane])
            .is_empty();
        let target = if hit { 1.0 } else { 0.0 };
        if self.hover.animate_to(target) {
            debug!("hover -> {target} at ndc ({:.3}, {:.3})", self.pointer.x, self.pointer.y);
        }
    }

    pub fn on_mouse_down(&mut self, event: PointerEvent) {
        trace!("mouse down ignored: {event:?}");
    }

    pub fn on_mouse_up(&mut self, event: PointerEvent) {
        trace!("mouse up ignored: {event:?}");
    }

    /// Advances the hover transition by `delta` and draws a frame.
    pub fn update(&mut self, delta: Duration) -> Result<(), RenderError> {
        if self.destroyed {
            return Ok(());
        }
        let hover = self.hover.advance(delta);
        if let Some(mesh) = self.plane.and_then(|plane| self.scene.mesh_mut(plane)) {
            mesh.material.set_float(HOVER_STATE, hover);
        }
        self.backend.render(&self.scene, &self.camera)
    }

    pub fn on_resize(&mut self) {
        let (width, height) = clamp_size(self.container.size());
        self.width = width;
        self.height = height;

        self.backend.set_size(width, height);
        self.backend.set_pixel_ratio(capped_pixel_ratio(
            self.container.device_pixel_ratio(),
            self.config.max_pixel_ratio,
        ));

        self.camera.set_aspect(width as f32 / height as f32);
        self.camera.update_projection_matrix();
        info!("resized to {width}x{height}");
    }

    /// Releases every geometry and texture in the scene and empties it.
    /// The render surface stays mounted. Later calls do nothing.
    pub fn destroy(&mut self) -> DisposeReport {
        if self.destroyed {
            return DisposeReport::default();
        }
        self.destroyed = true;
        self.hover.kill();
        self.plane = None;
        let report = self.scene.dispose_all(&mut self.backend);
        info!(
            "scene destroyed ({} geometries, {} textures)",
            report.geometries, report.textures
        );
        report
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn plane(&self) -> Option<NodeId> {
        self.plane
    }

    /// Current hover amount, in [0, 1].
    pub fn hover_state(&self) -> f32 {
        self.hover.value()
    }

    /// Hover amount the transition is heading toward.
    pub fn hover_target(&self) -> f32 {
        self.hover.target()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Waits for outstanding texture loads. Meant for headless runs.
    pub fn wait_for_textures(&mut self) {
        self.loader.join_pending();
    }
}

fn clamp_size((width, height): (u32, u32)) -> (u32, u32) {
    (width.max(1), height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::backend::{BackendCall, RecordingBackend};
    use crate::config::AssetConfig;
    use crate::container::FixedContainer;
    use crate::texture::tests::{png_bytes, MemoryFetcher};
    use crate::texture::TextureState;

    const FRAME: Duration = Duration::from_millis(16);

    fn test_config() -> SceneConfig {
        SceneConfig {
            assets: AssetConfig {
                logo_primary: "purple.png".into(),
                logo_secondary: "pink.png".into(),
                displacement: "https://example.invalid/disp.jpg".into(),
            },
            ..SceneConfig::default()
        }
    }

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::default()
            .with("purple.png", png_bytes(2, 2))
            .with("pink.png", png_bytes(2, 2))
    }

    fn controller(
        container: Arc<FixedContainer>,
    ) -> SceneController<Arc<FixedContainer>, RecordingBackend> {
        let loader = TextureLoader::with_fetcher(Arc::new(fetcher()));
        let mut controller =
            SceneController::with_loader(container, RecordingBackend::new(), test_config(), loader)
                .unwrap();
        controller.wait_for_textures();
        controller
    }

    fn settle(controller: &mut SceneController<Arc<FixedContainer>, RecordingBackend>) {
        for _ in 0..60 {
            controller.update(FRAME).unwrap();
        }
    }

    #[test]
    fn oversized_hover_duration_is_clamped_not_fatal() {
        let mut config = test_config();
        config.hover.duration = 1e20;
        let loader = TextureLoader::with_fetcher(Arc::new(fetcher()));
        let container = Arc::new(FixedContainer::new(800, 600));
        let mut controller =
            SceneController::with_loader(container, RecordingBackend::new(), config, loader)
                .unwrap();
        controller.wait_for_textures();
        controller.on_mouse_move(PointerEvent::moved(400.0, 300.0));
        controller.update(FRAME).unwrap();
        assert_eq!(controller.hover_target(), 1.0);
        assert!(controller.hover_state() < 0.01);
    }

    #[test]
    fn construction_sizes_mounts_and_adds_one_plane() {
        let container = Arc::new(FixedContainer::with_pixel_ratio(800, 600, 3.0));
        let controller = controller(Arc::clone(&container));

        let backend = controller.backend();
        assert_eq!(
            backend.calls(),
            &[
                BackendCall::SetSize(800, 600),
                BackendCall::SetPixelRatio(2.0),
                BackendCall::Mount,
            ]
        );
        assert!(backend.is_mounted());
        assert_eq!(backend.drawing_buffer_size(), (1600, 1200));

        let scene = controller.scene();
        assert_eq!(scene.children(scene.root()).len(), 1);
        assert_eq!(scene.meshes().count(), 1);
        assert_eq!(controller.camera().position(), glam::Vec3::new(0.0, 0.0, 12.0));
        assert_eq!(controller.camera().aspect, 800.0 / 600.0);
        assert_eq!(controller.hover_state(), 0.0);
    }

    #[test]
    fn plane_carries_four_uniforms_and_degrades_on_failed_load() {
        let controller = controller(Arc::new(FixedContainer::new(800, 600)));
        let mesh = controller.scene().mesh(controller.plane().unwrap()).unwrap();
        let material = &mesh.material;
        assert_eq!(material.float(HOVER_STATE), Some(0.0));
        assert!(material.texture(LOGO_PRIMARY).unwrap().image().is_some());
        assert!(material.texture(LOGO_SECONDARY).unwrap().image().is_some());
        let displacement = material.texture(DISPLACEMENT).unwrap();
        assert!(matches!(displacement.state(), TextureState::Failed(_)));
        assert_eq!(mesh.geometry.width_segments, 100);
        assert_eq!(mesh.geometry.height_segments, 1);
    }

    #[test]
    fn hovering_the_center_eases_to_one_and_corner_back_to_zero() {
        let mut controller = controller(Arc::new(FixedContainer::new(800, 600)));

        controller.on_mouse_move(PointerEvent::moved(400.0, 300.0));
        assert_eq!(controller.hover_target(), 1.0);
        controller.update(FRAME).unwrap();
        let first = controller.hover_state();
        assert!(first > 0.0 && first < 1.0);
        settle(&mut controller);
        assert_eq!(controller.hover_state(), 1.0);

        controller.on_mouse_move(PointerEvent::moved(0.0, 0.0));
        assert_eq!(controller.hover_target(), 0.0);
        settle(&mut controller);
        assert_eq!(controller.hover_state(), 0.0);
    }

    #[test]
    fn rendered_uniform_tracks_tween() {
        let mut controller = controller(Arc::new(FixedContainer::new(800, 600)));
        controller.on_mouse_move(PointerEvent::moved(400.0, 300.0));
        let mut last = 0.0;
        for _ in 0..40 {
            controller.update(FRAME).unwrap();
            let Some(BackendCall::Render {
                meshes,
                hover_state: Some(hover),
                ..
            }) = controller.backend().calls().last().cloned()
            else {
                panic!("expected a render call");
            };
            assert_eq!(meshes, 1);
            assert!(hover >= last, "hover must not jump backwards");
            assert!((0.0..=1.0).contains(&hover));
            last = hover;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn rapid_moves_redirect_in_flight_tween() {
        let mut controller = controller(Arc::new(FixedContainer::new(800, 600)));
        controller.on_mouse_move(PointerEvent::moved(400.0, 300.0));
        controller.update(Duration::from_millis(100)).unwrap();
        let mid = controller.hover_state();
        controller.on_mouse_move(PointerEvent::moved(5.0, 5.0));
        controller.update(FRAME).unwrap();
        assert!(controller.hover_state() < mid);
        assert_eq!(controller.hover_target(), 0.0);
    }

    #[test]
    fn mouse_buttons_have_no_effect() {
        let mut controller = controller(Arc::new(FixedContainer::new(800, 600)));
        let calls = controller.backend().calls().len();
        controller.on_mouse_down(PointerEvent::button(400.0, 300.0, crate::input::MouseButton::LEFT));
        controller.on_mouse_up(PointerEvent::button(400.0, 300.0, crate::input::MouseButton::LEFT));
        assert_eq!(controller.hover_target(), 0.0);
        assert_eq!(controller.backend().calls().len(), calls);
    }

    #[test]
    fn resize_updates_aspect_projection_and_surface() {
        let container = Arc::new(FixedContainer::new(800, 600));
        let mut controller = controller(Arc::clone(&container));
        let projection = controller.camera().projection();

        container.resize(1024, 768);
        controller.on_resize();

        assert_eq!(controller.camera().aspect, 1024.0 / 768.0);
        assert!((controller.camera().aspect - 1.333).abs() < 1e-3);
        assert_ne!(controller.camera().projection(), projection);
        assert_eq!(controller.backend().size(), (1024, 768));
        assert_eq!(controller.backend().drawing_buffer_size(), (1024, 768));

        container.set_device_pixel_ratio(2.5);
        controller.on_resize();
        assert_eq!(controller.backend().drawing_buffer_size(), (2048, 1536));
    }

    #[test]
    fn pointer_mapping_uses_resized_dimensions() {
        let container = Arc::new(FixedContainer::new(800, 600));
        let mut controller = controller(Arc::clone(&container));
        container.resize(1600, 1200);
        controller.on_resize();
        // Center of the new size; would be a corner-ish miss with stale 800x600.
        controller.on_mouse_move(PointerEvent::moved(800.0, 600.0));
        assert_eq!(controller.hover_target(), 1.0);
    }

    #[test]
    fn destroy_disposes_everything_once_and_empties_scene() {
        let mut controller = controller(Arc::new(FixedContainer::new(800, 600)));
        controller.on_mouse_move(PointerEvent::moved(400.0, 300.0));
        controller.backend_mut().clear();

        let report = controller.destroy();
        assert_eq!(report.geometries, 1);
        assert_eq!(report.textures, 3);
        assert!(controller.scene().is_empty());

        let calls = controller.backend().calls();
        assert!(matches!(calls[0], BackendCall::DisposeGeometry(_)));
        assert_eq!(
            calls
                .iter()
                .filter(|call| matches!(call, BackendCall::DisposeTexture(_)))
                .count(),
            3
        );

        assert_eq!(controller.destroy(), DisposeReport::default());
        let frozen = controller.hover_state();
        controller.update(Duration::from_secs(1)).unwrap();
        assert_eq!(controller.hover_state(), frozen);
        controller.on_mouse_move(PointerEvent::moved(400.0, 300.0));
        assert_eq!(controller.backend().calls().len(), 4);
        assert!(controller.backend().is_mounted());
    }

    #[test]
    fn controllers_on_distinct_containers_are_independent() {
        let first_container = Arc::new(FixedContainer::new(800, 600));
        let second_container = Arc::new(FixedContainer::new(400, 400));
        let mut first = controller(Arc::clone(&first_container));
        let mut second = controller(Arc::clone(&second_container));

        first.on_mouse_move(PointerEvent::moved(400.0, 300.0));
        settle(&mut first);
        second_container.resize(300, 100);
        second.on_resize();

        assert_eq!(first.hover_state(), 1.0);
        assert_eq!(second.hover_state(), 0.0);
        assert_eq!(first.camera().aspect, 800.0 / 600.0);
        assert_eq!(second.camera().aspect, 3.0);

        first.destroy();
        assert!(first.scene().is_empty());
        assert_eq!(second.scene().meshes().count(), 1);
    }
}
