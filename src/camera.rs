use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Perspective camera with a cached projection matrix.
///
/// Changing `fov`, `aspect`, `near` or `far` has no effect on
/// [`projection`](Self::projection) until
/// [`update_projection_matrix`](Self::update_projection_matrix) runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    position: Vec3,
    target: Vec3,
    up: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self::new(config.fov, aspect, config.near, config.far);
        camera.set_position(config.position);
        camera.look_at(config.target);
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        );
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.target - self.position;
        let target = if forward.length_squared() > f32::EPSILON {
            self.target
        } else {
            self.position + Vec3::NEG_Z
        };
        Mat4::look_at_rh(self.position, target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Maps a point in normalized device coordinates back into world space.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_projection().inverse().project_point3(ndc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_updates_only_on_request() {
        let mut camera = PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 1000.0);
        let before = camera.projection();
        camera.set_aspect(1024.0 / 768.0);
        assert_eq!(camera.projection(), before);
        camera.set_aspect(2.0);
        camera.update_projection_matrix();
        assert_ne!(camera.projection(), before);
        let expected = Mat4::perspective_rh(75f32.to_radians(), 2.0, 0.1, 1000.0);
        assert_eq!(camera.projection(), expected);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 4.0 / 3.0);
        let clip = camera.view_projection().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
    }

    #[test]
    fn unproject_inverts_projection() {
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 1.5);
        let world = Vec3::new(1.0, -2.0, 0.5);
        let ndc = camera.view_projection().project_point3(world);
        let back = camera.unproject(ndc);
        assert!((back - world).length() < 1e-3);
    }
}
