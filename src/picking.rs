//! Pointer picking by ray casting.
//!
//! A [`Raycaster`] turns a pointer position in normalized device coordinates
//! into a world-space [`Ray`] leaving the camera, then tests it against mesh
//! triangles. Each mesh is first rejected by its bounding box, and triangles
//! facing away from the ray are skipped for front-sided materials.

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::geometry::Aabb;
use crate::material::Side;
use crate::scene::{NodeId, Scene};

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Slab test; returns the entry distance, or the exit distance when the
    /// origin is inside the box.
    pub fn intersect_aabb(&self, bounds: &Aabb) -> Option<f32> {
        let inv = self.direction.recip();
        let t0 = (bounds.min - self.origin) * inv;
        let t1 = (bounds.max - self.origin) * inv;
        let near = t0.min(t1);
        let far = t0.max(t1);
        // NaN from 0 * inf on flat boxes is dropped by max_element/min_element.
        let t_near = near.max_element();
        let t_far = far.min_element();
        if t_near <= t_far + 1e-6 && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Möller–Trumbore ray/triangle test. With `cull_back` set, triangles
    /// wound clockwise as seen from the ray origin are ignored; with
    /// `cull_front` set, counter-clockwise ones are.
    pub fn intersect_triangle(
        &self,
        [a, b, c]: [Vec3; 3],
        cull_back: bool,
        cull_front: bool,
    ) -> Option<f32> {
        const EPSILON: f32 = 1e-7;
        // Keeps rays through shared edges from slipping between neighbours.
        const EDGE_TOLERANCE: f32 = 1e-6;
        let edge1 = b - a;
        let edge2 = c - a;
        let normal = edge1.cross(edge2);
        let facing = -self.direction.dot(normal);
        if (facing > 0.0 && cull_front) || (facing < 0.0 && cull_back) {
            return None;
        }

        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(-EDGE_TOLERANCE..=1.0 + EDGE_TOLERANCE).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < -EDGE_TOLERANCE || u + v > 1.0 + EDGE_TOLERANCE {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

/// A ray hit against a scene mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raycaster {
    pub ray: Ray,
    pub near: f32,
    pub far: f32,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Raycaster {
    pub fn new() -> Self {
        Self {
            ray: Ray::new(Vec3::ZERO, Vec3::NEG_Z),
            near: 0.0,
            far: f32::INFINITY,
        }
    }

    /// Aims the ray from the camera through `ndc` (x, y in [-1, 1]).
    pub fn set_from_camera(&mut self, ndc: Vec2, camera: &PerspectiveCamera) {
        let origin = camera.position();
        let through = camera.unproject(ndc.extend(0.5));
        self.ray = Ray::new(origin, through - origin);
    }

    /// Tests the ray against the given mesh nodes. Hits come back nearest
    /// first; nodes that are missing or not meshes are skipped.
    pub fn intersect_objects(&self, scene: &Scene, nodes: &[NodeId]) -> Vec<Intersection> {
        let mut hits = Vec::new();
        for &node in nodes {
            if let Some(hit) = self.intersect_mesh(scene, node) {
                hits.push(hit);
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn intersect_mesh(&self, scene: &Scene, node: NodeId) -> Option<Intersection> {
        let mesh = scene.mesh(node)?;
        let world = scene.world_matrix(node);
        let bounds = mesh.geometry.bounding_box().transformed(world);
        self.ray.intersect_aabb(&bounds)?;

        let (cull_back, cull_front) = match mesh.material.side {
            Side::Front => (true, false),
            Side::Back => (false, true),
            Side::Double => (false, false),
        };
        mesh.geometry
            .triangles()
            .map(|tri| tri.map(|corner| world.transform_point3(corner)))
            .filter_map(|tri| self.ray.intersect_triangle(tri, cull_back, cull_front))
            .filter(|distance| *distance >= self.near && *distance <= self.far)
            .min_by(|a, b| a.total_cmp(b))
            .map(|distance| Intersection {
                node,
                distance,
                point: self.ray.point_at(distance),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::geometry::PlaneGeometry;
    use crate::material::ShaderMaterial;
    use crate::scene::Node;

    fn plane_scene(side: Side) -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let mut material = ShaderMaterial::new("vs", "fs");
        material.side = side;
        let mesh = scene.create_mesh(PlaneGeometry::new(8.0, 8.0, 100, 1), material);
        let id = scene.add(Node::mesh("plane", mesh));
        (scene, id)
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::from_config(&CameraConfig::default(), 800.0 / 600.0)
    }

    #[test]
    fn center_of_screen_hits_plane() {
        let (scene, plane) = plane_scene(Side::Front);
        let mut raycaster = Raycaster::new();
        raycaster.set_from_camera(Vec2::ZERO, &camera());
        let hits = raycaster.intersect_objects(&scene, &[plane]);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 12.0).abs() < 1e-3);
        assert!(hits[0].point.length() < 1e-3);
    }

    #[test]
    fn screen_corner_misses_plane() {
        let (scene, plane) = plane_scene(Side::Front);
        let mut raycaster = Raycaster::new();
        raycaster.set_from_camera(Vec2::new(-1.0, 1.0), &camera());
        assert!(raycaster.intersect_objects(&scene, &[plane]).is_empty());
    }

    #[test]
    fn back_faces_are_culled_for_front_sided_material() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let (scene, plane) = plane_scene(Side::Front);
        let raycaster = Raycaster { ray, ..Raycaster::new() };
        assert!(raycaster.intersect_objects(&scene, &[plane]).is_empty());

        let (scene, plane) = plane_scene(Side::Double);
        assert_eq!(raycaster.intersect_objects(&scene, &[plane]).len(), 1);

        let (scene, plane) = plane_scene(Side::Back);
        assert_eq!(raycaster.intersect_objects(&scene, &[plane]).len(), 1);
    }

    #[test]
    fn hits_follow_node_transform() {
        let (mut scene, plane) = plane_scene(Side::Front);
        scene.node_mut(plane).unwrap().transform.position = Vec3::new(20.0, 0.0, 0.0);
        let mut raycaster = Raycaster::new();
        raycaster.set_from_camera(Vec2::ZERO, &camera());
        assert!(raycaster.intersect_objects(&scene, &[plane]).is_empty());
    }

    #[test]
    fn hits_are_sorted_and_non_meshes_skipped() {
        let mut scene = Scene::new();
        let near_mesh = scene.create_mesh(
            PlaneGeometry::new(2.0, 2.0, 1, 1),
            ShaderMaterial::new("vs", "fs"),
        );
        let far_mesh = scene.create_mesh(
            PlaneGeometry::new(2.0, 2.0, 1, 1),
            ShaderMaterial::new("vs", "fs"),
        );
        let far = scene.add(Node::mesh("far", far_mesh));
        let near = scene.add(Node::mesh("near", near_mesh));
        scene.node_mut(near).unwrap().transform.position = Vec3::new(0.0, 0.0, 3.0);
        let group = scene.add(Node::group("group"));

        let raycaster = Raycaster {
            ray: Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z),
            ..Raycaster::new()
        };
        let hits = raycaster.intersect_objects(&scene, &[far, group, near]);
        let order: Vec<_> = hits.iter().map(|hit| hit.node).collect();
        assert_eq!(order, vec![near, far]);
        assert!((hits[0].distance - 7.0).abs() < 1e-5);
    }

    #[test]
    fn ray_hits_flat_box() {
        let bounds = Aabb::from_points([Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)]);
        let ray = Ray::new(Vec3::new(0.5, 0.5, 4.0), Vec3::NEG_Z);
        assert_eq!(ray.intersect_aabb(&bounds), Some(4.0));
        let miss = Ray::new(Vec3::new(1.5, 0.0, 4.0), Vec3::NEG_Z);
        assert_eq!(miss.intersect_aabb(&bounds), None);
    }
}
