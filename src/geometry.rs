use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::PlaneConfig;

/// Interleaved vertex layout shared with the plane shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Subdivided plane in the XY plane, centred on the origin, facing +Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;
        let half_width = width / 2.0;
        let half_height = height / 2.0;

        let mut vertices = Vec::with_capacity(((grid_x + 1) * (grid_y + 1)) as usize);
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - half_height;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - half_width;
                vertices.push(Vertex {
                    position: [x, -y, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
                });
            }
        }

        // Rows run top to bottom, so (a, b, d) and (b, c, d) wind counter-clockwise seen from +Z.
        let row = grid_x + 1;
        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            width,
            height,
            width_segments: grid_x,
            height_segments: grid_y,
            vertices,
            indices,
        }
    }

    pub fn from_config(config: &PlaneConfig) -> Self {
        Self::new(
            config.width,
            config.height,
            config.width_segments,
            config.height_segments,
        )
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Iterates triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                Vec3::from(self.vertices[tri[0] as usize].position),
                Vec3::from(self.vertices[tri[1] as usize].position),
                Vec3::from(self.vertices[tri[2] as usize].position),
            ]
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        };
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Self { min, max }
    }

    /// Bounds of the eight corners after `matrix` is applied.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point3(corner)
        });
        Self::from_points(corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_has_expected_vertex_and_index_counts() {
        let plane = PlaneGeometry::from_config(&PlaneConfig::default());
        assert_eq!(plane.vertices().len(), 101 * 2);
        assert_eq!(plane.indices().len(), 100 * 6);
        assert_eq!(plane.triangles().count(), 200);
    }

    #[test]
    fn plane_spans_its_size_centered_on_origin() {
        let plane = PlaneGeometry::new(8.0, 8.0, 100, 1);
        let bounds = plane.bounding_box();
        assert!((bounds.min - Vec3::new(-4.0, -4.0, 0.0)).length() < 1e-5);
        assert!((bounds.max - Vec3::new(4.0, 4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn uvs_run_left_to_right_bottom_to_top() {
        let plane = PlaneGeometry::new(2.0, 2.0, 1, 1);
        let top_left = plane.vertices()[0];
        assert_eq!(top_left.position, [-1.0, 1.0, 0.0]);
        assert_eq!(top_left.uv, [0.0, 1.0]);
        let bottom_right = plane.vertices()[3];
        assert_eq!(bottom_right.position, [1.0, -1.0, 0.0]);
        assert_eq!(bottom_right.uv, [1.0, 0.0]);
    }

    #[test]
    fn triangles_face_positive_z() {
        let plane = PlaneGeometry::new(2.0, 2.0, 3, 2);
        for [a, b, c] in plane.triangles() {
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }

    #[test]
    fn zero_segments_are_clamped() {
        let plane = PlaneGeometry::new(1.0, 1.0, 0, 0);
        assert_eq!(plane.width_segments, 1);
        assert_eq!(plane.indices().len(), 6);
    }

    #[test]
    fn transformed_box_follows_translation() {
        let bounds = Aabb::from_points([Vec3::splat(-1.0), Vec3::splat(1.0)]);
        let moved = bounds.transformed(Mat4::from_translation(Vec3::X * 3.0));
        assert_eq!(moved.min, Vec3::new(2.0, -1.0, -1.0));
        assert_eq!(moved.max, Vec3::new(4.0, 1.0, 1.0));
    }
}
