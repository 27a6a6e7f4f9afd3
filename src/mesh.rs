use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Floats per vertex: `position.xyz` followed by `normal.xyz`.
pub const VERTEX_STRIDE: usize = 6;
pub const WIDTH_SEGMENTS: u32 = 64;
pub const HEIGHT_SEGMENTS: u32 = 64;

/// GPU ready interleaved vertex and index arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * VERTEX_STRIDE..index * VERTEX_STRIDE + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * VERTEX_STRIDE + 3..index * VERTEX_STRIDE + 6])
    }
}

/// The eyeball: a unit UV sphere with the default tessellation.
pub fn eyeball_mesh() -> Mesh {
    uv_sphere(1.0, WIDTH_SEGMENTS, HEIGHT_SEGMENTS)
}

/// Latitude/longitude sphere with counter-clockwise outward faces.
///
/// Each ring repeats its first vertex at the seam; the pole rings emit a
/// single triangle per segment.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let ring = width_segments + 1;

    let mut vertices = Vec::with_capacity((ring * (height_segments + 1)) as usize * VERTEX_STRIDE);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            let position = normal * radius;
            vertices.extend_from_slice(&[position.x, position.y, position.z]);
            vertices.extend_from_slice(&[normal.x, normal.y, normal.z]);
        }
    }

    let mut indices = Vec::new();
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * ring + ix + 1;
            let b = iy * ring + ix;
            let c = (iy + 1) * ring + ix;
            let d = (iy + 1) * ring + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sphere_counts() {
        let mesh = eyeball_mesh();
        assert_eq!(mesh.vertex_count(), 65 * 65);
        // Two triangles per quad except one per segment on each pole ring.
        assert_eq!(mesh.indices.len(), (64 * 64 * 2 - 2 * 64) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn vertices_lie_on_the_sphere() {
        let mesh = uv_sphere(2.0, 8, 6);
        for i in 0..mesh.vertex_count() {
            assert!((mesh.position(i).length() - 2.0).abs() < 1e-5);
            assert!((mesh.normal(i).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn faces_point_outwards() {
        let mesh = uv_sphere(1.0, 16, 12);
        for tri in mesh.indices.chunks_exact(3) {
            let [p0, p1, p2] = [0, 1, 2].map(|k| mesh.position(tri[k] as usize));
            let face_normal = (p1 - p0).cross(p2 - p0);
            let centroid = (p0 + p1 + p2) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0, "{tri:?}");
        }
    }
}
