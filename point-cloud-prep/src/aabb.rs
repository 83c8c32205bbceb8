//! Axis-aligned bounding boxes and their box-mesh form.
use glam::Vec3;

use crate::error::{Error, Result};
use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Construction validates `min <= max` on every axis.
    pub fn new(min: Vec3, max: Vec3) -> Result<Self> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(Error::InvalidGeometry {
                min: min.to_array(),
                max: max.to_array(),
            });
        }
        Ok(Self { min, max })
    }

    /// Per-axis extent of the box.
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// The 8-vertex, 12-triangle box mesh spanning this volume, wound so
    /// every face reads counter-clockwise from outside.
    pub fn to_mesh(&self) -> Mesh {
        let (min, max) = (self.min, self.max);
        let vertices = vec![
            min,
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, min.z),
            max,
        ];
        let indices = vec![
            0, 1, 3, 0, 3, 2, // -x
            4, 7, 5, 4, 6, 7, // +x
            0, 6, 4, 0, 2, 6, // -z
            1, 5, 7, 1, 7, 3, // +z
            0, 5, 1, 0, 4, 5, // -y
            2, 3, 7, 2, 7, 6, // +y
        ];
        Mesh { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_extents() {
        let bad = Aabb::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 0.0));
        assert!(matches!(bad, Err(Error::InvalidGeometry { .. })));
    }

    #[test]
    fn degenerate_box_is_valid() {
        let point = Vec3::splat(3.0);
        let aabb = Aabb::new(point, point).unwrap();
        assert_eq!(aabb.dimensions(), Vec3::ZERO);
    }

    #[test]
    fn box_mesh_has_eight_vertices_and_twelve_triangles() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE).unwrap();
        let mesh = aabb.to_mesh();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < 8));
        // every corner is referenced by at least one face
        for corner in 0..8u32 {
            assert!(mesh.indices.contains(&corner));
        }
    }
}
