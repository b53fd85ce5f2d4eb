//! Borrowed mesh views.
//!
//! The simulator never owns geometry: a body references vertex positions and
//! element indices that live elsewhere (an asset store, a procedural
//! generator) and must outlive the scene. Positions are body-local.

use log::error;
use nalgebra::Vector3;

/// An indexed triangle mesh borrowed from the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriMesh<'a> {
    /// Vertex positions in body-local coordinates.
    pub positions: &'a [[f32; 3]],
    /// Triangles as triples of vertex indices. Winding must be
    /// outward-consistent for mass properties and contact normals to make
    /// sense.
    pub triangles: &'a [[usize; 3]],
}

impl TriMesh<'_> {
    /// Check that every triangle index is in range. Logs on failure.
    ///
    /// An empty mesh is valid; bodies without triangles simply never
    /// collide and cannot be simulated.
    pub fn check_validity(&self) -> bool {
        for tri in self.triangles {
            if tri[0] >= self.positions.len()
                || tri[1] >= self.positions.len()
                || tri[2] >= self.positions.len()
            {
                error!("triangle vertices are out of bounds");
                return false;
            }
        }
        true
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    pub fn vertex(&self, vid: usize) -> Vector3<f32> {
        let p = self.positions[vid];
        Vector3::new(p[0], p[1], p[2])
    }

    /// The three corner positions of triangle `eid`.
    #[inline]
    pub fn triangle_corners(&self, eid: usize) -> [Vector3<f32>; 3] {
        let t = self.triangles[eid];
        [self.vertex(t[0]), self.vertex(t[1]), self.vertex(t[2])]
    }
}

/// An indexed tetrahedral mesh borrowed from the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TetMesh<'a> {
    /// Vertex positions in body-local coordinates.
    pub positions: &'a [[f32; 3]],
    /// Tetrahedra as 4-tuples of vertex indices.
    pub tets: &'a [[usize; 4]],
}

impl TetMesh<'_> {
    /// Check that every tetrahedron index is in range. Logs on failure.
    pub fn check_validity(&self) -> bool {
        for tet in self.tets {
            if tet.iter().any(|&i| i >= self.positions.len()) {
                error!("tetrahedron vertices are out of bounds");
                return false;
            }
        }
        true
    }

    #[inline]
    pub fn vertex(&self, vid: usize) -> Vector3<f32> {
        let p = self.positions[vid];
        Vector3::new(p[0], p[1], p[2])
    }

    /// The four corner positions of tetrahedron `eid`.
    #[inline]
    pub fn tet_corners(&self, eid: usize) -> [Vector3<f32>; 4] {
        let t = self.tets[eid];
        [
            self.vertex(t[0]),
            self.vertex(t[1]),
            self.vertex(t[2]),
            self.vertex(t[3]),
        ]
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;

    #[test]
    fn test_trimesh_validity() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let triangles = [[0, 1, 2]];
        let mesh = TriMesh {
            positions: &positions,
            triangles: &triangles,
        };
        assert!(mesh.check_validity());
        assert!(!mesh.is_empty());
    }

    #[test]
    fn test_trimesh_out_of_bounds_index() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let triangles = [[0, 1, 5]];
        let mesh = TriMesh {
            positions: &positions,
            triangles: &triangles,
        };
        assert!(!mesh.check_validity());
    }

    #[test]
    fn test_empty_trimesh_is_valid() {
        let mesh = TriMesh::default();
        assert!(mesh.check_validity());
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_triangle_corners() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let triangles = [[0, 1, 2]];
        let mesh = TriMesh {
            positions: &positions,
            triangles: &triangles,
        };
        let [a, b, c] = mesh.triangle_corners(0);
        assert_eq!(a, Vector3::zeros());
        assert_eq!(b, Vector3::x());
        assert_eq!(c, Vector3::y());
    }

    #[test]
    fn test_tetmesh_validity() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let tets = [[0, 1, 2, 3]];
        let mesh = TetMesh {
            positions: &positions,
            tets: &tets,
        };
        assert!(mesh.check_validity());
        let corners = mesh.tet_corners(0);
        assert_eq!(corners[3], Vector3::z());

        let bad = [[0, 1, 2, 9]];
        let mesh = TetMesh {
            positions: &positions,
            tets: &bad,
        };
        assert!(!mesh.check_validity());
    }
}
