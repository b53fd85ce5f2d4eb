//! Mass properties of closed meshes.
//!
//! Volume and centroid come from summing signed tetrahedra; the inertia
//! tensor is the sum of per-tetrahedron closed forms taken about the
//! centroid. For a triangle mesh every face is fanned against the origin,
//! so the winding must be outward-consistent or the signed volume (and with
//! it the whole computation) comes out non-positive.
//!
//! The returned tensor is divided by total volume, i.e. it is stored at
//! unit density. [`crate::Scene::init_simulation`] inverts it as-is, so a
//! body's rotational response does not scale with its density unless the
//! scene's `mass_scaled_inertia` knob is set.

use nalgebra::{Matrix3, Vector3};

use crate::frame::tetrahedron_volume;
use crate::mesh::{TetMesh, TriMesh};

/// Volume, center of mass, and unit-density inertia tensor about the
/// center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub volume: f32,
    pub centroid: Vector3<f32>,
    pub inertia: Matrix3<f32>,
}

/// Inertia tensor of one tetrahedron about `center`, at unit density.
///
/// Closed form from "Explicit Exact Formulas for the 3-D Tetrahedron
/// Inertia Tensor in Terms of its Vertex Coordinates" by F. Tonon, Journal
/// of Mathematics and Statistics 1 (1), 2004.
fn tetra_inertia(
    v0: Vector3<f32>,
    v1: Vector3<f32>,
    v2: Vector3<f32>,
    v3: Vector3<f32>,
    center: Vector3<f32>,
) -> Matrix3<f32> {
    let volume = tetrahedron_volume(v0, v1, v2, v3);
    let r0 = v0 - center;
    let r1 = v1 - center;
    let r2 = v2 - center;
    let r3 = v3 - center;

    // x^2, y^2, z^2 moments
    let mut diag = Vector3::zeros();
    for j in 0..3 {
        diag[j] = (r0[j] * r0[j]
            + r1[j] * r1[j]
            + r2[j] * r2[j]
            + r3[j] * r3[j]
            + r0[j] * r1[j]
            + r0[j] * r2[j]
            + r0[j] * r3[j]
            + r1[j] * r2[j]
            + r1[j] * r3[j]
            + r2[j] * r3[j])
            * 6.0
            * volume
            / 60.0;
    }

    // y*z, z*x, x*y products
    let mut offd = Vector3::zeros();
    for j in 0..3 {
        let j1 = (j + 1) % 3;
        let j2 = (j + 2) % 3;
        offd[j] = (2.0 * r0[j1] * r0[j2]
            + 2.0 * r1[j1] * r1[j2]
            + 2.0 * r2[j1] * r2[j2]
            + 2.0 * r3[j1] * r3[j2]
            + r1[j1] * r0[j2]
            + r2[j1] * r0[j2]
            + r3[j1] * r0[j2]
            + r0[j1] * r1[j2]
            + r2[j1] * r1[j2]
            + r3[j1] * r1[j2]
            + r0[j1] * r2[j2]
            + r1[j1] * r2[j2]
            + r3[j1] * r2[j2]
            + r0[j1] * r3[j2]
            + r1[j1] * r3[j2]
            + r2[j1] * r3[j2])
            * 6.0
            * volume
            / 120.0;
    }

    Matrix3::new(
        diag[1] + diag[2],
        -offd[2],
        -offd[1],
        -offd[2],
        diag[0] + diag[2],
        -offd[0],
        -offd[1],
        -offd[0],
        diag[0] + diag[1],
    )
}

/// Mass properties of a closed triangle mesh, by fanning each face against
/// the origin.
///
/// A non-positive `volume` in the result means the mesh is not a valid
/// outward-wound closed surface; `centroid` and `inertia` are meaningless
/// in that case.
///
/// # Example
/// ```
/// use rigidsim::{compute_moments, TriMesh};
///
/// let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let triangles = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
/// let m = compute_moments(&TriMesh { positions: &positions, triangles: &triangles });
/// assert!((m.volume - 1.0 / 6.0).abs() < 1e-6);
/// assert!((m.centroid.x - 0.25).abs() < 1e-6);
/// ```
pub fn compute_moments(mesh: &TriMesh<'_>) -> Moments {
    let origin = Vector3::zeros();

    let mut volume = 0.0f32;
    let mut centroid = Vector3::zeros();
    for eid in 0..mesh.triangles.len() {
        let [v0, v1, v2] = mesh.triangle_corners(eid);
        let tvolume = tetrahedron_volume(origin, v0, v1, v2);
        volume += tvolume;
        centroid += (origin + v0 + v1 + v2) * (tvolume / 4.0);
    }
    if volume == 0.0 {
        return Moments {
            volume,
            centroid: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        };
    }
    centroid /= volume;

    let mut inertia = Matrix3::zeros();
    for eid in 0..mesh.triangles.len() {
        let [v0, v1, v2] = mesh.triangle_corners(eid);
        inertia += tetra_inertia(origin, v0, v1, v2, centroid);
    }
    inertia /= volume;

    Moments {
        volume,
        centroid,
        inertia,
    }
}

/// Mass properties of a tetrahedral mesh, taking each tetrahedron directly.
pub fn compute_moments_tetra(mesh: &TetMesh<'_>) -> Moments {
    let mut volume = 0.0f32;
    let mut centroid = Vector3::zeros();
    for eid in 0..mesh.tets.len() {
        let [v0, v1, v2, v3] = mesh.tet_corners(eid);
        let tvolume = tetrahedron_volume(v0, v1, v2, v3);
        volume += tvolume;
        centroid += (v0 + v1 + v2 + v3) * (tvolume / 4.0);
    }
    if volume == 0.0 {
        return Moments {
            volume,
            centroid: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        };
    }
    centroid /= volume;

    let mut inertia = Matrix3::zeros();
    for eid in 0..mesh.tets.len() {
        let [v0, v1, v2, v3] = mesh.tet_corners(eid);
        inertia += tetra_inertia(v0, v1, v2, v3, centroid);
    }
    inertia /= volume;

    Moments {
        volume,
        centroid,
        inertia,
    }
}
