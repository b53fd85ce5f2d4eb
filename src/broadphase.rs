//! The collision acceleration interface.
//!
//! The simulator does not implement a spatial index. It consumes one
//! through the [`Broadphase`] trait, a bundle of four queries the caller
//! implements on its own acceleration structure (a BVH, a grid, ...). The
//! implementor is the opaque context; every call receives the body slice so
//! the structure can read poses and meshes without retaining references.
//!
//! [`BruteForce`] is an exhaustive reference implementation: exact answers,
//! no acceleration, fine for tests and small scenes.

use heapless::Vec;
use log::error;
use nalgebra::Vector3;

use crate::body::Body;

// ComplexField provides sqrt() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

/// A closest-element query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapPoint {
    /// Distance from the query point to the closest point on the element.
    pub dist: f32,
    /// Element (triangle) index on the queried body.
    pub eid: usize,
    /// Barycentric coordinates of the closest point; only the first three
    /// components are meaningful for triangles.
    pub euv: [f32; 4],
}

impl OverlapPoint {
    /// The triangle barycentric weights.
    #[inline]
    pub fn uvw(&self) -> [f32; 3] {
        [self.euv[0], self.euv[1], self.euv[2]]
    }
}

/// The four overlap queries the simulator needs from an acceleration
/// structure.
///
/// All queries are synchronous; `&mut self` allows lazily maintained
/// internal state. None of them may retain references to the body slice
/// between calls.
pub trait Broadphase {
    /// Produce candidate body pairs whose bounding volumes intersect.
    /// Ordering within a pair is arbitrary and duplicates are allowed; the
    /// simulator filters and processes each candidate from both sides.
    fn overlap_shapes(&mut self, bodies: &[Body<'_>], pairs: &mut dyn FnMut(usize, usize));

    /// Closest triangle of body `sid` to the world-space `point`, if any
    /// lies within `max_dist`.
    ///
    /// Unused by the default simulation path; kept as the query primitive
    /// for the alternative per-vertex collision routine.
    fn overlap_shape(
        &mut self,
        bodies: &[Body<'_>],
        sid: usize,
        point: Vector3<f32>,
        max_dist: f32,
    ) -> Option<OverlapPoint>;

    /// For each vertex of body `vert_sid` within `max_dist` of a triangle
    /// of body `surf_sid`, report the closest-triangle hit and the vertex
    /// index through `hits`.
    fn overlap_verts(
        &mut self,
        bodies: &[Body<'_>],
        surf_sid: usize,
        vert_sid: usize,
        max_dist: f32,
        hits: &mut dyn FnMut(OverlapPoint, usize),
    );

    /// Rebuild or refit after pose updates. Called once at the end of every
    /// tick, so the next tick's `overlap_shapes` observes updated poses.
    fn refit(&mut self, bodies: &[Body<'_>]);
}

/// World-space axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Vector3<f32>,
    max: Vector3<f32>,
}

impl Aabb {
    /// An empty box that intersects nothing.
    fn empty() -> Aabb {
        Aabb {
            min: Vector3::repeat(f32::MAX),
            max: Vector3::repeat(f32::MIN),
        }
    }

    fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.min.y <= other.max.y
            && self.min.z <= other.max.z
            && other.min.x <= self.max.x
            && other.min.y <= self.max.y
            && other.min.z <= self.max.z
    }
}

/// Exhaustive reference [`Broadphase`].
///
/// Caches one inflated world-space AABB per body (capacity `N`, matching
/// the scene capacity) and rebuilds them on [`Broadphase::refit`]; the
/// pair and closest-point queries scan everything.
///
/// `margin` inflates the cached boxes so pairs surface while bodies are
/// still a vertex-overlap radius apart; it should be at least the scene's
/// `overlap_max_radius`.
#[derive(Debug)]
pub struct BruteForce<const N: usize> {
    bounds: Vec<Aabb, N>,
    pub margin: f32,
}

impl<const N: usize> Default for BruteForce<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BruteForce<N> {
    pub fn new() -> Self {
        BruteForce {
            bounds: Vec::new(),
            margin: 0.25,
        }
    }

    pub fn with_margin(margin: f32) -> Self {
        BruteForce {
            bounds: Vec::new(),
            margin,
        }
    }

    fn rebuild(&mut self, bodies: &[Body<'_>]) {
        self.bounds.clear();
        for body in bodies {
            let mut aabb = Aabb::empty();
            for vid in 0..body.mesh.positions.len() {
                let p = body.frame.transform_point(body.mesh.vertex(vid));
                aabb.min = aabb.min.inf(&p);
                aabb.max = aabb.max.sup(&p);
            }
            if !body.mesh.positions.is_empty() {
                aabb.min -= Vector3::repeat(self.margin);
                aabb.max += Vector3::repeat(self.margin);
            }
            if self.bounds.push(aabb).is_err() {
                error!(
                    "brute-force oracle capacity exceeded ({} bodies, capacity {})",
                    bodies.len(),
                    N
                );
                return;
            }
        }
    }

    /// Closest triangle of `body` to the world-space `point` within
    /// `max_dist`.
    fn closest_on_body(
        &self,
        body: &Body<'_>,
        point: Vector3<f32>,
        max_dist: f32,
    ) -> Option<OverlapPoint> {
        let mut best: Option<(f32, usize, [f32; 3])> = None;
        for eid in 0..body.mesh.triangles.len() {
            let [a, b, c] = body.mesh.triangle_corners(eid);
            let a = body.frame.transform_point(a);
            let b = body.frame.transform_point(b);
            let c = body.frame.transform_point(c);
            let (closest, uvw) = closest_point_triangle(point, a, b, c);
            let dist_sq = (point - closest).norm_squared();
            if best.map_or(true, |(d, _, _)| dist_sq < d) {
                best = Some((dist_sq, eid, uvw));
            }
        }
        let (dist_sq, eid, uvw) = best?;
        if dist_sq > max_dist * max_dist {
            return None;
        }
        Some(OverlapPoint {
            dist: dist_sq.sqrt(),
            eid,
            euv: [uvw[0], uvw[1], uvw[2], 0.0],
        })
    }
}

impl<const N: usize> Broadphase for BruteForce<N> {
    fn overlap_shapes(&mut self, bodies: &[Body<'_>], pairs: &mut dyn FnMut(usize, usize)) {
        // First call arrives before any refit; build lazily.
        if self.bounds.len() != bodies.len() {
            self.rebuild(bodies);
        }
        for i in 0..self.bounds.len() {
            for j in (i + 1)..self.bounds.len() {
                if self.bounds[i].intersects(&self.bounds[j]) {
                    pairs(i, j);
                }
            }
        }
    }

    fn overlap_shape(
        &mut self,
        bodies: &[Body<'_>],
        sid: usize,
        point: Vector3<f32>,
        max_dist: f32,
    ) -> Option<OverlapPoint> {
        self.closest_on_body(&bodies[sid], point, max_dist)
    }

    fn overlap_verts(
        &mut self,
        bodies: &[Body<'_>],
        surf_sid: usize,
        vert_sid: usize,
        max_dist: f32,
        hits: &mut dyn FnMut(OverlapPoint, usize),
    ) {
        let surf = &bodies[surf_sid];
        let verts = &bodies[vert_sid];
        for vid in 0..verts.mesh.positions.len() {
            let p = verts.frame.transform_point(verts.mesh.vertex(vid));
            if let Some(overlap) = self.closest_on_body(surf, p, max_dist) {
                hits(overlap, vid);
            }
        }
    }

    fn refit(&mut self, bodies: &[Body<'_>]) {
        self.rebuild(bodies);
    }
}

/// Closest point on triangle `(a, b, c)` to `p`, with its barycentric
/// coordinates (the point is `u*a + v*b + w*c`).
///
/// Region walk after Ericson, "Real-Time Collision Detection" §5.1.5.
fn closest_point_triangle(
    p: Vector3<f32>,
    a: Vector3<f32>,
    b: Vector3<f32>,
    c: Vector3<f32>,
) -> (Vector3<f32>, [f32; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}
