//! Contact generation.
//!
//! Collision is vertex-based: a contact exists where a vertex of one body
//! lies just inside the surface of another, as reported by the overlap
//! oracle. Both bodies of a candidate pair take a turn as the surface
//! owner, so concave meshes work without any convex decomposition, and the
//! accuracy of the response scales with mesh tesselation.

use heapless::Vec;
use log::error;
use nalgebra::Vector3;

use crate::body::Body;
use crate::broadphase::Broadphase;
use crate::frame::{barycentric, triangle_normal, Frame};

/// Vertices on the outer side of the surface are rejected when the
/// normal-to-vertex direction agrees with the surface normal beyond this
/// threshold.
const ORIENTATION_EPS: f32 = -0.01;

/// A contact point, scoped to one simulation step.
///
/// `bodies[0]` owns the surface, `bodies[1]` owns the penetrating vertex.
/// The contact frame sits at the vertex position with its z-axis along the
/// surface normal (pointing from the surface owner toward the penetrator
/// side); x/y span the tangent plane where friction acts.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// (surface owner, penetrator) body indices.
    pub bodies: [usize; 2],
    /// Contact frame: origin at the vertex, z along the normal.
    pub frame: Frame,
    /// Penetration depth reported by the oracle.
    pub depth: f32,
    /// Accumulated world-space impulse.
    pub impulse: Vector3<f32>,
    /// Accumulated impulse in contact-frame coordinates (x/y tangential,
    /// z normal).
    pub local_impulse: Vector3<f32>,
    /// Reciprocal effective mass along each contact-frame axis.
    pub meff_inv: Vector3<f32>,
    /// Relative contact velocity before solving, for observability.
    pub vel_before: Vector3<f32>,
    /// Relative contact velocity after solving, for observability.
    pub vel_after: Vector3<f32>,
}

impl Contact {
    fn new(bodies: [usize; 2], frame: Frame, depth: f32) -> Contact {
        Contact {
            bodies,
            frame,
            depth,
            impulse: Vector3::zeros(),
            local_impulse: Vector3::zeros(),
            meff_inv: Vector3::zeros(),
            vel_before: Vector3::zeros(),
            vel_after: Vector3::zeros(),
        }
    }
}

/// Build the contact for one oracle hit, if the vertex is actually on the
/// inner side of the surface.
fn contact_from_hit(
    bodies: &[Body<'_>],
    surf_sid: usize,
    vert_sid: usize,
    dist: f32,
    eid: usize,
    uvw: [f32; 3],
    vid: usize,
) -> Option<Contact> {
    let surf = &bodies[surf_sid];
    let verts = &bodies[vert_sid];

    let p = verts.frame.transform_point(verts.mesh.vertex(vid));
    let [v0, v1, v2] = surf.mesh.triangle_corners(eid);
    let tp = surf.frame.transform_point(barycentric(v0, v1, v2, uvw));
    let n = surf.frame.transform_direction(triangle_normal(v0, v1, v2));

    // Orientation filter: keep the vertex only if it sits behind the
    // (outward) surface normal.
    let ptp = (p - tp).normalize();
    if n.dot(&ptp) > ORIENTATION_EPS {
        return None;
    }
    Some(Contact::new([surf_sid, vert_sid], Frame::from_z(p, n), dist))
}

/// Generate contacts for the ordered pair (`surf_sid` surface,
/// `vert_sid` vertices) through the oracle's vertex-overlap query.
pub fn collide_pair<B: Broadphase, const C: usize>(
    bodies: &[Body<'_>],
    oracle: &mut B,
    surf_sid: usize,
    vert_sid: usize,
    max_radius: f32,
    contacts: &mut Vec<Contact, C>,
) {
    let mut truncated = false;
    oracle.overlap_verts(bodies, surf_sid, vert_sid, max_radius, &mut |overlap, vid| {
        if let Some(contact) = contact_from_hit(
            bodies,
            surf_sid,
            vert_sid,
            overlap.dist,
            overlap.eid,
            overlap.uvw(),
            vid,
        ) {
            if contacts.push(contact).is_err() {
                truncated = true;
            }
        }
    });
    if truncated {
        error!(
            "contact buffer capacity exceeded (max {}); some contacts will not be resolved",
            C
        );
    }
}

/// Alternative contact generation for one ordered pair, querying the
/// closest surface element per vertex instead of the batched
/// vertex-overlap query. Not used by the default simulation path.
pub fn collide_pair_pointwise<B: Broadphase, const C: usize>(
    bodies: &[Body<'_>],
    oracle: &mut B,
    surf_sid: usize,
    vert_sid: usize,
    max_radius: f32,
    contacts: &mut Vec<Contact, C>,
) {
    for vid in 0..bodies[vert_sid].mesh.positions.len() {
        let p = bodies[vert_sid]
            .frame
            .transform_point(bodies[vert_sid].mesh.vertex(vid));
        let Some(overlap) = oracle.overlap_shape(bodies, surf_sid, p, max_radius) else {
            continue;
        };
        if let Some(contact) = contact_from_hit(
            bodies,
            surf_sid,
            vert_sid,
            overlap.dist,
            overlap.eid,
            overlap.uvw(),
            vid,
        ) {
            if contacts.push(contact).is_err() {
                error!(
                    "contact buffer capacity exceeded (max {}); some contacts will not be resolved",
                    C
                );
                return;
            }
        }
    }
}

/// Gather all contacts for this step: candidate pairs from the oracle, then
/// vertex-overlap contacts with each body of a pair acting as both surface
/// and vertex set. Pairs of two static bodies and pairs with missing
/// triangles are skipped.
pub(crate) fn generate_contacts<B: Broadphase, const C: usize>(
    bodies: &[Body<'_>],
    oracle: &mut B,
    max_radius: f32,
) -> Vec<Contact, C> {
    let mut pairs: Vec<(usize, usize), C> = Vec::new();
    let mut truncated = false;
    oracle.overlap_shapes(bodies, &mut |i, j| {
        if pairs.push((i, j)).is_err() {
            truncated = true;
        }
    });
    if truncated {
        error!(
            "candidate pair buffer capacity exceeded (max {}); some pairs will not collide",
            C
        );
    }

    let mut contacts: Vec<Contact, C> = Vec::new();
    for &(s1, s2) in &pairs {
        if !bodies[s1].simulated && !bodies[s2].simulated {
            continue;
        }
        if bodies[s1].mesh.is_empty() || bodies[s2].mesh.is_empty() {
            continue;
        }
        collide_pair(bodies, oracle, s1, s2, max_radius, &mut contacts);
        collide_pair(bodies, oracle, s2, s1, max_radius, &mut contacts);
    }
    contacts
}
