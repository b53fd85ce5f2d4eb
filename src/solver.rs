//! Sequential-impulse constraint solver (Projected Gauss–Seidel).
//!
//! Each iteration visits every contact once, replacing its accumulated
//! impulse with a new estimate that cancels the current relative velocity
//! along the contact axes, then projecting the accumulated impulse onto a
//! pyramidal friction cone. A fixed iteration count bounds the work; there
//! is no early-out.

use nalgebra::{Matrix3, Vector3};

use crate::body::Body;
use crate::collision::Contact;

/// Friction coefficient of the pyramidal cone.
const FRICTION: f32 = 0.6;

/// `v . (M * v)`, the quadratic form the effective-mass denominators use.
#[inline]
fn muldot(v: Vector3<f32>, m: &Matrix3<f32>) -> f32 {
    v.dot(&(m * v))
}

/// Relative velocity of the penetrator with respect to the surface owner
/// at the contact point.
#[inline]
fn relative_velocity(b0: &Body<'_>, b1: &Body<'_>, r0: Vector3<f32>, r1: Vector3<f32>) -> Vector3<f32> {
    let v0 = b0.lin_vel + b0.ang_vel.cross(&r0);
    let v1 = b1.lin_vel + b1.ang_vel.cross(&r1);
    v1 - v0
}

/// Solve the contact constraints, mutating body velocities in place.
///
/// Contacts are visited in input order on every iteration, so the result
/// is deterministic for a given contact sequence. `_dt` is unused while
/// positional stabilization stays disabled (see the `offset` note below).
pub(crate) fn solve_contacts(
    bodies: &mut [Body<'_>],
    contacts: &mut [Contact],
    iterations: usize,
    _dt: f32,
) {
    // Per-contact precomputation: effective masses along the contact axes.
    // Static bodies contribute nothing (their inverses are zero).
    for contact in contacts.iter_mut() {
        contact.impulse = Vector3::zeros();
        contact.local_impulse = Vector3::zeros();
        let b0 = &bodies[contact.bodies[0]];
        let b1 = &bodies[contact.bodies[1]];
        let r0 = contact.frame.pos - b0.centroid_world();
        let r1 = contact.frame.pos - b1.centroid_world();
        let denom = |axis: Vector3<f32>| {
            b0.mass_inv()
                + b1.mass_inv()
                + muldot(r0.cross(&axis), &b0.inertia_inv_world())
                + muldot(r1.cross(&axis), &b1.inertia_inv_world())
        };
        contact.meff_inv = Vector3::new(
            1.0 / denom(contact.frame.x_axis()),
            1.0 / denom(contact.frame.y_axis()),
            1.0 / denom(contact.frame.z_axis()),
        );
    }

    for contact in contacts.iter_mut() {
        let b0 = &bodies[contact.bodies[0]];
        let b1 = &bodies[contact.bodies[1]];
        let r0 = contact.frame.pos - b0.centroid_world();
        let r1 = contact.frame.pos - b1.centroid_world();
        contact.vel_before = relative_velocity(b0, b1, r0, r1);
    }

    for _ in 0..iterations {
        for contact in contacts.iter_mut() {
            let [i0, i1] = contact.bodies;
            let r0 = contact.frame.pos - bodies[i0].centroid_world();
            let r1 = contact.frame.pos - bodies[i1].centroid_world();
            let vr = relative_velocity(&bodies[i0], &bodies[i1], r0, r1);

            // Withdraw this contact's previous contribution before
            // estimating anew from the current relative velocity.
            bodies[i0].apply_rel_impulse(contact.impulse, r0);
            bodies[i1].apply_rel_impulse(-contact.impulse, r1);

            // let offset = contact.depth * 0.8 / _dt;
            let offset = 0.0f32;
            let delta = contact.meff_inv.component_mul(&Vector3::new(
                -contact.frame.x_axis().dot(&vr),
                -contact.frame.y_axis().dot(&vr),
                -contact.frame.z_axis().dot(&vr) + offset,
            ));
            contact.local_impulse += delta;

            // Project onto the friction pyramid: non-negative normal
            // impulse, tangential impulses bounded by it.
            contact.local_impulse.z = contact.local_impulse.z.clamp(0.0, f32::MAX);
            contact.local_impulse.x = contact.local_impulse.x.clamp(
                -contact.local_impulse.z * FRICTION,
                contact.local_impulse.z * FRICTION,
            );
            contact.local_impulse.y = contact.local_impulse.y.clamp(
                -contact.local_impulse.z * FRICTION,
                contact.local_impulse.z - offset * FRICTION,
            );

            contact.impulse = contact.frame.x_axis() * contact.local_impulse.x
                + contact.frame.y_axis() * contact.local_impulse.y
                + contact.frame.z_axis() * contact.local_impulse.z;

            bodies[i0].apply_rel_impulse(-contact.impulse, r0);
            bodies[i1].apply_rel_impulse(contact.impulse, r1);
        }
    }

    for contact in contacts.iter_mut() {
        let b0 = &bodies[contact.bodies[0]];
        let b1 = &bodies[contact.bodies[1]];
        let r0 = contact.frame.pos - b0.centroid_world();
        let r1 = contact.frame.pos - b1.centroid_world();
        contact.vel_after = relative_velocity(b0, b1, r0, r1);
    }
}
