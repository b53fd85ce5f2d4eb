//! Rigid body state.
//!
//! A body is a pose, a pair of velocities, a density, and a borrowed mesh,
//! plus cached mass/inertia derivatives filled in by
//! [`crate::Scene::init_simulation`] and refreshed each tick. Density zero
//! marks a body static: it participates in collision as an obstacle but is
//! never integrated and absorbs impulses with infinite effective mass.

use nalgebra::{Matrix3, Vector3};

use crate::frame::Frame;
use crate::mesh::TriMesh;

/// A rigid body. Mesh storage is borrowed and must outlive the scene.
#[derive(Debug, Clone, Copy)]
pub struct Body<'a> {
    /// Body-local to world transform.
    pub frame: Frame,
    /// Linear velocity of the center of mass, world space (m/s).
    pub lin_vel: Vector3<f32>,
    /// Angular velocity, world space (rad/s).
    pub ang_vel: Vector3<f32>,
    /// Density in kg/m^3. Zero marks the body static.
    pub density: f32,
    /// Whether the body is integrated and receives impulses.
    pub simulated: bool,
    /// Collision and mass-property geometry, body-local.
    pub mesh: TriMesh<'a>,

    // Cached values, computed at init and partly refreshed per tick.
    pub(crate) mass: f32,
    pub(crate) mass_inv: f32,
    pub(crate) centroid_local: Vector3<f32>,
    pub(crate) centroid_world: Vector3<f32>,
    pub(crate) inertia_local: Matrix3<f32>,
    pub(crate) inertia_inv_local: Matrix3<f32>,
    pub(crate) inertia_inv_world: Matrix3<f32>,
}

impl Default for Body<'_> {
    fn default() -> Self {
        Body {
            frame: Frame::identity(),
            lin_vel: Vector3::zeros(),
            ang_vel: Vector3::zeros(),
            density: 0.0,
            simulated: false,
            mesh: TriMesh::default(),
            mass: 0.0,
            mass_inv: 0.0,
            centroid_local: Vector3::zeros(),
            centroid_world: Vector3::zeros(),
            inertia_local: Matrix3::zeros(),
            inertia_inv_local: Matrix3::zeros(),
            inertia_inv_world: Matrix3::zeros(),
        }
    }
}

impl Body<'_> {
    /// Mass in kg (`density * volume`); zero for static bodies.
    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Inverse mass; zero for static bodies.
    #[inline]
    pub fn mass_inv(&self) -> f32 {
        self.mass_inv
    }

    /// Center of mass in body-local coordinates.
    #[inline]
    pub fn centroid_local(&self) -> Vector3<f32> {
        self.centroid_local
    }

    /// Center of mass in world coordinates, as of the last cache refresh.
    #[inline]
    pub fn centroid_world(&self) -> Vector3<f32> {
        self.centroid_world
    }

    /// Inertia tensor about the centroid, body-local.
    #[inline]
    pub fn inertia_local(&self) -> Matrix3<f32> {
        self.inertia_local
    }

    /// Inverse inertia tensor, body-local; zero for static bodies.
    #[inline]
    pub fn inertia_inv_local(&self) -> Matrix3<f32> {
        self.inertia_inv_local
    }

    /// Inverse inertia tensor in world space (`R * I_local^-1 * R^T`), as
    /// of the last cache refresh; zero for static bodies.
    #[inline]
    pub fn inertia_inv_world(&self) -> Matrix3<f32> {
        self.inertia_inv_world
    }

    /// Recompute the world-space centroid and inverse inertia from the
    /// current frame. Called at the start of every tick, so mutating the
    /// frame between ticks is safe.
    pub(crate) fn refresh_world_cache(&mut self) {
        self.centroid_world = self.frame.transform_point(self.centroid_local);
        self.inertia_inv_world = self.frame.rot * self.inertia_inv_local * self.frame.rot.transpose();
    }

    /// Apply an impulse at a position relative to the center of mass:
    /// `lin_vel += J / m`, `ang_vel += I_world^-1 * (r x J)`.
    ///
    /// No-op for static bodies.
    #[inline]
    pub(crate) fn apply_rel_impulse(&mut self, impulse: Vector3<f32>, rel_pos: Vector3<f32>) {
        if !self.simulated {
            return;
        }
        self.lin_vel += impulse * self.mass_inv;
        self.ang_vel += self.inertia_inv_world * rel_pos.cross(&impulse);
    }
}
