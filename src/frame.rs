//! Rigid transforms and the small geometry kit the simulator is built on.
//!
//! A [`Frame`] is a rotation matrix plus a translation, mapping body-local
//! coordinates to world coordinates. Rotations are kept as raw `Matrix3`
//! values rather than quaternions: the integrator composes Rodrigues
//! rotation matrices directly and tolerates the small orthonormality drift
//! that accumulates (see [`Frame::drift`]).

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

// ComplexField provides sqrt()/abs() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

/// A rigid transform: orthonormal rotation `rot` plus translation `pos`.
///
/// Points map as `rot * p + pos`, directions as `rot * d`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub rot: Matrix3<f32>,
    pub pos: Vector3<f32>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    /// The identity transform.
    pub fn identity() -> Frame {
        Frame {
            rot: Matrix3::identity(),
            pos: Vector3::zeros(),
        }
    }

    pub fn new(rot: Matrix3<f32>, pos: Vector3<f32>) -> Frame {
        Frame { rot, pos }
    }

    /// A pure translation with identity rotation.
    pub fn from_translation(pos: Vector3<f32>) -> Frame {
        Frame {
            rot: Matrix3::identity(),
            pos,
        }
    }

    /// Build a frame at `pos` whose z-axis is `z` (normalized here).
    ///
    /// The x/y tangent axes are chosen deterministically from the dominant
    /// components of `z`; any stable tangent basis would do.
    pub fn from_z(pos: Vector3<f32>, z: Vector3<f32>) -> Frame {
        let z = z.normalize();
        let x = orthogonal(&z).normalize();
        let y = z.cross(&x).normalize();
        Frame {
            rot: Matrix3::from_columns(&[x, y, z]),
            pos,
        }
    }

    #[inline]
    pub fn x_axis(&self) -> Vector3<f32> {
        self.rot.column(0).into_owned()
    }

    #[inline]
    pub fn y_axis(&self) -> Vector3<f32> {
        self.rot.column(1).into_owned()
    }

    #[inline]
    pub fn z_axis(&self) -> Vector3<f32> {
        self.rot.column(2).into_owned()
    }

    /// Transform a point from local to world coordinates.
    #[inline]
    pub fn transform_point(&self, p: Vector3<f32>) -> Vector3<f32> {
        self.rot * p + self.pos
    }

    /// Transform a direction (rotation only, no translation).
    #[inline]
    pub fn transform_direction(&self, d: Vector3<f32>) -> Vector3<f32> {
        self.rot * d
    }

    /// Compose two frames: `(self * other)` applies `other` first.
    pub fn compose(&self, other: &Frame) -> Frame {
        Frame {
            rot: self.rot * other.rot,
            pos: self.rot * other.pos + self.pos,
        }
    }

    /// The inverse transform. Valid only while `rot` is orthonormal.
    pub fn inverse(&self) -> Frame {
        let rot_t = self.rot.transpose();
        Frame {
            rot: rot_t,
            pos: -(rot_t * self.pos),
        }
    }

    /// Maximum absolute deviation of `rotᵀ·rot` from the identity.
    ///
    /// Repeated Rodrigues updates accumulate orthonormality error; the
    /// integrator never repairs it, so callers can watch this instead.
    pub fn drift(&self) -> f32 {
        let e = self.rot.transpose() * self.rot - Matrix3::identity();
        let mut max = 0.0f32;
        for v in e.iter() {
            if v.abs() > max {
                max = v.abs();
            }
        }
        max
    }
}

impl core::ops::Mul for Frame {
    type Output = Frame;

    fn mul(self, rhs: Frame) -> Frame {
        self.compose(&rhs)
    }
}

/// Some vector orthogonal to `v` (not normalized).
fn orthogonal(v: &Vector3<f32>) -> Vector3<f32> {
    if v.x.abs() > v.z.abs() {
        Vector3::new(-v.y, v.x, 0.0)
    } else {
        Vector3::new(0.0, -v.z, v.y)
    }
}

/// Rotation matrix for a rotation of `angle` radians about `axis`
/// (Rodrigues' formula; `axis` is normalized here).
pub fn rotation_from_axis_angle(axis: Vector3<f32>, angle: f32) -> Matrix3<f32> {
    Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle).into_inner()
}

/// Unit normal of the triangle `(v0, v1, v2)`, oriented by winding.
#[inline]
pub fn triangle_normal(v0: Vector3<f32>, v1: Vector3<f32>, v2: Vector3<f32>) -> Vector3<f32> {
    (v1 - v0).cross(&(v2 - v0)).normalize()
}

/// Signed volume of the tetrahedron `(a, b, c, d)`.
///
/// Positive when `(b - a, c - a, d - a)` form a right-handed triple.
#[inline]
pub fn tetrahedron_volume(
    a: Vector3<f32>,
    b: Vector3<f32>,
    c: Vector3<f32>,
    d: Vector3<f32>,
) -> f32 {
    (b - a).dot(&(c - a).cross(&(d - a))) / 6.0
}

/// Weighted combination `w[0]*v0 + w[1]*v1 + w[2]*v2`.
///
/// The weights come straight from the overlap oracle; no normalization or
/// sign convention is imposed here.
#[inline]
pub fn barycentric(
    v0: Vector3<f32>,
    v1: Vector3<f32>,
    v2: Vector3<f32>,
    w: [f32; 3],
) -> Vector3<f32> {
    v0 * w[0] + v1 * w[1] + v2 * w[2]
}
