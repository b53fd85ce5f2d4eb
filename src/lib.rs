//! Rigid body simulation for indexed triangle meshes.
//!
//! Advances a set of rigid bodies through time under gravity, resolving
//! inter-body contacts with a sequential-impulse (Projected Gauss–Seidel)
//! solver and a pyramidal friction approximation.
//!
//! Collision detection is vertex-based: contacts form where a vertex of one
//! body penetrates the triangle surface of another, so convex and concave
//! meshes both work, and accuracy scales with tesselation. The spatial
//! acceleration structure is not part of this crate; it is consumed through
//! the [`Broadphase`] trait ([`BruteForce`] is a ready-made exhaustive
//! implementation for tests and small scenes).
//!
//! Designed for `no_std` environments: geometry is borrowed, collections
//! are fixed-capacity `heapless` vectors, and math comes from `nalgebra`.
//!
//! # Example
//! ```
//! use rigidsim::{BruteForce, Frame, Scene, TriMesh};
//! use nalgebra::Vector3;
//!
//! // A unit tetrahedron dropped onto nothing: free fall.
//! let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
//! let triangles = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
//!
//! let mut scene = Scene::<8>::new(1);
//! scene.lin_drag = 0.0; // keep the trajectory ballistic
//! scene
//!     .set_body(
//!         0,
//!         Frame::from_translation(Vector3::new(0.0, 10.0, 0.0)),
//!         Vector3::zeros(),
//!         Vector3::zeros(),
//!         1000.0, // density in kg/m^3
//!         TriMesh { positions: &positions, triangles: &triangles },
//!     )
//!     .unwrap();
//! scene.init_simulation().unwrap();
//!
//! let mut oracle = BruteForce::<8>::new();
//! for _ in 0..100 {
//!     scene.advance::<_, 32>(&mut oracle, 1.0 / 100.0);
//! }
//! let frame = scene.body_frame(0).unwrap();
//! assert!(frame.pos.y < 5.2); // after 1 s of free fall, y is near 10 - g/2
//! ```

#![no_std]

pub mod body;
pub mod broadphase;
pub mod collision;
pub mod frame;
pub mod mesh;
pub mod moments;
pub mod scene;

mod solver;

#[cfg(test)]
mod testgeom;

pub use body::Body;
pub use broadphase::{Broadphase, BruteForce, OverlapPoint};
pub use collision::Contact;
pub use frame::Frame;
pub use mesh::{TetMesh, TriMesh};
pub use moments::{compute_moments, compute_moments_tetra, Moments};
pub use scene::{Error, Scene};
