#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! This crate implements the per-element group algebra for two Lie groups
//! used throughout robotics and computer vision:
//!
//! - **SO(3)**: 3D rotations, stored as unit quaternions.
//! - **SE(3)**: 3D rigid body transformations (rotation + translation).
//!
//! Every Lie group has a corresponding **Lie algebra**: the tangent space at
//! the identity element. The Lie algebra is a plain vector space, which makes
//! it the natural home for optimization increments. The **exponential map**
//! (`exp`) moves from the algebra to the group, and the **logarithmic map**
//! (`log`) goes back.
//!
//! The functions here are pure, fixed-size and unbatched; the batched
//! dispatch layer lives in `atlas-lie` and calls into this crate one element
//! at a time.
//!
//! ## Quaternion double cover
//!
//! [`SO3`](so3::SO3) stores a unit quaternion, an element of SU(2), the
//! double cover of SO(3): `q` and `-q` represent the same rotation. `log`
//! normalizes the sign of the scalar part so results stay in the ±π ball.
//!
//! ## Example
//!
//! ```rust
//! use atlas_algebra::so3::SO3;
//! use glam::Vec3;
//!
//! let r = SO3::exp(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2));
//! let p = r.act(Vec3::new(1.0, 0.0, 0.0));
//! assert!((p - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
//! ```

/// Special Euclidean group SE(3) for 3D rigid transformations.
pub mod se3;

/// Special Orthogonal group SO(3) for 3D rotations.
pub mod so3;

pub use se3::{Twist, SE3};
pub use so3::SO3;
