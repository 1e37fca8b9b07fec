#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `atlas-lie` is the batched dispatch layer over the scalar group algebra
//! of `atlas-algebra`. It represents many independent group elements at once
//! as a coordinate array of shape `(*batch, D)` tagged with a [`GroupType`],
//! and exposes the differentiable group operations estimation pipelines
//! need: exponential/logarithm maps, composition, inversion, adjoint
//! transport and point actions, all with numpy-style batch broadcasting.
//!
//! # Architecture
//!
//! - [`GroupType`]: a closed set of four descriptors, one per (group,
//!   representation) pair: `SO3`/`so3` and `SE3`/`se3`. The tag decides
//!   which operations are legal (`exp` from tangent types, `log` from
//!   manifold types) and which kernel family handles them.
//! - [`LieTensor`]: the batched container. Forwards each operation to its
//!   tag, which broadcasts operands, invokes the matching kernel and
//!   re-wraps the flat output with the correct outgoing tag.
//! - [`kernels`]: flat-batch loops over the scalar maps, keyed by [`Group`].
//!
//! Representation misuse (such as `exp` on a manifold type), trailing-axis
//! mismatches and failed broadcasts all surface as typed [`LieError`]
//! values callers can pattern-match on.
//!
//! # Quick Start
//!
//! ```rust
//! use atlas_lie::GroupType;
//!
//! // a batch of random rotations, drawn in the tangent space
//! let g = GroupType::SO3.randn(&[8], 0.1)?;
//!
//! // round-trip through the algebra
//! let t = g.log()?;
//! assert_eq!(t.gtype(), GroupType::So3);
//! let g2 = t.exp()?;
//! assert_eq!(g2.gshape(), &[8]);
//!
//! // compose with the inverse: identity up to tolerance
//! let e = g.mul(&g.inv()?)?;
//! # Ok::<(), atlas_lie::LieError>(())
//! ```

/// Typed errors for batched group operations.
pub mod error;

/// Group family identifiers and the four group-type descriptors.
pub mod group;

/// Batched kernels over flat `(N, d)` coordinate arrays.
pub mod kernels;

/// The batched group-element container.
pub mod lietensor;

pub use error::LieError;
pub use group::{Group, GroupType};
pub use lietensor::LieTensor;
