use rand::Rng;
use rand_distr::StandardNormal;

use atlas_tensor::{broadcast_inputs, Tensor};

use crate::error::LieError;
use crate::kernels;
use crate::lietensor::LieTensor;

/// Kernel family identifier.
///
/// Each family shares one set of batched kernels between its manifold and
/// tangent representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Group {
    /// The rotation group SO(3) and its algebra so(3).
    SO3 = 1,
    /// The rigid transform group SE(3) and its algebra se(3).
    SE3 = 3,
}

/// Descriptor of one (group, representation) pair.
///
/// There are exactly four of these, a closed set: the two manifold
/// (embedding) representations [`GroupType::SO3`] and [`GroupType::SE3`], and
/// their tangent algebras [`GroupType::So3`] and [`GroupType::Se3`]. A
/// `GroupType` is a plain `Copy` tag carrying no per-call state, so sharing
/// one across threads is free.
///
/// The representation decides which operations are legal: `exp` only exists
/// on tangent types, `log` only on manifold types, `inv` on both (reducing to
/// negation on a tangent type, since the algebra is a vector space). Illegal
/// calls surface a typed [`LieError::InvalidRepresentation`] instead of being
/// coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    /// SO(3) rotations, stored as quaternions `[qx, qy, qz, qw]`.
    SO3,
    /// so(3) tangent algebra, stored as rotation vectors.
    So3,
    /// SE(3) rigid transforms, stored as `[tx, ty, tz, qx, qy, qz, qw]`.
    SE3,
    /// se(3) tangent algebra, stored as twists `[rho, phi]`.
    Se3,
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl GroupType {
    /// The kernel family this representation dispatches to.
    #[inline]
    pub const fn group(self) -> Group {
        match self {
            Self::SO3 | Self::So3 => Group::SO3,
            Self::SE3 | Self::Se3 => Group::SE3,
        }
    }

    /// Number of scalar components stored per element.
    #[inline]
    pub const fn dimension(self) -> usize {
        match self {
            Self::SO3 => 4,
            Self::So3 => 3,
            Self::SE3 => 7,
            Self::Se3 => 6,
        }
    }

    /// Number of scalar components of the manifold (embedding)
    /// representation of the same group.
    #[inline]
    pub const fn embedding(self) -> usize {
        match self.group() {
            Group::SO3 => 4,
            Group::SE3 => 7,
        }
    }

    /// Number of scalar components of the tangent representation; the true
    /// degrees of freedom of the group.
    #[inline]
    pub const fn manifold(self) -> usize {
        match self.group() {
            Group::SO3 => 3,
            Group::SE3 => 6,
        }
    }

    /// True when elements are stored in tangent (minimal) coordinates, i.e.
    /// for the algebra types so(3) and se(3).
    #[inline]
    pub const fn on_manifold(self) -> bool {
        self.dimension() == self.manifold()
    }

    /// Conventional name of this representation.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SO3 => "SO3",
            Self::So3 => "so3",
            Self::SE3 => "SE3",
            Self::Se3 => "se3",
        }
    }

    /// The manifold type `exp` maps this tangent type onto.
    #[inline]
    pub const fn exp_type(self) -> GroupType {
        match self.group() {
            Group::SO3 => Self::SO3,
            Group::SE3 => Self::SE3,
        }
    }

    /// The tangent type `log` maps this manifold type onto.
    #[inline]
    pub const fn log_type(self) -> GroupType {
        match self.group() {
            Group::SO3 => Self::So3,
            Group::SE3 => Self::Se3,
        }
    }

    /// Exponential map: tangent element -> manifold element.
    ///
    /// # Errors
    ///
    /// [`LieError::InvalidRepresentation`] when called on a manifold type.
    pub fn exp(self, x: &LieTensor) -> Result<LieTensor, LieError> {
        if !self.on_manifold() {
            return Err(LieError::InvalidRepresentation {
                op: "exp",
                gtype: self,
            });
        }
        let b = broadcast_inputs(x.tensor(), None)?;
        let out = kernels::exp(self.group(), &b.lhs)?;
        let mut shape = b.batch_shape;
        shape.push(self.embedding());
        LieTensor::new(out.reshape(&shape)?, self.exp_type())
    }

    /// Logarithm map: manifold element -> tangent element.
    ///
    /// # Errors
    ///
    /// [`LieError::InvalidRepresentation`] when called on a tangent type.
    pub fn log(self, x: &LieTensor) -> Result<LieTensor, LieError> {
        if self.on_manifold() {
            return Err(LieError::InvalidRepresentation {
                op: "log",
                gtype: self,
            });
        }
        let b = broadcast_inputs(x.tensor(), None)?;
        let out = kernels::log(self.group(), &b.lhs)?;
        let mut shape = b.batch_shape;
        shape.push(self.manifold());
        LieTensor::new(out.reshape(&shape)?, self.log_type())
    }

    /// Group inverse, preserving the representation tag.
    ///
    /// On a tangent type the algebra is a vector space and the inverse is
    /// the additive negation of the coordinates; no kernel is involved. On a
    /// manifold type this dispatches to the `inv` kernel.
    pub fn inv(self, x: &LieTensor) -> Result<LieTensor, LieError> {
        if self.on_manifold() {
            return LieTensor::new(x.tensor().map(|v| -v), self);
        }
        let b = broadcast_inputs(x.tensor(), None)?;
        let out = kernels::inv(self.group(), &b.lhs)?;
        let mut shape = b.batch_shape;
        shape.push(self.embedding());
        LieTensor::new(out.reshape(&shape)?, self)
    }

    /// Produces a batch of identity elements with the given batch shape.
    ///
    /// Manifold types expand the identity coordinates; tangent types derive
    /// theirs as `log(identity)` of the manifold partner, keeping a single
    /// source of truth for what "identity" means.
    pub fn identity(self, batch: &[usize]) -> Result<LieTensor, LieError> {
        match self {
            Self::SO3 => LieTensor::new(
                Tensor::from_batch_row(batch, &[0.0, 0.0, 0.0, 1.0]),
                self,
            ),
            Self::SE3 => LieTensor::new(
                Tensor::from_batch_row(batch, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
                self,
            ),
            Self::So3 => Self::SO3.identity(batch)?.log(),
            Self::Se3 => Self::SE3.identity(batch)?.log(),
        }
    }

    /// Alias of [`GroupType::identity`] with the same arguments.
    #[inline]
    pub fn identity_like(self, batch: &[usize]) -> Result<LieTensor, LieError> {
        self.identity(batch)
    }

    /// Draws a batch of random elements from a zero-mean Gaussian in the
    /// tangent space, scaled by `sigma`.
    ///
    /// Tangent types return the raw draw; manifold types map it through the
    /// exponential so the result is a valid group element. Either way the
    /// sample is a fresh leaf: its gradient marker is cleared, and callers
    /// opt back in with [`LieTensor::requires_grad_`]. Both representations
    /// therefore expose identical sampling statistics and identical
    /// gradient-tracking semantics.
    pub fn randn(self, batch: &[usize], sigma: f32) -> Result<LieTensor, LieError> {
        match self {
            Self::So3 | Self::Se3 => {
                let mut shape = batch.to_vec();
                shape.push(self.manifold());
                let numel = shape.iter().product::<usize>();
                let mut rng = rand::rng();
                let data = (0..numel)
                    .map(|_| sigma * rng.sample::<f32, _>(StandardNormal))
                    .collect();
                let t = Tensor::from_shape_vec(&shape, data)?;
                LieTensor::new(t.detach(), self)
            }
            Self::SO3 => Ok(Self::So3.randn(batch, sigma)?.exp()?.detach()),
            Self::SE3 => Ok(Self::Se3.randn(batch, sigma)?.exp()?.detach()),
        }
    }

    /// Sampling alias of [`GroupType::randn`] with `sigma` fixed to 1.
    #[inline]
    pub fn randn_like(self, batch: &[usize]) -> Result<LieTensor, LieError> {
        self.randn(batch, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_table() {
        // (dimension, embedding, manifold, on_manifold) per representation
        assert_eq!(GroupType::SO3.dimension(), 4);
        assert_eq!(GroupType::SO3.embedding(), 4);
        assert_eq!(GroupType::SO3.manifold(), 3);
        assert!(!GroupType::SO3.on_manifold());

        assert_eq!(GroupType::So3.dimension(), 3);
        assert!(GroupType::So3.on_manifold());

        assert_eq!(GroupType::SE3.dimension(), 7);
        assert_eq!(GroupType::SE3.manifold(), 6);
        assert!(!GroupType::SE3.on_manifold());

        assert_eq!(GroupType::Se3.dimension(), 6);
        assert!(GroupType::Se3.on_manifold());
    }

    #[test]
    fn test_group_family() {
        assert_eq!(GroupType::SO3.group(), Group::SO3);
        assert_eq!(GroupType::So3.group(), Group::SO3);
        assert_eq!(GroupType::SE3.group(), Group::SE3);
        assert_eq!(GroupType::Se3.group(), Group::SE3);
        assert_eq!(Group::SO3 as u8, 1);
        assert_eq!(Group::SE3 as u8, 3);
    }

    #[test]
    fn test_partner_types() {
        assert_eq!(GroupType::So3.exp_type(), GroupType::SO3);
        assert_eq!(GroupType::Se3.exp_type(), GroupType::SE3);
        assert_eq!(GroupType::SO3.log_type(), GroupType::So3);
        assert_eq!(GroupType::SE3.log_type(), GroupType::Se3);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(GroupType::SO3.to_string(), "SO3");
        assert_eq!(GroupType::So3.to_string(), "so3");
        assert_eq!(GroupType::Se3.to_string(), "se3");
    }

    #[test]
    fn test_identity_rows() -> Result<(), LieError> {
        let e = GroupType::SO3.identity(&[2])?;
        assert_eq!(e.tensor().as_slice(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

        // derived compositionally via log(identity)
        let z = GroupType::Se3.identity(&[3])?;
        assert_eq!(z.gtype(), GroupType::Se3);
        assert!(z.tensor().as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn test_randn_zero_sigma_is_identity() -> Result<(), LieError> {
        for gtype in [
            GroupType::SO3,
            GroupType::So3,
            GroupType::SE3,
            GroupType::Se3,
        ] {
            let x = gtype.randn(&[2, 2], 0.0)?;
            let e = gtype.identity(&[2, 2])?;
            assert_eq!(x.tensor().as_slice(), e.tensor().as_slice(), "{gtype}");
        }
        Ok(())
    }

    #[test]
    fn test_randn_is_detached() -> Result<(), LieError> {
        let x = GroupType::SE3.randn(&[4], 0.5)?;
        assert!(!x.requires_grad());
        let tracked = x.requires_grad_(true);
        assert!(tracked.requires_grad());
        Ok(())
    }

    #[test]
    fn test_exp_rejected_on_manifold_type() -> Result<(), LieError> {
        let g = GroupType::SO3.identity(&[1])?;
        match g.exp() {
            Err(LieError::InvalidRepresentation { op: "exp", .. }) => Ok(()),
            other => panic!("expected InvalidRepresentation, got {other:?}"),
        }
    }

    #[test]
    fn test_log_rejected_on_tangent_type() -> Result<(), LieError> {
        let t = GroupType::So3.identity(&[1])?;
        match t.log() {
            Err(LieError::InvalidRepresentation { op: "log", .. }) => Ok(()),
            other => panic!("expected InvalidRepresentation, got {other:?}"),
        }
    }
}
