use atlas_tensor::{broadcast_pair, Tensor};

use crate::error::LieError;
use crate::group::GroupType;
use crate::kernels;

/// A batch of group elements: a coordinate array tagged with a
/// [`GroupType`].
///
/// The backing array has shape `(b1, ..., bk, D)` where the leading axes
/// form the *batch shape* and the trailing axis holds the `D` coordinates of
/// each element, with `D` equal to the tag's
/// [`dimension`](GroupType::dimension). The invariant is checked at
/// construction.
///
/// All group operations broadcast operand batch shapes per the standard
/// rule, dispatch to the kernel family selected by the tag, restore the
/// batch axes on the output and keep the gradient marker as the OR of the
/// operand markers.
///
/// # Examples
///
/// ```rust
/// use atlas_lie::{GroupType, LieTensor};
/// use atlas_tensor::Tensor;
///
/// let q = Tensor::from_shape_vec(&[1, 4], vec![0.0, 0.0, 0.0, 1.0])?;
/// let g = LieTensor::new(q, GroupType::SO3)?;
/// let t = g.log()?;
/// assert_eq!(t.gtype(), GroupType::So3);
/// assert_eq!(t.tensor().as_slice(), &[0.0, 0.0, 0.0]);
/// # Ok::<(), atlas_lie::LieError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LieTensor {
    data: Tensor,
    gtype: GroupType,
}

impl LieTensor {
    /// Wraps a coordinate array with a group type tag.
    ///
    /// # Errors
    ///
    /// [`LieError::DimensionInvalid`] when the trailing axis differs from
    /// the tag's declared dimension.
    pub fn new(data: Tensor, gtype: GroupType) -> Result<Self, LieError> {
        let actual = data.shape.last().copied().unwrap_or(0);
        if actual != gtype.dimension() {
            return Err(LieError::DimensionInvalid {
                expected: gtype.dimension(),
                actual,
            });
        }
        Ok(Self { data, gtype })
    }

    /// The group type tag.
    #[inline]
    pub fn gtype(&self) -> GroupType {
        self.gtype
    }

    /// The batch shape: the array shape minus the trailing coordinate axis.
    #[inline]
    pub fn gshape(&self) -> &[usize] {
        &self.data.shape[..self.data.shape.len() - 1]
    }

    /// The backing coordinate array.
    #[inline]
    pub fn tensor(&self) -> &Tensor {
        &self.data
    }

    /// Consumes the element and returns the backing array.
    #[inline]
    pub fn into_tensor(self) -> Tensor {
        self.data
    }

    /// Whether this element is marked for gradient tracking.
    #[inline]
    pub fn requires_grad(&self) -> bool {
        self.data.requires_grad()
    }

    /// Sets the gradient-tracking marker, builder style.
    #[inline]
    pub fn requires_grad_(mut self, requires_grad: bool) -> Self {
        self.data = self.data.requires_grad_(requires_grad);
        self
    }

    /// Clears the gradient-tracking marker.
    #[inline]
    pub fn detach(mut self) -> Self {
        self.data = self.data.detach();
        self
    }

    /// Exponential map into the manifold partner type.
    #[inline]
    pub fn exp(&self) -> Result<LieTensor, LieError> {
        self.gtype.exp(self)
    }

    /// Logarithm map into the tangent partner type.
    #[inline]
    pub fn log(&self) -> Result<LieTensor, LieError> {
        self.gtype.log(self)
    }

    /// Group inverse, preserving the tag.
    #[inline]
    pub fn inv(&self) -> Result<LieTensor, LieError> {
        self.gtype.inv(self)
    }

    /// Group composition `self ∘ other`.
    ///
    /// Both operands must carry the same manifold tag; batch shapes are
    /// broadcast.
    pub fn mul(&self, other: &LieTensor) -> Result<LieTensor, LieError> {
        self.require_manifold("mul")?;
        if other.gtype != self.gtype {
            return Err(LieError::GroupMismatch {
                lhs: self.gtype,
                rhs: other.gtype,
            });
        }
        let (lhs, rhs, batch) = broadcast_pair(&self.data, &other.data)?;
        let out = kernels::mul(self.gtype.group(), &lhs, &rhs)?;
        let mut shape = batch;
        shape.push(self.gtype.embedding());
        LieTensor::new(out.reshape(&shape)?, self.gtype)
    }

    /// Retraction `exp(a) ∘ self`: applies a tangent-space increment to a
    /// manifold element. This is the standard update step for optimizers
    /// working in the tangent space.
    pub fn retr(&self, a: &Tensor) -> Result<LieTensor, LieError> {
        self.require_manifold("retr")?;
        let delta = LieTensor::new(a.clone(), self.gtype.log_type())?;
        delta.exp()?.mul(self)
    }

    /// Adjoint transport `Ad(X) · a` of a batch of tangent vectors.
    pub fn adj(&self, a: &Tensor) -> Result<Tensor, LieError> {
        self.tangent_op("adj", a, kernels::adj)
    }

    /// Transposed adjoint transport `a · Ad(X)`.
    pub fn adj_t(&self, a: &Tensor) -> Result<Tensor, LieError> {
        self.tangent_op("adj_t", a, kernels::adj_t)
    }

    /// Applies the inverse left Jacobian at `log(self)` to a batch of
    /// tangent vectors.
    pub fn jinv(&self, a: &Tensor) -> Result<Tensor, LieError> {
        self.tangent_op("jinv", a, kernels::jinv)
    }

    /// Action of the group elements on a batch of points.
    ///
    /// Points with 3 trailing components are Euclidean; 4 components are
    /// homogeneous. Anything else is rejected with
    /// [`LieError::InvalidPointShape`].
    pub fn act(&self, p: &Tensor) -> Result<Tensor, LieError> {
        self.require_manifold("act")?;
        let kernel = match p.shape.last().copied().unwrap_or(0) {
            3 => kernels::act3,
            4 => kernels::act4,
            actual => return Err(LieError::InvalidPointShape { actual }),
        };
        let d_out = p.shape.last().copied().unwrap_or(0);
        let (lhs, rhs, batch) = broadcast_pair(&self.data, p)?;
        let out = kernel(self.gtype.group(), &lhs, &rhs)?;
        let mut shape = batch;
        shape.push(d_out);
        Ok(out.reshape(&shape)?)
    }

    /// Converts each element to its dense 4x4 homogeneous matrix.
    ///
    /// The output has shape `batch + [4, 4]`, row-major.
    pub fn matrix(&self) -> Result<Tensor, LieError> {
        self.require_manifold("matrix")?;
        let out = kernels::to_matrix(self.gtype.group(), &self.flat()?)?;
        let mut shape = self.gshape().to_vec();
        shape.extend_from_slice(&[4, 4]);
        Ok(out.reshape(&shape)?)
    }

    /// The translation component of each element, as the action on the
    /// homogeneous origin `[0, 0, 0, 1]`.
    pub fn translation(&self) -> Result<Tensor, LieError> {
        self.require_manifold("translation")?;
        let origin = Tensor::from_batch_row(&[], &[0.0, 0.0, 0.0, 1.0]);
        self.act(&origin)
    }

    /// The translation component as 3-vectors, dropping the homogeneous 1.
    pub fn translation_xyz(&self) -> Result<Tensor, LieError> {
        let t = self.translation()?;
        let mut shape = self.gshape().to_vec();
        shape.push(3);
        let data = t
            .as_slice()
            .chunks_exact(4)
            .flat_map(|row| row[..3].iter().copied())
            .collect();
        let out = Tensor::from_shape_vec(&shape, data)?;
        Ok(out.requires_grad_(t.requires_grad()))
    }

    fn require_manifold(&self, op: &'static str) -> Result<(), LieError> {
        if self.gtype.on_manifold() {
            return Err(LieError::InvalidRepresentation {
                op,
                gtype: self.gtype,
            });
        }
        Ok(())
    }

    /// Collapses the batch axes to the flat `(N, D)` kernel layout.
    fn flat(&self) -> Result<Tensor, LieError> {
        let n = self.gshape().iter().product::<usize>();
        Ok(self.data.clone().reshape(&[n, self.gtype.dimension()])?)
    }

    /// Shared shape handling for the adjoint-family operations, which all
    /// take a `(..., manifold)` tangent operand and preserve its trailing
    /// axis.
    fn tangent_op(
        &self,
        op: &'static str,
        a: &Tensor,
        kernel: fn(crate::group::Group, &Tensor, &Tensor) -> Result<Tensor, LieError>,
    ) -> Result<Tensor, LieError> {
        self.require_manifold(op)?;
        let expected = self.gtype.manifold();
        let actual = a.shape.last().copied().unwrap_or(0);
        if actual != expected {
            return Err(LieError::DimensionInvalid { expected, actual });
        }
        let (lhs, rhs, batch) = broadcast_pair(&self.data, a)?;
        let out = kernel(self.gtype.group(), &lhs, &rhs)?;
        let mut shape = batch;
        shape.push(expected);
        Ok(out.reshape(&shape)?)
    }
}

impl std::fmt::Display for LieTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} group of batch shape {:?}",
            self.gtype,
            self.gshape()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn close(a: &[f32], b: &[f32], eps: f32) {
        assert_eq!(a.len(), b.len());
        for (&x, &y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x, y, epsilon = eps);
        }
    }

    #[test]
    fn test_construction_checks_trailing_axis() {
        let bad = LieTensor::new(Tensor::zeros(&[2, 3]), GroupType::SO3);
        assert_eq!(
            bad,
            Err(LieError::DimensionInvalid {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_identity_log_is_zero() -> Result<(), LieError> {
        let q = Tensor::from_shape_vec(&[4], vec![0.0, 0.0, 0.0, 1.0])?;
        let g = LieTensor::new(q, GroupType::SO3)?;
        let t = g.log()?;
        assert_eq!(t.gtype(), GroupType::So3);
        assert_eq!(t.tensor().as_slice(), &[0.0, 0.0, 0.0]);

        // conjugate convention: the identity is its own inverse
        let inv = g.inv()?;
        close(inv.tensor().as_slice(), &[0.0, 0.0, 0.0, 1.0], 1e-6);
        Ok(())
    }

    #[test]
    fn test_tangent_inv_is_negation() -> Result<(), LieError> {
        let t = LieTensor::new(
            Tensor::from_shape_vec(&[2, 3], vec![0.1, -0.2, 0.3, 0.0, 0.5, -0.4])?,
            GroupType::So3,
        )?;
        let n = t.inv()?;
        assert_eq!(n.gtype(), GroupType::So3);
        close(
            n.tensor().as_slice(),
            &[-0.1, 0.2, -0.3, 0.0, -0.5, 0.4],
            1e-6,
        );
        // involution, trivially
        assert_eq!(n.inv()?.tensor().as_slice(), t.tensor().as_slice());
        Ok(())
    }

    #[test]
    fn test_mul_requires_matching_tags() -> Result<(), LieError> {
        let a = GroupType::SO3.identity(&[2])?;
        let b = GroupType::SE3.identity(&[2])?;
        match a.mul(&b) {
            Err(LieError::GroupMismatch { .. }) => {}
            other => panic!("expected GroupMismatch, got {other:?}"),
        }
        let t = GroupType::So3.identity(&[2])?;
        match t.mul(&t) {
            Err(LieError::InvalidRepresentation { op: "mul", .. }) => {}
            other => panic!("expected InvalidRepresentation, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_retr_at_identity_is_exp() -> Result<(), LieError> {
        let g = GroupType::SO3.identity(&[1])?;
        let a = Tensor::from_shape_vec(&[1, 3], vec![0.2, -0.1, 0.3])?;
        let stepped = g.retr(&a)?;
        let expected = LieTensor::new(a, GroupType::So3)?.exp()?;
        close(
            stepped.tensor().as_slice(),
            expected.tensor().as_slice(),
            1e-6,
        );
        Ok(())
    }

    #[test]
    fn test_act_identity_preserves_points() -> Result<(), LieError> {
        let e = GroupType::SE3.identity(&[2])?;
        let p3 = Tensor::from_shape_vec(&[2, 3], vec![1.0, 2.0, 3.0, -1.0, 0.5, 2.0])?;
        let out = e.act(&p3)?;
        assert_eq!(out.shape, [2, 3]);
        close(out.as_slice(), p3.as_slice(), 1e-6);

        let p4 = Tensor::from_shape_vec(&[1, 4], vec![1.0, 2.0, 3.0, 1.0])?;
        let out = e.act(&p4)?;
        assert_eq!(out.shape, [2, 4]);
        close(&out.as_slice()[..4], p4.as_slice(), 1e-6);
        Ok(())
    }

    #[test]
    fn test_act_rejects_odd_points() -> Result<(), LieError> {
        let e = GroupType::SE3.identity(&[1])?;
        let p = Tensor::zeros(&[1, 5]);
        assert_eq!(e.act(&p), Err(LieError::InvalidPointShape { actual: 5 }));
        Ok(())
    }

    #[test]
    fn test_matrix_of_identity() -> Result<(), LieError> {
        let e = GroupType::SE3.identity(&[2])?;
        let m = e.matrix()?;
        assert_eq!(m.shape, [2, 4, 4]);
        for block in m.as_slice().chunks_exact(16) {
            for (i, &v) in block.iter().enumerate() {
                let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
                assert_relative_eq!(v, expected, epsilon = 1e-6);
            }
        }
        Ok(())
    }

    #[test]
    fn test_translation() -> Result<(), LieError> {
        let g = LieTensor::new(
            Tensor::from_shape_vec(&[1, 7], vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0])?,
            GroupType::SE3,
        )?;
        let t = g.translation()?;
        assert_eq!(t.shape, [1, 4]);
        close(t.as_slice(), &[1.0, 2.0, 3.0, 1.0], 1e-6);
        let t3 = g.translation_xyz()?;
        assert_eq!(t3.shape, [1, 3]);
        close(t3.as_slice(), &[1.0, 2.0, 3.0], 1e-6);
        Ok(())
    }

    #[test]
    fn test_requires_grad_or_propagation() -> Result<(), LieError> {
        let a = GroupType::SO3.randn(&[2], 0.1)?.requires_grad_(true);
        let b = GroupType::SO3.randn(&[2], 0.1)?;
        assert!(a.mul(&b)?.requires_grad());
        assert!(b.mul(&a)?.requires_grad());
        assert!(!b.mul(&b)?.requires_grad());
        assert!(a.log()?.requires_grad());
        assert!(a.inv()?.requires_grad());
        Ok(())
    }

    #[test]
    fn test_display_tags_the_group() -> Result<(), LieError> {
        let e = GroupType::SE3.identity(&[2, 3])?;
        assert_eq!(e.to_string(), "SE3 group of batch shape [2, 3]");
        Ok(())
    }
}
