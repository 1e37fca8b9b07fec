//! Batched kernels over flat `(N, d)` coordinate arrays.
//!
//! Every kernel is keyed by a [`Group`] family, consumes operands whose
//! batch axes were already collapsed by the broadcasting resolver, and
//! produces a flat `(N, d_out)` result. The per-element math lives in
//! `atlas-algebra`; this module only loops, converts rows and re-packs.
//!
//! Gradient markers are propagated as the logical OR of the operand markers.

use glam::{Vec3, Vec4};

use atlas_algebra::{Twist, SE3, SO3};
use atlas_tensor::Tensor;

use crate::error::LieError;
use crate::group::Group;

fn check_last_dim(x: &Tensor, expected: usize) -> Result<(), LieError> {
    let actual = x.shape.last().copied().unwrap_or(0);
    if actual != expected {
        return Err(LieError::DimensionInvalid { expected, actual });
    }
    Ok(())
}

fn so3_from_row(row: &[f32]) -> SO3 {
    SO3::from_array([row[0], row[1], row[2], row[3]])
}

fn se3_from_row(row: &[f32]) -> SE3 {
    SE3::from_array([row[0], row[1], row[2], row[3], row[4], row[5], row[6]])
}

fn vec3_from_row(row: &[f32]) -> Vec3 {
    Vec3::new(row[0], row[1], row[2])
}

fn vec4_from_row(row: &[f32]) -> Vec4 {
    Vec4::new(row[0], row[1], row[2], row[3])
}

fn twist_from_row(row: &[f32]) -> Twist {
    Twist::from_array([row[0], row[1], row[2], row[3], row[4], row[5]])
}

/// Maps each row of a flat `(N, d_in)` operand to a `d_out`-sized row.
fn map_rows<F>(x: &Tensor, d_in: usize, d_out: usize, mut f: F) -> Result<Tensor, LieError>
where
    F: FnMut(&[f32], &mut Vec<f32>),
{
    check_last_dim(x, d_in)?;
    let n = x.numel() / d_in;
    let mut data = Vec::with_capacity(n * d_out);
    for row in x.as_slice().chunks_exact(d_in) {
        f(row, &mut data);
    }
    let out = Tensor::from_shape_vec(&[n, d_out], data)?;
    Ok(out.requires_grad_(x.requires_grad()))
}

/// Zips the rows of two flat operands with equal leading size.
fn zip_rows<F>(
    x: &Tensor,
    dx: usize,
    y: &Tensor,
    dy: usize,
    d_out: usize,
    mut f: F,
) -> Result<Tensor, LieError>
where
    F: FnMut(&[f32], &[f32], &mut Vec<f32>),
{
    check_last_dim(x, dx)?;
    check_last_dim(y, dy)?;
    let n = x.numel() / dx;
    let mut data = Vec::with_capacity(n * d_out);
    for (a, b) in x
        .as_slice()
        .chunks_exact(dx)
        .zip(y.as_slice().chunks_exact(dy))
    {
        f(a, b, &mut data);
    }
    let out = Tensor::from_shape_vec(&[n, d_out], data)?;
    Ok(out.requires_grad_(x.requires_grad() || y.requires_grad()))
}

/// Exponential map kernel: `(N, manifold)` -> `(N, embedding)`.
pub fn exp(group: Group, x: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => map_rows(x, 3, 4, |row, out| {
            out.extend_from_slice(&SO3::exp(vec3_from_row(row)).to_array());
        }),
        Group::SE3 => map_rows(x, 6, 7, |row, out| {
            out.extend_from_slice(&SE3::exp(twist_from_row(row)).to_array());
        }),
    }
}

/// Logarithm map kernel: `(N, embedding)` -> `(N, manifold)`.
pub fn log(group: Group, x: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => map_rows(x, 4, 3, |row, out| {
            out.extend_from_slice(&so3_from_row(row).log().to_array());
        }),
        Group::SE3 => map_rows(x, 7, 6, |row, out| {
            out.extend_from_slice(&se3_from_row(row).log().to_array());
        }),
    }
}

/// Manifold group inverse kernel: `(N, embedding)` -> `(N, embedding)`.
pub fn inv(group: Group, x: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => map_rows(x, 4, 4, |row, out| {
            out.extend_from_slice(&so3_from_row(row).inverse().to_array());
        }),
        Group::SE3 => map_rows(x, 7, 7, |row, out| {
            out.extend_from_slice(&se3_from_row(row).inverse().to_array());
        }),
    }
}

/// Group composition kernel: `(N, embedding)` x `(N, embedding)` ->
/// `(N, embedding)`.
pub fn mul(group: Group, x: &Tensor, y: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => zip_rows(x, 4, y, 4, 4, |a, b, out| {
            out.extend_from_slice(&(so3_from_row(a) * so3_from_row(b)).to_array());
        }),
        Group::SE3 => zip_rows(x, 7, y, 7, 7, |a, b, out| {
            out.extend_from_slice(&(se3_from_row(a) * se3_from_row(b)).to_array());
        }),
    }
}

/// Adjoint transport kernel: `(N, embedding)` x `(N, manifold)` ->
/// `(N, manifold)`.
pub fn adj(group: Group, x: &Tensor, a: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => zip_rows(x, 4, a, 3, 3, |g, v, out| {
            let r = so3_from_row(g) * vec3_from_row(v);
            out.extend_from_slice(&r.to_array());
        }),
        Group::SE3 => zip_rows(x, 7, a, 6, 6, |g, v, out| {
            let r = se3_from_row(g).adjoint(twist_from_row(v));
            out.extend_from_slice(&r.to_array());
        }),
    }
}

/// Transposed adjoint transport kernel, same shapes as [`adj`].
pub fn adj_t(group: Group, x: &Tensor, a: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => zip_rows(x, 4, a, 3, 3, |g, v, out| {
            let r = so3_from_row(g).inverse() * vec3_from_row(v);
            out.extend_from_slice(&r.to_array());
        }),
        Group::SE3 => zip_rows(x, 7, a, 6, 6, |g, v, out| {
            let r = se3_from_row(g).adjoint_transpose(twist_from_row(v));
            out.extend_from_slice(&r.to_array());
        }),
    }
}

/// Left-Jacobian-inverse kernel: applies `Jl^-1(log(X))` to the tangent
/// operand, same shapes as [`adj`].
pub fn jinv(group: Group, x: &Tensor, a: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => zip_rows(x, 4, a, 3, 3, |g, v, out| {
            let phi = so3_from_row(g).log();
            let r = SO3::left_jacobian_inverse(phi) * vec3_from_row(v);
            out.extend_from_slice(&r.to_array());
        }),
        Group::SE3 => zip_rows(x, 7, a, 6, 6, |g, v, out| {
            let tau = se3_from_row(g).log();
            let r = SE3::left_jacobian_inverse(tau, twist_from_row(v));
            out.extend_from_slice(&r.to_array());
        }),
    }
}

/// Euclidean point action kernel: `(N, embedding)` x `(N, 3)` -> `(N, 3)`.
pub fn act3(group: Group, x: &Tensor, p: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => zip_rows(x, 4, p, 3, 3, |g, v, out| {
            out.extend_from_slice(&so3_from_row(g).act(vec3_from_row(v)).to_array());
        }),
        Group::SE3 => zip_rows(x, 7, p, 3, 3, |g, v, out| {
            out.extend_from_slice(&se3_from_row(g).act(vec3_from_row(v)).to_array());
        }),
    }
}

/// Homogeneous point action kernel: `(N, embedding)` x `(N, 4)` -> `(N, 4)`.
pub fn act4(group: Group, x: &Tensor, p: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => zip_rows(x, 4, p, 4, 4, |g, v, out| {
            out.extend_from_slice(&so3_from_row(g).act4(vec4_from_row(v)).to_array());
        }),
        Group::SE3 => zip_rows(x, 7, p, 4, 4, |g, v, out| {
            out.extend_from_slice(&se3_from_row(g).act4(vec4_from_row(v)).to_array());
        }),
    }
}

/// Matrix conversion kernel: `(N, embedding)` -> `(N, 16)` homogeneous
/// matrices in row-major order.
pub fn to_matrix(group: Group, x: &Tensor) -> Result<Tensor, LieError> {
    match group {
        Group::SO3 => map_rows(x, 4, 16, |row, out| {
            // glam matrices are column-major; transpose while flattening
            out.extend_from_slice(&so3_from_row(row).matrix4().transpose().to_cols_array());
        }),
        Group::SE3 => map_rows(x, 7, 16, |row, out| {
            out.extend_from_slice(&se3_from_row(row).matrix().transpose().to_cols_array());
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exp_shapes() -> Result<(), LieError> {
        let x = Tensor::zeros(&[5, 3]);
        let out = exp(Group::SO3, &x)?;
        assert_eq!(out.shape, [5, 4]);
        // exp(0) stacks identity quaternions
        assert_eq!(&out.as_slice()[..4], &[0.0, 0.0, 0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_exp_rejects_wrong_dim() {
        let x = Tensor::zeros(&[5, 4]);
        assert_eq!(
            exp(Group::SO3, &x),
            Err(LieError::DimensionInvalid {
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn test_mul_propagates_grad_marker() -> Result<(), LieError> {
        let e = Tensor::from_batch_row(&[2], &[0.0, 0.0, 0.0, 1.0]);
        let g = e.clone().requires_grad_(true);
        let out = mul(Group::SO3, &e, &g)?;
        assert!(out.requires_grad());
        let out = mul(Group::SO3, &e, &e)?;
        assert!(!out.requires_grad());
        Ok(())
    }

    #[test]
    fn test_to_matrix_identity() -> Result<(), LieError> {
        let e = Tensor::from_batch_row(&[1], &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        let m = to_matrix(Group::SE3, &e)?;
        assert_eq!(m.shape, [1, 16]);
        for (i, &v) in m.as_slice().iter().enumerate() {
            let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
            assert_relative_eq!(v, expected, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_se3_matrix_translation_column() -> Result<(), LieError> {
        let g = Tensor::from_batch_row(&[1], &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0]);
        let m = to_matrix(Group::SE3, &g)?;
        let rows = m.as_slice();
        // row-major: translation sits in the last column
        assert_relative_eq!(rows[3], 1.0);
        assert_relative_eq!(rows[7], 2.0);
        assert_relative_eq!(rows[11], 3.0);
        assert_relative_eq!(rows[15], 1.0);
        Ok(())
    }
}
