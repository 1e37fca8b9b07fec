use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

use crate::so3::{SO3, SMALL_ANGLE_EPSILON};

/// An element of the Lie algebra se(3): a twist `[rho, phi]`.
///
/// The translational part `rho` comes first, followed by the rotational part
/// `phi` (a rotation vector).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    /// Translational component.
    pub rho: Vec3,
    /// Rotational component (rotation vector).
    pub phi: Vec3,
}

impl Twist {
    /// The zero twist.
    pub const ZERO: Self = Self {
        rho: Vec3::ZERO,
        phi: Vec3::ZERO,
    };

    /// Creates a twist from its two parts.
    #[inline]
    pub fn new(rho: Vec3, phi: Vec3) -> Self {
        Self { rho, phi }
    }

    /// Creates a twist from `[rho, phi]` coordinates.
    #[inline]
    pub fn from_array(arr: [f32; 6]) -> Self {
        Self {
            rho: Vec3::new(arr[0], arr[1], arr[2]),
            phi: Vec3::new(arr[3], arr[4], arr[5]),
        }
    }

    /// Returns the `[rho, phi]` coordinates.
    #[inline]
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.rho.x, self.rho.y, self.rho.z, self.phi.x, self.phi.y, self.phi.z,
        ]
    }
}

/// A 3D rigid body transformation: a rotation plus a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3 {
    /// The rotational part.
    pub r: SO3,
    /// The translational part.
    pub t: Vec3,
}

impl SE3 {
    /// The identity transformation.
    pub const IDENTITY: Self = Self {
        r: SO3::IDENTITY,
        t: Vec3::ZERO,
    };

    /// Creates a transformation from a rotation and a translation.
    #[inline]
    pub fn new(rotation: SO3, translation: Vec3) -> Self {
        Self {
            r: rotation,
            t: translation,
        }
    }

    /// Creates a transformation from `[tx, ty, tz, qx, qy, qz, qw]`
    /// coordinates.
    pub fn from_array(arr: [f32; 7]) -> Self {
        Self {
            r: SO3::from_quaternion(Quat::from_xyzw(arr[3], arr[4], arr[5], arr[6])),
            t: Vec3::new(arr[0], arr[1], arr[2]),
        }
    }

    /// Returns the `[tx, ty, tz, qx, qy, qz, qw]` coordinates.
    pub fn to_array(&self) -> [f32; 7] {
        let q = self.r.to_array();
        [self.t.x, self.t.y, self.t.z, q[0], q[1], q[2], q[3]]
    }

    /// Lie algebra -> Lie group: maps a twist to a rigid transformation.
    ///
    /// The rotation is `exp(phi)` and the translation is `Jl(phi) * rho`,
    /// with `Jl` the left Jacobian of SO(3).
    pub fn exp(tau: Twist) -> Self {
        Self {
            r: SO3::exp(tau.phi),
            t: SO3::left_jacobian(tau.phi) * tau.rho,
        }
    }

    /// Lie group -> Lie algebra: maps a rigid transformation to a twist.
    pub fn log(&self) -> Twist {
        let phi = self.r.log();
        Twist {
            rho: SO3::left_jacobian_inverse(phi) * self.t,
            phi,
        }
    }

    /// The group inverse.
    pub fn inverse(&self) -> Self {
        let r_inv = self.r.inverse();
        Self {
            r: r_inv,
            t: -(r_inv * self.t),
        }
    }

    /// Transforms a 3D point: `R p + t`.
    #[inline]
    pub fn act(&self, p: Vec3) -> Vec3 {
        self.r * p + self.t
    }

    /// Transforms a homogeneous point: `[R p + w t, w]`.
    #[inline]
    pub fn act4(&self, p: Vec4) -> Vec4 {
        let r = self.r * Vec3::new(p.x, p.y, p.z) + p.w * self.t;
        Vec4::new(r.x, r.y, r.z, p.w)
    }

    /// Returns the transformation as a 4x4 homogeneous matrix.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.r.q, self.t)
    }

    /// Adjoint transport of a twist into this element's frame.
    ///
    /// Block action of `[[R, hat(t) R], [0, R]]` on `[rho, phi]`.
    pub fn adjoint(&self, tau: Twist) -> Twist {
        let r_phi = self.r * tau.phi;
        Twist {
            rho: self.r * tau.rho + self.t.cross(r_phi),
            phi: r_phi,
        }
    }

    /// Transposed adjoint transport of a twist.
    pub fn adjoint_transpose(&self, tau: Twist) -> Twist {
        let r_inv = self.r.inverse();
        Twist {
            rho: r_inv * tau.rho,
            phi: r_inv * (tau.phi - self.t.cross(tau.rho)),
        }
    }

    /// Applies the inverse left Jacobian of SE(3) at `tau` to the twist `a`.
    ///
    /// The 6x6 inverse left Jacobian has the block structure
    /// `[[Jinv, -Jinv Q Jinv], [0, Jinv]]` with `Jinv` the SO(3) inverse left
    /// Jacobian at `phi` and `Q` the mixed block of Barfoot (2017), eq. 7.86.
    pub fn left_jacobian_inverse(tau: Twist, a: Twist) -> Twist {
        let j_inv = SO3::left_jacobian_inverse(tau.phi);
        let q = Self::q_matrix(tau);
        let top_right = -(j_inv * q * j_inv);
        Twist {
            rho: j_inv * a.rho + top_right * a.phi,
            phi: j_inv * a.phi,
        }
    }

    /// The mixed block `Q(rho, phi)` of the SE(3) left Jacobian.
    pub fn q_matrix(tau: Twist) -> Mat3 {
        let rho_hat = SO3::hat(tau.rho);
        let phi_hat = SO3::hat(tau.phi);
        let theta_sq = tau.phi.dot(tau.phi);
        let theta = theta_sq.sqrt();

        let (c1, c2, c3) = if theta < SMALL_ANGLE_EPSILON {
            // Taylor limits of the three coefficients
            (1.0 / 6.0, 1.0 / 24.0, -1.0 / 120.0)
        } else {
            let t3 = theta_sq * theta;
            let t4 = theta_sq * theta_sq;
            let t5 = t4 * theta;
            (
                (theta - theta.sin()) / t3,
                (1.0 - 0.5 * theta_sq - theta.cos()) / t4,
                (theta - theta.sin() - t3 / 6.0) / t5,
            )
        };

        let pr = phi_hat * rho_hat;
        let rp = rho_hat * phi_hat;
        let prp = pr * phi_hat;

        0.5 * rho_hat + c1 * (pr + rp + prp) - c2 * (phi_hat * pr + rp * phi_hat - 3.0 * prp)
            - 0.5 * (c2 - 3.0 * c3) * (prp * phi_hat + phi_hat * prp)
    }
}

impl std::ops::Mul<SE3> for SE3 {
    type Output = SE3;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            r: self.r * rhs.r,
            t: self.t + self.r * rhs.t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = EPSILON);
        assert_relative_eq!(a.y, b.y, epsilon = EPSILON);
        assert_relative_eq!(a.z, b.z, epsilon = EPSILON);
    }

    fn sample() -> SE3 {
        SE3::exp(Twist::from_array([0.1, -0.2, 0.3, 0.2, 0.1, -0.1]))
    }

    #[test]
    fn test_identity() {
        let e = SE3::IDENTITY;
        assert_eq!(e.to_array(), [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_exp_of_zero_is_identity() {
        let e = SE3::exp(Twist::ZERO);
        assert_eq!(e.to_array(), [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_exp_log_roundtrip() {
        let tau = Twist::from_array([0.3, -0.1, 0.2, 0.1, 0.4, -0.2]);
        let log = SE3::exp(tau).log();
        assert_vec3_eq(log.rho, tau.rho);
        assert_vec3_eq(log.phi, tau.phi);
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let g = sample();
        let e = g * g.inverse();
        assert_vec3_eq(e.t, Vec3::ZERO);
        assert_relative_eq!(e.r.q.w.abs(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_compose_matches_matrix_product() {
        let a = sample();
        let b = SE3::exp(Twist::from_array([-0.2, 0.1, 0.0, 0.0, -0.3, 0.2]));
        let m = (a * b).matrix();
        let expected = a.matrix() * b.matrix();
        let max = (m - expected)
            .to_cols_array()
            .iter()
            .fold(0.0f32, |acc, x| acc.max(x.abs()));
        assert!(max < EPSILON);
    }

    #[test]
    fn test_act_matches_matrix() {
        let g = sample();
        let p = Vec3::new(1.0, -2.0, 0.5);
        let hp = g.matrix() * Vec4::new(p.x, p.y, p.z, 1.0);
        assert_vec3_eq(g.act(p), Vec3::new(hp.x, hp.y, hp.z));
    }

    #[test]
    fn test_act4_weightless_point_rotates_only() {
        let g = sample();
        let p = Vec4::new(1.0, 2.0, 3.0, 0.0);
        let out = g.act4(p);
        // w = 0 means the translation does not apply
        assert_vec3_eq(
            Vec3::new(out.x, out.y, out.z),
            g.r * Vec3::new(1.0, 2.0, 3.0),
        );
        assert_relative_eq!(out.w, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_adjoint_exp_relation() {
        // exp(Ad(X) tau) == X exp(tau) X^-1
        let g = sample();
        let tau = Twist::from_array([0.05, 0.02, -0.03, 0.04, -0.02, 0.01]);
        let lhs = SE3::exp(g.adjoint(tau));
        let rhs = g * SE3::exp(tau) * g.inverse();
        assert_vec3_eq(lhs.t, rhs.t);
        let dot = lhs.r.q.dot(rhs.r.q).abs();
        assert_relative_eq!(dot, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_adjoint_transpose_is_transpose() {
        // <Ad(X) a, b> == <a, Ad(X)^T b> for all twists
        let g = sample();
        let a = Twist::from_array([0.1, 0.2, 0.3, -0.1, 0.0, 0.2]);
        let b = Twist::from_array([-0.3, 0.1, 0.0, 0.2, 0.1, -0.2]);
        let ad_a = g.adjoint(a);
        let adt_b = g.adjoint_transpose(b);
        let lhs = ad_a.rho.dot(b.rho) + ad_a.phi.dot(b.phi);
        let rhs = a.rho.dot(adt_b.rho) + a.phi.dot(adt_b.phi);
        assert_relative_eq!(lhs, rhs, epsilon = EPSILON);
    }

    #[test]
    fn test_left_jacobian_inverse_at_zero_is_identity() {
        let a = Twist::from_array([0.3, -0.2, 0.1, 0.2, 0.0, -0.1]);
        let out = SE3::left_jacobian_inverse(Twist::ZERO, a);
        assert_vec3_eq(out.rho, a.rho);
        assert_vec3_eq(out.phi, a.phi);
    }

    #[test]
    fn test_q_matrix_small_angle() {
        // Q -> 0.5 hat(rho) as phi -> 0
        let tau = Twist::new(Vec3::new(0.2, -0.1, 0.3), Vec3::ZERO);
        let q = SE3::q_matrix(tau);
        let expected = 0.5 * SO3::hat(tau.rho);
        let max = (q - expected)
            .to_cols_array()
            .iter()
            .fold(0.0f32, |acc, x| acc.max(x.abs()));
        assert!(max < EPSILON);
    }
}
