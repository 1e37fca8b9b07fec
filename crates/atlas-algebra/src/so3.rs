use glam::{Mat3, Mat4, Quat, Vec3, Vec4};
use rand::Rng;

pub(crate) const SMALL_ANGLE_EPSILON: f32 = 1.0e-8;

/// A 3D rotation, stored as a unit quaternion.
///
/// The quaternion lives in SU(2), the double cover of SO(3): `q` and `-q`
/// represent the same rotation. When comparing rotations, check both signs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SO3 {
    /// The unit quaternion, `[x, y, z, w]` with `w` the scalar part.
    pub q: Quat,
}

impl SO3 {
    /// The identity rotation.
    pub const IDENTITY: Self = Self { q: Quat::IDENTITY };

    /// Creates a rotation from a quaternion.
    ///
    /// The quaternion is expected to be normalized.
    #[inline]
    pub fn from_quaternion(q: Quat) -> Self {
        Self { q }
    }

    /// Creates a rotation from `[qx, qy, qz, qw]` coordinates.
    #[inline]
    pub fn from_array(arr: [f32; 4]) -> Self {
        Self {
            q: Quat::from_array(arr),
        }
    }

    /// Returns the `[qx, qy, qz, qw]` coordinates.
    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        self.q.to_array()
    }

    /// Creates a rotation from a 3x3 rotation matrix.
    ///
    /// One of the two antipodal quaternions is chosen; there is no globally
    /// continuous way to make this choice over the full rotation group.
    pub fn from_matrix(mat: &Mat3) -> Self {
        Self {
            q: Quat::from_mat3(mat),
        }
    }

    /// Draws a uniformly distributed random rotation (Shoemake's method).
    pub fn from_random() -> Self {
        let mut rng = rand::rng();

        let r1: f32 = rng.random();
        let r2: f32 = rng.random();
        let r3: f32 = rng.random();

        let one_minus_r1_sqrt = (1.0 - r1).sqrt();
        let r1_sqrt = r1.sqrt();

        let w = one_minus_r1_sqrt * (2.0 * std::f32::consts::PI * r2).cos();
        let x = one_minus_r1_sqrt * (2.0 * std::f32::consts::PI * r2).sin();
        let y = r1_sqrt * (2.0 * std::f32::consts::PI * r3).cos();
        let z = r1_sqrt * (2.0 * std::f32::consts::PI * r3).sin();

        Self {
            q: Quat::from_xyzw(x, y, z, w).normalize(),
        }
    }

    /// Lie algebra -> Lie group: maps a rotation vector to a rotation.
    pub fn exp(v: Vec3) -> Self {
        let theta_sq = v.dot(v);
        let theta = theta_sq.sqrt();
        let theta_half = 0.5 * theta;

        let (w, b) = if theta < SMALL_ANGLE_EPSILON {
            // Taylor expansion of cos(x/2) and sin(x/2)/x around 0
            (1.0 - theta_sq / 8.0, 0.5 - theta_sq / 48.0)
        } else {
            (theta_half.cos(), theta_half.sin() / theta)
        };

        let xyz = b * v;

        Self {
            q: Quat::from_xyzw(xyz.x, xyz.y, xyz.z, w),
        }
    }

    /// Lie group -> Lie algebra: maps a rotation to a rotation vector.
    ///
    /// The scalar part's sign is normalized first so the result stays in the
    /// ±π ball.
    pub fn log(&self) -> Vec3 {
        let mut w = self.q.w;
        let mut vec = Vec3::new(self.q.x, self.q.y, self.q.z);

        if w < 0.0 {
            w = -w;
            vec = -vec;
        }

        let theta_sq = vec.dot(vec);
        let theta = theta_sq.sqrt();

        if theta > SMALL_ANGLE_EPSILON {
            let half_theta = w.clamp(-1.0, 1.0).acos();
            vec * (2.0 * half_theta / theta)
        } else {
            // small-angle approximation
            vec * (2.0 / w)
        }
    }

    /// The group inverse (quaternion conjugate).
    #[inline]
    pub fn inverse(&self) -> Self {
        Self {
            q: self.q.conjugate(),
        }
    }

    /// Returns the rotation as a 3x3 matrix.
    #[inline]
    pub fn matrix(&self) -> Mat3 {
        Mat3::from_quat(self.q)
    }

    /// Returns the rotation as a 4x4 homogeneous matrix.
    #[inline]
    pub fn matrix4(&self) -> Mat4 {
        Mat4::from_quat(self.q)
    }

    /// The adjoint representation; for SO(3) this is the rotation matrix.
    #[inline]
    pub fn adjoint(&self) -> Mat3 {
        self.matrix()
    }

    /// Rotates a 3D point.
    #[inline]
    pub fn act(&self, p: Vec3) -> Vec3 {
        self.q * p
    }

    /// Rotates a homogeneous point, leaving the last component untouched.
    #[inline]
    pub fn act4(&self, p: Vec4) -> Vec4 {
        let r = self.q * Vec3::new(p.x, p.y, p.z);
        Vec4::new(r.x, r.y, r.z, p.w)
    }

    /// Vector space -> Lie algebra: the skew-symmetric matrix of `v`.
    pub fn hat(v: Vec3) -> Mat3 {
        let (a, b, c) = (v.x, v.y, v.z);
        Mat3::from_cols_array(&[0.0, c, -b, -c, 0.0, a, b, -a, 0.0])
    }

    /// Lie algebra -> vector space: inverse of [`SO3::hat`].
    pub fn vee(omega: Mat3) -> Vec3 {
        Vec3::new(omega.y_axis.z, omega.z_axis.x, omega.x_axis.y)
    }

    /// The left Jacobian of the exponential map at `v`.
    pub fn left_jacobian(v: Vec3) -> Mat3 {
        let skew = Self::hat(v);
        let theta_sq = v.dot(v);
        let theta = theta_sq.sqrt();

        let (a, b) = if theta < SMALL_ANGLE_EPSILON {
            (0.5 - theta_sq / 24.0, 1.0 / 6.0 - theta_sq / 120.0)
        } else {
            (
                (1.0 - theta.cos()) / theta_sq,
                (theta - theta.sin()) / (theta_sq * theta),
            )
        };

        Mat3::IDENTITY + a * skew + b * (skew * skew)
    }

    /// The inverse of the left Jacobian at `v`.
    pub fn left_jacobian_inverse(v: Vec3) -> Mat3 {
        let skew = Self::hat(v);
        let theta_sq = v.dot(v);
        let theta = theta_sq.sqrt();

        let c = if theta < SMALL_ANGLE_EPSILON {
            1.0 / 12.0 + theta_sq / 720.0
        } else {
            1.0 / theta_sq - (1.0 + theta.cos()) / (2.0 * theta * theta.sin())
        };

        Mat3::IDENTITY - 0.5 * skew + c * (skew * skew)
    }
}

impl std::ops::Mul<SO3> for SO3 {
    type Output = SO3;

    fn mul(self, rhs: Self) -> Self::Output {
        Self { q: self.q * rhs.q }
    }
}

impl std::ops::Mul<Vec3> for SO3 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        self.act(rhs)
    }
}
