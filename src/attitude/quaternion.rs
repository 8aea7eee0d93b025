use core::ops::Mul;

use nalgebra::{Matrix3, Vector3};
#[cfg(not(feature = "std"))]
use num_traits::Float as _;

use super::Euler;

/// Sines this close to +-1 are treated as gimbal lock
const GIMBAL_LOCK_EPSILON: f32 = 1e-8;

/// Rotation as [w, x, y, z]
///
/// Nothing here renormalizes behind the caller's back: products, conjugates and
/// axis-angle construction keep whatever norm their inputs had. Only
/// [`Quaternion::normalized`] and [`Quaternion::integrate_rotation_rate`]
/// produce unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// No rotation
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotates `vector` by this orientation: q * (0, v) * q'
    pub fn rotate(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        let p = Self::new(0.0, vector.x, vector.y, vector.z);
        let q = *self * p * self.conjugated();
        Vector3::new(q.x, q.y, q.z)
    }

    /// Inverse rotation, for unit quaternions
    pub fn conjugated(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn norm(&self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Divides through by the norm. A zero quaternion comes back as NaN.
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        Self::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm)
    }

    pub fn matrix(&self) -> Matrix3<f32> {
        let Self { w, x, y, z } = *self;

        Matrix3::new(
            w * w + x * x - y * y - z * z,
            2.0 * (x * y - w * z),
            2.0 * (w * y + x * z),
            2.0 * (x * y + w * z),
            w * w - x * x + y * y - z * z,
            2.0 * (y * z - w * x),
            2.0 * (x * z - w * y),
            2.0 * (w * x + y * z),
            w * w - x * x - y * y + z * z,
        )
    }

    /// Roll, pitch, yaw in radians.
    ///
    /// Pitch saturates at +-PI/2 once its sine reaches +-1, which also keeps
    /// slightly denormalized inputs out of asin's NaN territory.
    pub fn euler_rad(&self) -> Euler {
        let Self { w, x, y, z } = *self;

        let sinr_cosp = 2.0 * (w * x + y * z);
        let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
        let roll = sinr_cosp.atan2(cosr_cosp);

        let sinp = 2.0 * (w * y - z * x);
        let pitch = if sinp >= 1.0 - GIMBAL_LOCK_EPSILON {
            core::f32::consts::FRAC_PI_2
        } else if sinp <= -1.0 + GIMBAL_LOCK_EPSILON {
            -core::f32::consts::FRAC_PI_2
        } else {
            sinp.asin()
        };

        let siny_cosp = 2.0 * (w * z + x * y);
        let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
        let yaw = siny_cosp.atan2(cosy_cosp);

        Euler { roll, pitch, yaw }
    }

    /// Roll first, then pitch, then yaw. Quaternions compose right to left, so
    /// the product reads yaw * pitch * roll.
    pub fn from_euler(roll_rad: f32, pitch_rad: f32, yaw_rad: f32) -> Self {
        Self::from_axis_angle(yaw_rad, 0.0, 0.0, 1.0)
            * Self::from_axis_angle(pitch_rad, 0.0, 1.0, 0.0)
            * Self::from_axis_angle(roll_rad, 1.0, 0.0, 0.0)
    }

    pub fn from_euler_struct(euler_rad: &Euler) -> Self {
        Self::from_euler(euler_rad.roll, euler_rad.pitch, euler_rad.yaw)
    }

    /// The axis is used as given; pass a unit axis to get a unit quaternion.
    pub fn from_axis_angle(angle_rad: f32, x: f32, y: f32, z: f32) -> Self {
        let (s, c) = (angle_rad / 2.0).sin_cos();
        Self::new(c, x * s, y * s, z * s)
    }

    /// First order step of body rates over `dt_s`.
    ///
    /// Pitch rate drives the x component and roll rate drives y, matching the
    /// body axes of the IMU mounting. Only valid for small `rate * dt`.
    pub fn integrate_rotation_rate(
        roll_rate_rps: f32,
        pitch_rate_rps: f32,
        yaw_rate_rps: f32,
        dt_s: f32,
    ) -> Self {
        Self::new(
            1.0,
            0.5 * pitch_rate_rps * dt_s,
            0.5 * roll_rate_rps * dt_s,
            0.5 * yaw_rate_rps * dt_s,
        )
        .normalized()
    }

    /// Same as [`Quaternion::integrate_rotation_rate`] with the rate already
    /// laid out along the quaternion's x, y, z axes.
    pub fn integrate_rotation_rate_vec(rate_rps: &Vector3<f32>, dt_s: f32) -> Self {
        Self::new(
            1.0,
            0.5 * rate_rps.x * dt_s,
            0.5 * rate_rps.y * dt_s,
            0.5 * rate_rps.z * dt_s,
        )
        .normalized()
    }
}

/// Hamilton product, `rhs` is applied first
impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let [a, b, c, d] = [self.w, self.x, self.y, self.z];
        let [e, f, g, h] = [rhs.w, rhs.x, rhs.y, rhs.z];

        Self::new(
            a * e - b * f - c * g - d * h,
            b * e + a * f + c * h - d * g,
            a * g - b * h + c * e + d * f,
            a * h + b * g - c * f + d * e,
        )
    }
}

impl From<nalgebra::Quaternion<f32>> for Quaternion {
    fn from(q: nalgebra::Quaternion<f32>) -> Self {
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl From<Quaternion> for nalgebra::Quaternion<f32> {
    fn from(q: Quaternion) -> Self {
        nalgebra::Quaternion::new(q.w, q.x, q.y, q.z)
    }
}
