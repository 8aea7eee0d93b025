use num_traits::{Float, FloatConst, NumCast};

/// Wraps an angle in radians back into range.
///
/// Values already inside [-PI, PI] are returned untouched. Anything outside
/// lands in [-PI, PI]: odd multiples of PI map to -PI from above and to PI
/// from below.
pub fn wrap_neg_pi_to_pi<T: Float + FloatConst>(value: T) -> T {
    let pi = T::PI();
    if value >= -pi && value <= pi {
        return value;
    }

    let two_pi = pi + pi;
    // `%` keeps the sign of the dividend (fmod)
    if value > T::zero() {
        (value + pi) % two_pi - pi
    } else {
        (value - pi) % two_pi + pi
    }
}

/// Degrees to radians
pub fn radians<T: Float + FloatConst>(value: T) -> T {
    T::PI() * value / from_f32(180.0)
}

/// Radians to degrees
pub fn degrees<T: Float + FloatConst>(value: T) -> T {
    from_f32::<T>(180.0) * value / T::PI()
}

fn from_f32<T: Float>(value: f32) -> T {
    <T as NumCast>::from(value).unwrap_or_else(T::nan)
}
