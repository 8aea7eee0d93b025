use log::debug;
use nalgebra::{RealField, SMatrix, SVector};

/// Symmetric set of `2N` points around a mean, each of dimension `D`.
///
/// `plus[i]` and `minus[i]` form the i-th pair. Points pushed through a model
/// keep their pairing, so a mapped set still lines up index for index with the
/// set it came from.
#[derive(Debug, Clone)]
pub struct SigmaPoints<T: RealField + Copy, const N: usize, const D: usize = N> {
    plus: [SVector<T, D>; N],
    minus: [SVector<T, D>; N],
}

impl<T: RealField + Copy, const N: usize> SigmaPoints<T, N> {
    /// Spreads points along the columns of the lower Cholesky factor of
    /// `N * covariance`.
    ///
    /// A covariance that is not positive definite produces NaN points instead
    /// of failing, the NaNs then show up in whatever is computed from them.
    pub fn new(state: &SVector<T, N>, covariance: &SMatrix<T, N, N>) -> Self {
        let scaled = covariance * nalgebra::convert::<f64, T>(N as f64);

        let Some(cholesky) = scaled.cholesky() else {
            debug!("ukf: covariance is not positive definite, sigma points are NaN");
            let invalid = SVector::from_element(nan());
            return Self {
                plus: [invalid; N],
                minus: [invalid; N],
            };
        };

        let delta = cholesky.l();
        Self {
            plus: core::array::from_fn(|i| state + delta.column(i)),
            minus: core::array::from_fn(|i| state - delta.column(i)),
        }
    }
}

impl<T: RealField + Copy, const N: usize, const D: usize> SigmaPoints<T, N, D> {
    /// All `2N` points, plus side first
    pub fn iter(&self) -> impl Iterator<Item = &SVector<T, D>> {
        self.plus.iter().chain(self.minus.iter())
    }

    pub fn map<const M: usize, F>(&self, mut f: F) -> SigmaPoints<T, N, M>
    where
        F: FnMut(&SVector<T, D>) -> SVector<T, M>,
    {
        SigmaPoints {
            plus: core::array::from_fn(|i| f(&self.plus[i])),
            minus: core::array::from_fn(|i| f(&self.minus[i])),
        }
    }

    /// Uniform-weight average
    pub fn mean(&self) -> SVector<T, D> {
        self.iter().fold(SVector::zeros(), |sum, point| sum + point) * weight::<T, N>()
    }

    /// Spread around `center`, divided by `2N` rather than `2N - 1`
    pub fn covariance(&self, center: &SVector<T, D>) -> SMatrix<T, D, D> {
        self.iter().fold(SMatrix::zeros(), |sum, point| {
            let c = point - center;
            sum + c * c.transpose()
        }) * weight::<T, N>()
    }

    pub fn cross_covariance<const M: usize>(
        &self,
        center: &SVector<T, D>,
        other: &SigmaPoints<T, N, M>,
        other_center: &SVector<T, M>,
    ) -> SMatrix<T, D, M> {
        self.iter()
            .zip(other.iter())
            .fold(SMatrix::zeros(), |sum, (x, y)| {
                sum + (x - center) * (y - other_center).transpose()
            })
            * weight::<T, N>()
    }
}

fn weight<T: RealField + Copy, const N: usize>() -> T {
    T::one() / nalgebra::convert::<f64, T>((2 * N) as f64)
}

pub(crate) fn nan<T: RealField + Copy>() -> T {
    nalgebra::convert(f64::NAN)
}
