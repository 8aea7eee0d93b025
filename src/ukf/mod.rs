//! Unscented Kalman Filter, as described in "Optimal State Estimation" by
//! Dan Simon, in the `2N` sigma point form without a center point.
//!
//! The filter never stops on bad numbers. A non-finite state latches
//! [`FilterError`] and the result is committed anyway; the control loop is
//! expected to poll [`UkfFilter::error`] and [`UkfFilter::reset`] when needed.

mod sigma;

use core::fmt;

use log::{debug, warn};
use nalgebra::{RealField, SMatrix, SVector};

pub use sigma::SigmaPoints;

pub type State<T, const N: usize> = SVector<T, N>;
pub type Covariance<T, const N: usize> = SMatrix<T, N, N>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    /// Prediction produced a non-finite state
    NanState,
    /// Measurement update produced a non-finite state
    NanMeasurement,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NanState => f.write_str("non-finite state after predict"),
            Self::NanMeasurement => f.write_str("non-finite state after measurement update"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UkfFilter<T: RealField + Copy, const N: usize> {
    state: State<T, N>,
    covariance: Covariance<T, N>,
    /// Noise added per second of prediction
    process_noise: Covariance<T, N>,
    error: Option<FilterError>,
}

impl<T: RealField + Copy, const N: usize> UkfFilter<T, N> {
    pub fn new(
        initial_state: State<T, N>,
        initial_covariance: Covariance<T, N>,
        process_noise: Covariance<T, N>,
    ) -> Self {
        Self {
            state: initial_state,
            covariance: initial_covariance,
            process_noise,
            error: None,
        }
    }

    pub fn with_process_noise(mut self, process_noise: Covariance<T, N>) -> Self {
        self.process_noise = process_noise;
        self
    }

    /// First error seen since construction or the last [`UkfFilter::reset`]
    pub fn error(&self) -> Option<FilterError> {
        self.error
    }

    pub fn state(&self) -> &State<T, N> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State<T, N> {
        &mut self.state
    }

    pub fn covariance(&self) -> &Covariance<T, N> {
        &self.covariance
    }

    pub fn covariance_mut(&mut self) -> &mut Covariance<T, N> {
        &mut self.covariance
    }

    pub fn process_noise(&self) -> &Covariance<T, N> {
        &self.process_noise
    }

    pub fn set_process_noise(&mut self, process_noise: Covariance<T, N>) {
        self.process_noise = process_noise;
    }

    /// Starts over from a known estimate and clears the latched error.
    /// Process noise is kept.
    pub fn reset(&mut self, state: State<T, N>, covariance: Covariance<T, N>) {
        *self = Self::new(state, covariance, self.process_noise);
    }

    /// Sigma points of the current estimate
    pub fn sigma_points(&self) -> SigmaPoints<T, N> {
        SigmaPoints::new(&self.state, &self.covariance)
    }

    /// Advances the estimate by `dt` seconds through `process`.
    ///
    /// Process noise is a rate, `dt * process_noise` is what gets added.
    pub fn predict<F>(&mut self, dt: T, mut process: F)
    where
        F: FnMut(&State<T, N>, T) -> State<T, N>,
    {
        // Equation 14.59
        let xhat = self.sigma_points().map(|point| process(point, dt));

        // Equation 14.60
        let xhat_minus = xhat.mean();

        // Equation 14.61
        let p_minus = xhat.covariance(&xhat_minus) + self.process_noise * dt;

        self.latch_non_finite(&xhat_minus, FilterError::NanState);

        self.state = xhat_minus;
        self.covariance = symmetrized(p_minus);
    }

    /// Folds in one measurement.
    ///
    /// `measurement_noise` is taken per call so it can follow the sensor.
    pub fn update<const M: usize, F>(
        &mut self,
        measurement_model: F,
        measurement: &SVector<T, M>,
        measurement_noise: &SMatrix<T, M, M>,
    ) where
        F: FnMut(&State<T, N>) -> SVector<T, M>,
    {
        // Equation 14.62, fresh points from the current estimate
        let sigma_points = self.sigma_points();

        // Equation 14.63
        let yhat_points = sigma_points.map(measurement_model);

        // Equation 14.64
        let yhat = yhat_points.mean();

        // Equation 14.65
        let py = yhat_points.covariance(&yhat) + measurement_noise;

        // Equation 14.66
        let pxy = sigma_points.cross_covariance(&self.state, &yhat_points, &yhat);

        // Equation 14.67
        let py_inverse = py.try_inverse().unwrap_or_else(|| {
            debug!("ukf: innovation covariance is singular");
            SMatrix::from_element(sigma::nan())
        });
        let k = pxy * py_inverse;
        let x_plus = self.state + k * (measurement - yhat);
        let p_plus = self.covariance - k * py * k.transpose();

        self.latch_non_finite(&x_plus, FilterError::NanMeasurement);

        self.state = x_plus;
        self.covariance = symmetrized(p_plus);
    }

    fn latch_non_finite(&mut self, state: &State<T, N>, error: FilterError) {
        if self.error.is_some() {
            return;
        }

        if let Some(index) = state.iter().position(|value| !value.is_finite()) {
            warn!("ukf: {} (component {})", error, index);
            self.error = Some(error);
        }
    }
}

fn symmetrized<T: RealField + Copy, const N: usize>(p: Covariance<T, N>) -> Covariance<T, N> {
    (p + p.transpose()) * nalgebra::convert::<f64, T>(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    #[allow(unused_imports)]
    use nalgebra::ComplexField;
    use nalgebra::{Matrix1, Matrix2, Matrix3, Vector1, Vector2, Vector3};

    fn filter() -> UkfFilter<f64, 3> {
        UkfFilter::new(
            Vector3::new(1.0, 0.0, -1.0),
            Matrix3::from_diagonal(&Vector3::new(0.5, 1.0, 2.0)),
            Matrix3::from_diagonal(&Vector3::new(0.1, 0.1, 0.2)),
        )
    }

    #[test]
    fn starts_without_error() {
        assert_eq!(filter().error(), None);
    }

    #[test]
    fn identity_process_adds_scaled_noise() {
        let mut ukf = filter();
        let before = *ukf.covariance();

        ukf.predict(0.5, |x, _| *x);

        assert_relative_eq!(*ukf.state(), Vector3::new(1.0, 0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(
            *ukf.covariance(),
            before + ukf.process_noise() * 0.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn process_model_receives_dt() {
        let mut ukf = filter();
        ukf.predict(0.25, |x, dt| x.add_scalar(dt));

        assert_relative_eq!(*ukf.state(), Vector3::new(1.25, 0.25, -0.75), epsilon = 1e-12);
    }

    #[test]
    fn nonlinear_steps_keep_covariance_symmetric() {
        let mut ukf = filter();

        for _ in 0..20 {
            ukf.predict(0.01, |x, dt| {
                Vector3::new(
                    x[0] + dt * x[1].sin(),
                    x[1] + dt * x[0] * x[2],
                    x[2] - dt * x[1] * x[1],
                )
            });
            ukf.update(
                |x| Vector2::new(x[0] * x[0], x[1].atan2(1.0 + x[2] * x[2])),
                &Vector2::new(1.1, 0.05),
                &Matrix2::from_diagonal(&Vector2::new(0.2, 0.1)),
            );

            let p = ukf.covariance();
            assert_eq!(*p, p.transpose());
        }
        assert_eq!(ukf.error(), None);
    }

    #[test]
    fn measurement_pulls_state_towards_observation() {
        let mut ukf = filter();
        ukf.update(|x| Vector1::new(x[0]), &Vector1::new(2.0), &Matrix1::new(0.5));

        // equal prior and measurement variance -> halfway
        assert_relative_eq!(ukf.state()[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(ukf.covariance()[(0, 0)], 0.25, epsilon = 1e-12);
        assert_relative_eq!(ukf.state()[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn nan_prediction_latches_and_still_commits() {
        let mut ukf = filter();
        ukf.predict(0.1, |x, _| Vector3::new(x[0], f64::NAN, x[2]));

        assert_eq!(ukf.error(), Some(FilterError::NanState));
        assert!(ukf.state()[1].is_nan());
    }

    #[test]
    fn nan_measurement_latches() {
        let mut ukf = filter();
        ukf.update(|x| Vector1::new(x[0]), &Vector1::new(f64::NAN), &Matrix1::new(0.5));

        assert_eq!(ukf.error(), Some(FilterError::NanMeasurement));
    }

    #[test]
    fn non_finite_measurement_model_latches() {
        let mut ukf = filter();
        ukf.update(|_| Vector1::new(f64::NAN), &Vector1::new(1.0), &Matrix1::new(0.5));

        assert_eq!(ukf.error(), Some(FilterError::NanMeasurement));
        assert!(ukf.state().iter().any(|v| v.is_nan()));
    }

    #[test]
    fn error_is_sticky() {
        let mut ukf = filter();
        ukf.predict(0.1, |_, _| Vector3::repeat(f64::INFINITY));
        assert_eq!(ukf.error(), Some(FilterError::NanState));

        // Repair the estimate by hand, later good steps keep the flag
        *ukf.state_mut() = Vector3::zeros();
        *ukf.covariance_mut() = Matrix3::identity();
        ukf.predict(0.1, |x, _| *x);
        ukf.update(|x| Vector1::new(x[2]), &Vector1::new(0.3), &Matrix1::new(1.0));
        assert!(ukf.state().iter().all(|v| v.is_finite()));
        assert_eq!(ukf.error(), Some(FilterError::NanState));

        // A second failure does not overwrite the first
        ukf.update(|x| Vector1::new(x[0]), &Vector1::new(f64::NAN), &Matrix1::new(1.0));
        assert_eq!(ukf.error(), Some(FilterError::NanState));
    }

    #[test]
    fn indefinite_covariance_is_flagged_not_panicking() {
        let mut ukf = filter();
        *ukf.covariance_mut() = -Matrix3::identity();
        ukf.predict(0.1, |x, _| *x);

        assert_eq!(ukf.error(), Some(FilterError::NanState));
    }

    #[test]
    fn singular_innovation_is_flagged() {
        let mut ukf = filter();
        // Measurement ignores the state and has no noise, Py is zero
        ukf.update(|_| Vector1::new(1.0), &Vector1::new(1.0), &Matrix1::zeros());

        assert_eq!(ukf.error(), Some(FilterError::NanMeasurement));
    }

    #[test]
    fn reset_clears_error_and_keeps_noise() {
        let mut ukf = filter().with_process_noise(Matrix3::identity() * 0.01);
        ukf.predict(0.1, |_, _| Vector3::repeat(f64::NAN));
        assert!(ukf.error().is_some());

        ukf.reset(Vector3::zeros(), Matrix3::identity());
        assert_eq!(ukf.error(), None);
        assert_eq!(*ukf.state(), Vector3::zeros());
        assert_eq!(*ukf.process_noise(), Matrix3::identity() * 0.01);
    }

    #[test]
    fn runs_in_single_precision() {
        let mut ukf = UkfFilter::<f32, 2>::new(
            Vector2::new(0.0, 1.0),
            Matrix2::identity(),
            Matrix2::identity() * 0.01,
        );
        ukf.predict(0.01, |x, dt| Vector2::new(x[0] + dt * x[1], x[1]));
        ukf.update(|x| Vector1::new(x[0]), &Vector1::new(0.02), &Matrix1::new(0.1));

        assert_eq!(ukf.error(), None);
        assert_relative_eq!(ukf.state()[1], 1.0, epsilon = 0.1);
    }

    #[test]
    fn display_names_error() {
        extern crate std;
        use std::string::ToString;

        assert_eq!(
            FilterError::NanMeasurement.to_string(),
            "non-finite state after measurement update"
        );
    }
}
