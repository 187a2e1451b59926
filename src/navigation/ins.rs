use nalgebra::{DMatrix, DVector, Quaternion, Vector3};

use crate::coords::{Ecef, Geodetic};

/// First velocity error row (3 rows, navigation frame).
pub const VELOCITY_ERR: usize = 0;

/// First position error row (3 rows, small-angle error of the
/// earth-to-navigation quaternion).
pub const POSITION_ERR: usize = 3;

/// Height error row.
pub const HEIGHT_ERR: usize = 6;

/// First attitude error row (3 rows).
pub const ATTITUDE_ERR: usize = 7;

/// Error-state length of a plain inertial filter.
pub const BASE_ERR_STATE: usize = 10;

/// Inertial mechanization seam.
///
/// The clock extension and the tightly-coupled update build on any
/// strapdown propagator exposing this interface. The error state is
/// expected to follow the row layout of the constants above; extensions
/// append their rows after [InertialState::err_state_len].
pub trait InertialState: Clone {
    /// Number of error-state rows (the P dimension).
    fn err_state_len(&self) -> usize;

    /// Number of process noise inputs (the Q dimension).
    fn noise_len(&self) -> usize;

    /// Geodetic position.
    fn position(&self) -> Geodetic;

    /// ECEF position.
    fn position_ecef(&self) -> Ecef;

    /// ECEF velocity.
    fn velocity_ecef(&self) -> Vector3<f64>;

    /// Earth-to-navigation frame quaternion (scalar part in `w`).
    fn q_e2n(&self) -> Quaternion<f64>;

    /// Strapdown time update over `delta_t` seconds.
    fn update(&mut self, accel: &Vector3<f64>, gyro: &Vector3<f64>, delta_t: f64);

    /// Continuous-time error dynamics A and noise input B.
    fn get_ab(&self, accel: &Vector3<f64>, gyro: &Vector3<f64>) -> (DMatrix<f64>, DMatrix<f64>);

    /// Applies the filter correction to the full state.
    fn correct(&mut self, x_hat: &DVector<f64>);
}
