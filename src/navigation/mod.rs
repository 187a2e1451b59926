//! Tightly-coupled GNSS/INS measurement path.

use nalgebra::{DMatrix, DVector};

pub(crate) mod clock;
pub(crate) mod ins;
pub(crate) mod kalman;
pub(crate) mod sync;
pub(crate) mod tightly;

pub use clock::{ClockAugmented, ClockState};
pub use ins::{InertialState, ATTITUDE_ERR, BASE_ERR_STATE, HEIGHT_ERR, POSITION_ERR, VELOCITY_ERR};
pub use kalman::Filter;
pub use sync::{BackPropagation, DelayedUpdate};
pub use tightly::{GnssObservation, Propagation, SvMeasurement, TightlyCoupled};

/// Measurement-update payload: observation matrix, residual vector and
/// measurement covariance.
#[derive(Debug, Clone)]
pub struct CorrectInfo {
    pub h: DMatrix<f64>,
    pub z: DVector<f64>,
    pub r: DMatrix<f64>,
}

impl CorrectInfo {
    /// Number of measurement rows.
    pub fn rows(&self) -> usize {
        self.z.nrows()
    }
}
