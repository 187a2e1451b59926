use nalgebra::{DMatrix, DVector};

use crate::{error::Error, navigation::CorrectInfo};

/// Error-state covariance filter.
///
/// The time update discretizes the continuous dynamics to first order,
/// `Phi = I + A dt` and `Gamma = B dt`; the measurement update returns
/// the correction to be subtracted from the full state.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Error covariance
    pub p: DMatrix<f64>,
    /// Continuous process noise (the Q dimension of the state)
    pub q: DMatrix<f64>,
}

impl Filter {
    pub fn new(p: DMatrix<f64>, q: DMatrix<f64>) -> Self {
        assert_eq!(p.nrows(), p.ncols(), "P must be square");
        assert_eq!(q.nrows(), q.ncols(), "Q must be square");
        Self { p, q }
    }

    /// Propagates the covariance over `delta_t`; returns the discrete
    /// transition `Phi` and the injected noise `Gamma Q Gamma^T` for
    /// snapshot keepers.
    pub fn predict(
        &mut self,
        a: &DMatrix<f64>,
        b: &DMatrix<f64>,
        delta_t: f64,
    ) -> (DMatrix<f64>, DMatrix<f64>) {
        let n = a.nrows();
        let mut phi = a * delta_t;
        for i in 0..n {
            phi[(i, i)] += 1.0;
        }
        let gamma = b * delta_t;
        let gqgt = &gamma * &self.q * gamma.transpose();

        self.p = &phi * &self.p * phi.transpose() + &gqgt;

        (phi, gqgt)
    }

    /// Measurement update; returns the error-state correction.
    pub fn update(&mut self, info: &CorrectInfo) -> Result<DVector<f64>, Error> {
        let h = &info.h;

        let s = h * &self.p * h.transpose() + &info.r;
        let s_inv = s.try_inverse().ok_or(Error::MatrixInversion)?;
        let gain = &self.p * h.transpose() * s_inv;

        let x_hat = &gain * &info.z;

        let n = self.p.nrows();
        self.p = (DMatrix::identity(n, n) - &gain * h) * &self.p;

        Ok(x_hat)
    }
}
