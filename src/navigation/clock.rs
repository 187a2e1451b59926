use nalgebra::{DMatrix, DVector, Quaternion, Vector3};

use crate::{
    coords::{Ecef, Geodetic},
    navigation::ins::InertialState,
};

/// One receiver clock solution, kept in range units.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct ClockState {
    /// Receiver clock error [m]
    pub bias_m: f64,
    /// Receiver clock error rate [m/s]
    pub drift_m_s: f64,
}

/// [InertialState] extended with receiver clock (bias, drift) pairs.
///
/// Each clock appends two error-state rows after the base state, modeled
/// as first-order Gauss-Markov processes:
///
/// ```text
/// A[bias ][bias ] += -beta_bias     A[bias][drift] += 1
/// A[drift][drift] += -beta_drift
/// B[bias ][q_bias ] += 1
/// B[drift][q_drift] += 1
/// ```
#[derive(Debug, Clone)]
pub struct ClockAugmented<I: InertialState> {
    ins: I,
    clocks: Vec<ClockState>,
    beta_bias: f64,
    beta_drift: f64,
}

impl<I: InertialState> ClockAugmented<I> {
    pub fn new(ins: I, clocks: usize, beta_bias: f64, beta_drift: f64) -> Self {
        Self {
            ins,
            clocks: vec![ClockState::default(); clocks],
            beta_bias,
            beta_drift,
        }
    }

    pub fn ins(&self) -> &I {
        &self.ins
    }

    pub fn ins_mut(&mut self) -> &mut I {
        &mut self.ins
    }

    pub fn num_clocks(&self) -> usize {
        self.clocks.len()
    }

    pub fn clock(&self, index: usize) -> &ClockState {
        &self.clocks[index]
    }

    pub fn clock_mut(&mut self, index: usize) -> &mut ClockState {
        &mut self.clocks[index]
    }

    /// Error-state row of clock `index`'s bias; its drift row follows.
    pub fn clock_err_row(&self, index: usize) -> usize {
        self.ins.err_state_len() + 2 * index
    }
}

impl<I: InertialState> InertialState for ClockAugmented<I> {
    fn err_state_len(&self) -> usize {
        self.ins.err_state_len() + 2 * self.clocks.len()
    }

    fn noise_len(&self) -> usize {
        self.ins.noise_len() + 2 * self.clocks.len()
    }

    fn position(&self) -> Geodetic {
        self.ins.position()
    }

    fn position_ecef(&self) -> Ecef {
        self.ins.position_ecef()
    }

    fn velocity_ecef(&self) -> Vector3<f64> {
        self.ins.velocity_ecef()
    }

    fn q_e2n(&self) -> Quaternion<f64> {
        self.ins.q_e2n()
    }

    fn update(&mut self, accel: &Vector3<f64>, gyro: &Vector3<f64>, delta_t: f64) {
        for clock in &mut self.clocks {
            clock.bias_m += clock.drift_m_s * delta_t;
        }
        self.ins.update(accel, gyro, delta_t);
    }

    fn get_ab(&self, accel: &Vector3<f64>, gyro: &Vector3<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let (a_base, b_base) = self.ins.get_ab(accel, gyro);
        let p_base = a_base.nrows();
        let q_base = b_base.ncols();
        let appended = 2 * self.clocks.len();

        let mut a = DMatrix::zeros(p_base + appended, p_base + appended);
        a.view_mut((0, 0), (p_base, p_base)).copy_from(&a_base);
        for clock in 0..self.clocks.len() {
            let row = p_base + 2 * clock;
            a[(row, row)] += -self.beta_bias;
            a[(row, row + 1)] += 1.0; // d(bias)/dt = drift
            a[(row + 1, row + 1)] += -self.beta_drift;
        }

        let mut b = DMatrix::zeros(p_base + appended, q_base + appended);
        b.view_mut((0, 0), (p_base, q_base)).copy_from(&b_base);
        for appended_row in 0..appended {
            b[(p_base + appended_row, q_base + appended_row)] += 1.0;
        }

        (a, b)
    }

    fn correct(&mut self, x_hat: &DVector<f64>) {
        let p_base = self.ins.err_state_len();
        for (clock, state) in self.clocks.iter_mut().enumerate() {
            state.bias_m -= x_hat[p_base + 2 * clock];
            state.drift_m_s -= x_hat[p_base + 2 * clock + 1];
        }
        self.ins.correct(x_hat);
    }
}
