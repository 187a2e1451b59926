use nalgebra::{DMatrix, DVector, Quaternion, Vector3};

use crate::{
    coords::{Ecef, Geodetic},
    ephemeris::Ephemeris,
    navigation::ins::{InertialState, BASE_ERR_STATE},
};

mod bias;
mod bits;
mod ephemeris;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Static stand-in for a strapdown propagator, with the standard
/// error-state layout and inert dynamics.
#[derive(Debug, Clone)]
pub struct MockIns {
    pub geodetic: Geodetic,
    pub velocity: Vector3<f64>,
    pub q_e2n: Quaternion<f64>,
    pub corrections: usize,
}

impl MockIns {
    pub fn at(geodetic: Geodetic) -> Self {
        Self {
            geodetic,
            velocity: Vector3::zeros(),
            q_e2n: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            corrections: 0,
        }
    }
}

impl InertialState for MockIns {
    fn err_state_len(&self) -> usize {
        BASE_ERR_STATE
    }

    fn noise_len(&self) -> usize {
        6
    }

    fn position(&self) -> Geodetic {
        self.geodetic
    }

    fn position_ecef(&self) -> Ecef {
        self.geodetic.to_ecef()
    }

    fn velocity_ecef(&self) -> Vector3<f64> {
        self.velocity
    }

    fn q_e2n(&self) -> Quaternion<f64> {
        self.q_e2n
    }

    fn update(&mut self, _accel: &Vector3<f64>, _gyro: &Vector3<f64>, _delta_t: f64) {}

    fn get_ab(&self, _accel: &Vector3<f64>, _gyro: &Vector3<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        (
            DMatrix::zeros(BASE_ERR_STATE, BASE_ERR_STATE),
            DMatrix::zeros(BASE_ERR_STATE, 6),
        )
    }

    fn correct(&mut self, _x_hat: &DVector<f64>) {
        self.corrections += 1;
    }
}

/// A plausible GPS ephemeris: circular-ish 55 degree orbit, references at
/// 20:00 into week 2048.
pub fn ephemeris_fixture() -> Ephemeris {
    Ephemeris {
        svid: 1,
        wn: 2048,
        ura: 0,
        sv_health: 0,
        iodc: 5,
        iode: 5,
        t_gd: 1.0E-9,
        t_oc: 72000.0,
        a_f0: 1.0E-5,
        a_f1: 1.0E-12,
        a_f2: 0.0,
        c_rs: 10.0,
        delta_n: 4.5E-9,
        m0: 1.2,
        c_uc: 2.0E-6,
        e: 0.01,
        c_us: 8.0E-6,
        sqrt_a: 5153.7552,
        t_oe: 72000.0,
        fit_interval: 4.0 * 60.0 * 60.0,
        c_ic: -1.0E-7,
        omega0: 0.5,
        c_is: 1.5E-7,
        i0: 0.958,
        c_rc: 200.0,
        omega: -1.8,
        dot_omega0: -8.0E-9,
        dot_i0: 4.0E-10,
    }
}
