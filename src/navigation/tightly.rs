use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Matrix3, Matrix3x4, Quaternion, Vector3};

use crate::{
    cfg::Config,
    constants::{EARTH_ECCENTRICITY, EARTH_SEMI_MAJOR_AXIS_M, SPEED_OF_LIGHT_M_S},
    coords::Enu,
    error::Error,
    navigation::{
        clock::ClockAugmented,
        ins::{InertialState, POSITION_ERR, VELOCITY_ERR},
        kalman::Filter,
        CorrectInfo,
    },
    space_node::SpaceNode,
    time::GpsTime,
};

/// Residual mean (in milliseconds of range) beyond which a receiver
/// clock jump is assumed. Receivers steer their clock within +/- 1 ms of
/// GPS time, so genuine jumps land close to a full millisecond.
const CLOCK_JUMP_THRESHOLD_MS: f64 = 0.9;

/// Per-satellite raw measurement of one epoch.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SvMeasurement {
    pub prn: u8,
    /// Pseudo range [m]; rows are only formed when present.
    pub range_m: Option<f64>,
    /// Range rate (Doppler) [m/s]
    pub range_rate_m_s: Option<f64>,
    /// Receiver supplied range standard deviation [m]
    pub range_sigma_m: Option<f64>,
    /// Receiver supplied rate standard deviation [m/s]
    pub rate_sigma_m_s: Option<f64>,
    /// Weight of this satellite; non-positive excludes it. Defaults to 1.
    pub weight: Option<f64>,
}

impl SvMeasurement {
    pub fn pseudo_range(prn: u8, range_m: f64) -> Self {
        Self {
            prn,
            range_m: Some(range_m),
            ..Default::default()
        }
    }

    pub fn with_rate(mut self, range_rate_m_s: f64) -> Self {
        self.range_rate_m_s = Some(range_rate_m_s);
        self
    }
}

/// One GNSS measurement epoch.
#[derive(Debug, Default, Clone)]
pub struct GnssObservation {
    /// Which receiver clock the epoch belongs to.
    pub clock_index: usize,
    /// Receiver time of the epoch.
    pub time: GpsTime,
    pub measurements: Vec<SvMeasurement>,
}

/// Discrete propagation step, as consumed by the snapshot keepers.
#[derive(Debug, Clone)]
pub struct Propagation {
    /// Continuous error dynamics
    pub a: DMatrix<f64>,
    /// Discrete transition, I + A dt
    pub phi: DMatrix<f64>,
    /// Injected process noise, Gamma Q Gamma^T
    pub gqgt: DMatrix<f64>,
    pub delta_t: f64,
}

/// Tightly-coupled GNSS/INS engine: inertial state with receiver clocks,
/// covariance filter and the per-satellite measurement model.
#[derive(Debug, Clone)]
pub struct TightlyCoupled<I: InertialState> {
    state: ClockAugmented<I>,
    filter: Filter,
    cfg: Config,
}

impl<I: InertialState> TightlyCoupled<I> {
    /// Builds the engine around a strapdown propagator. `filter` must be
    /// dimensioned for the clock-augmented state.
    pub fn new(ins: I, clocks: usize, filter: Filter, cfg: Config) -> Self {
        let state = ClockAugmented::new(ins, clocks, cfg.beta_clock_bias, cfg.beta_clock_drift);
        assert_eq!(
            filter.p.nrows(),
            state.err_state_len(),
            "P dimension does not cover the clock-augmented state"
        );
        Self { state, filter, cfg }
    }

    pub fn state(&self) -> &ClockAugmented<I> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ClockAugmented<I> {
        &mut self.state
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// Inertial time update: propagates the covariance then the state.
    pub fn propagate(
        &mut self,
        accel: &Vector3<f64>,
        gyro: &Vector3<f64>,
        delta_t: f64,
    ) -> Propagation {
        let (a, b) = self.state.get_ab(accel, gyro);
        let (phi, gqgt) = self.filter.predict(&a, &b, delta_t);
        self.state.update(accel, gyro, delta_t);
        Propagation {
            a,
            phi,
            gqgt,
            delta_t,
        }
    }

    /// Measurement update with automatic clock jump handling.
    ///
    /// The satellite catalog is expected to have its ephemerides selected
    /// for the epoch (see [SpaceNode::update_all_ephemeris]).
    pub fn correct(&mut self, space: &SpaceNode, obs: &GnssObservation) -> Result<(), Error> {
        let (info, shift) = Self::clock_jump_checked_info(self, space, obs)?;
        if shift != 0.0 {
            self.state.clock_mut(obs.clock_index).bias_m += shift;
        }
        self.apply(&info)
    }

    /// Runs the filter on an assembled payload and corrects the state.
    pub(crate) fn apply(&mut self, info: &CorrectInfo) -> Result<(), Error> {
        let x_hat = self.filter.update(info)?;
        self.state.correct(&x_hat);
        Ok(())
    }

    /// Assembles H, z and R for one epoch, evaluated at `reference`'s
    /// state; shared by the direct, delayed and back-propagating update
    /// paths. On success the committed bias shift is returned alongside.
    pub(crate) fn clock_jump_checked_info(
        reference: &Self,
        space: &SpaceNode,
        obs: &GnssObservation,
    ) -> Result<(CorrectInfo, f64), Error> {
        let info = reference.correct_info(space, obs, 0.0)?;
        let delta_ms = reference.range_residual_mean_ms(obs.clock_index, &info);
        if delta_ms.abs() < CLOCK_JUMP_THRESHOLD_MS {
            return Ok((info, 0.0));
        }

        // Receivers adjust their clock in whole milliseconds; shift the
        // estimate accordingly and retry once.
        warn!("detected receiver clock jump: {:.3} ms", delta_ms);
        let shift = SPEED_OF_LIGHT_M_S * 1E-3 * (delta_ms + 0.5).floor();
        let info = reference.correct_info(space, obs, shift)?;
        let delta_ms = reference.range_residual_mean_ms(obs.clock_index, &info);
        if delta_ms.abs() < CLOCK_JUMP_THRESHOLD_MS {
            debug!("clock jump fixed ({:+.0} m)", shift);
            Ok((info, shift))
        } else {
            warn!("clock jump correction failed ({:.3} ms left): update skipped", delta_ms);
            Err(Error::ClockJumpUnrecoverable)
        }
    }

    /// Builds the measurement payload with the clock bias forcefully
    /// shifted by `clock_error_shift` meters.
    pub fn correct_info(
        &self,
        space: &SpaceNode,
        obs: &GnssObservation,
        clock_error_shift: f64,
    ) -> Result<CorrectInfo, Error> {
        if obs.clock_index >= self.state.num_clocks() {
            return Err(Error::UnknownClockIndex(obs.clock_index));
        }

        let p = self.state.err_state_len();
        let bias_col = self.state.clock_err_row(obs.clock_index);

        let clock_error = self.state.clock(obs.clock_index).bias_m + clock_error_shift;
        let clock_drift = self.state.clock(obs.clock_index).drift_m_s;
        let t = obs.time - clock_error / SPEED_OF_LIGHT_M_S;

        let user_pos = self.state.position_ecef();
        let user_geo = self.state.position();
        let user_vel = self.state.velocity_ecef();

        let h_uh = self.position_jacobian();
        let dcm_e2n_star = dcm(&self.state.q_e2n().conjugate());

        let mut h = Vec::with_capacity(2 * obs.measurements.len() * p);
        let mut z = Vec::with_capacity(2 * obs.measurements.len());
        let mut r_diag = Vec::with_capacity(2 * obs.measurements.len());

        for measurement in &obs.measurements {
            // Intentional exclusions contribute no rows: missing range
            // entry, unknown or invalid ephemeris, elevation mask, or a
            // non-positive weight.
            let Some(range) = measurement.range_m else {
                continue;
            };
            let Some(satellite) = space.satellite(measurement.prn) else {
                continue;
            };
            let ephemeris = satellite.ephemeris();
            if !ephemeris.is_valid(&t) {
                continue;
            }

            let sv = ephemeris.constellation(&t, range, measurement.range_rate_m_s.is_some());
            let relative = sv.position.0 - user_pos.0;
            let geometric = relative.norm();
            let enu = Enu::relative(&sv.position, &user_pos);

            let mut weight = measurement.weight.unwrap_or(1.0);
            if enu.elevation_rad() < self.cfg.elevation_mask_rad {
                weight = 0.0;
            }
            if weight <= 0.0 {
                continue;
            }

            // unit line of sight, satellite to user
            let los_neg = -relative / geometric;

            let sv_clock = ephemeris.clock_error(&t, range, 1.0);
            let iono = if space.is_valid_iono() {
                space.iono_correction(&enu, &user_geo, &t)
            } else {
                0.0
            };
            let tropo = SpaceNode::tropo_correction(&enu, &user_geo);

            // range residual: corrected measurement against prediction
            let residual = (range + iono + tropo)
                - (geometric + clock_error - SPEED_OF_LIGHT_M_S * sv_clock);

            let mut row = vec![0.0; p];
            for j in 0..4 {
                for i in 0..3 {
                    row[POSITION_ERR + j] -= los_neg[i] * h_uh[(i, j)];
                }
            }
            row[bias_col] = -1.0;

            let range_variance = match measurement.range_sigma_m {
                Some(sigma) => sigma * sigma,
                None => (1.0 / weight.max(1E-1)).powi(2),
            };
            h.extend_from_slice(&row);
            z.push(residual);
            r_diag.push(range_variance);

            let Some(rate) = measurement.range_rate_m_s else {
                continue;
            };

            // rate residual
            let sv_velocity = sv.velocity.unwrap_or_default();
            let rate_relative_neg = los_neg.dot(&(sv_velocity - user_vel))
                + SPEED_OF_LIGHT_M_S * ephemeris.clock_error_dot(&t, range);

            let mut row = vec![0.0; p];
            for j in 0..3 {
                for i in 0..3 {
                    row[VELOCITY_ERR + j] -= los_neg[i] * dcm_e2n_star[(i, j)];
                }
            }
            let (vx, vy, vz) = (user_vel[0], user_vel[1], user_vel[2]);
            row[POSITION_ERR] -= (los_neg[1] * -vz + los_neg[2] * vy) * 2.0;
            row[POSITION_ERR + 1] -= (los_neg[0] * vz + los_neg[2] * -vx) * 2.0;
            row[POSITION_ERR + 2] -= (los_neg[0] * -vy + los_neg[1] * vx) * 2.0;
            row[bias_col + 1] = -1.0;

            h.extend_from_slice(&row);
            z.push(rate - clock_drift + rate_relative_neg);
            r_diag.push(match measurement.rate_sigma_m_s {
                Some(sigma) => sigma * sigma,
                None => range_variance * 1E-3,
            });
        }

        if z.is_empty() {
            return Err(Error::EmptyMeasurement);
        }

        let rows = z.len();
        Ok(CorrectInfo {
            h: DMatrix::from_row_slice(rows, p, &h),
            z: DVector::from_vec(z),
            r: DMatrix::from_diagonal(&DVector::from_vec(r_diag)),
        })
    }

    /// Mean range residual attributable to `clock_index`, in milliseconds
    /// of range. Rows are recognized by their -1 bias column.
    pub(crate) fn range_residual_mean_ms(&self, clock_index: usize, info: &CorrectInfo) -> f64 {
        let bias_col = self.state.clock_err_row(clock_index);

        let mut sum = 0.0;
        let mut ranges = 0usize;
        for row in 0..info.rows() {
            if info.h[(row, bias_col)] > -0.5 {
                continue;
            }
            sum += info.z[row];
            ranges += 1;
        }

        if ranges > 0 {
            sum / ranges as f64 / SPEED_OF_LIGHT_M_S / 1E-3
        } else {
            0.0
        }
    }

    /// Derivative of the user ECEF position with respect to the position
    /// error angles and the height error, through the earth-to-navigation
    /// quaternion and the WGS84 radius of curvature.
    fn position_jacobian(&self) -> Matrix3x4<f64> {
        let q = self.state.q_e2n();
        let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);

        let q_alpha = (q0 * q0 + q3 * q3) * 2.0 - 1.0;
        let q_beta = (q0 * q1 - q2 * q3) * 2.0;
        let q_gamma = (q0 * q2 + q1 * q3) * 2.0;

        let e = EARTH_ECCENTRICITY;
        let e2 = e * e;
        let height = self.state.position().height_m;

        let n = EARTH_SEMI_MAJOR_AXIS_M / (1.0 - (e * q_alpha) * (e * q_alpha)).sqrt();
        let sf = n * e2 * q_alpha * -2.0 / (1.0 - e2 * q_alpha * q_alpha);
        let n_h = (n + height) * 2.0;

        let mut h_uh = Matrix3x4::zeros();
        h_uh[(0, 0)] = -q_gamma * q_beta * sf;
        h_uh[(0, 1)] = -q_gamma * q_gamma * sf - n_h * q_alpha;
        h_uh[(0, 2)] = -n_h * q_beta;
        h_uh[(0, 3)] = -q_gamma;

        h_uh[(1, 0)] = q_beta * q_beta * sf + n_h * q_alpha;
        h_uh[(1, 1)] = q_beta * q_gamma * sf;
        h_uh[(1, 2)] = -n_h * q_gamma;
        h_uh[(1, 3)] = q_beta;

        let sf2 = sf * -(1.0 - e2);
        let n_h2 = (n * (1.0 - e2) + height) * 2.0;
        h_uh[(2, 0)] = q_alpha * q_beta * sf2 + n_h2 * q_beta;
        h_uh[(2, 1)] = q_alpha * q_gamma * sf2 + n_h2 * q_gamma;
        h_uh[(2, 3)] = -q_alpha;

        h_uh
    }
}

/// Direction cosine matrix of a quaternion, scalar part first.
pub(crate) fn dcm(q: &Quaternion<f64>) -> Matrix3<f64> {
    let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);
    Matrix3::new(
        q0 * q0 + q1 * q1 - q2 * q2 - q3 * q3,
        (q1 * q2 + q0 * q3) * 2.0,
        (q1 * q3 - q0 * q2) * 2.0,
        (q1 * q2 - q0 * q3) * 2.0,
        q0 * q0 - q1 * q1 + q2 * q2 - q3 * q3,
        (q2 * q3 + q0 * q1) * 2.0,
        (q1 * q3 + q0 * q2) * 2.0,
        (q2 * q3 - q0 * q1) * 2.0,
        q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3,
    )
}
