//! Broadcast orbit propagation: Kepler solver, ECEF constellation state
//! and SV clock corrections (ICD 20.3.3.4.3, Table 20-IV).

use nalgebra::Vector3;

use crate::{
    constants::{EARTH_ANGULAR_VEL_RAD_S, EARTH_MU_M3_S2, SPEED_OF_LIGHT_M_S},
    coords::Ecef,
    ephemeris::Ephemeris,
    time::GpsTime,
};

const KEPLER_DELTA_LIMIT: f64 = 1E-12;
const KEPLER_MAX_LOOPS: usize = 10;

/// Relativistic clock correction factor, -2√μ/c²
fn relativistic_f() -> f64 {
    -2.0 * EARTH_MU_M3_S2.sqrt() / (SPEED_OF_LIGHT_M_S * SPEED_OF_LIGHT_M_S)
}

/// Satellite state at a requested receive time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SvState {
    /// ECEF position (m)
    pub position: Ecef,
    /// ECEF velocity (m/s), when requested
    pub velocity: Option<Vector3<f64>>,
}

impl Ephemeris {
    /// Solves Kepler's equation for the eccentric anomaly, `tk` seconds
    /// past the ephemeris reference time. Iteration silently stops after
    /// 10 rounds even without convergence.
    pub fn eccentric_anomaly(&self, period_from_toe: f64) -> f64 {
        let n0 = EARTH_MU_M3_S2.sqrt() / self.sqrt_a.powi(3);
        let mk = self.m0 + (n0 + self.delta_n) * period_from_toe;

        let mut ek = mk;
        for _ in 0..KEPLER_MAX_LOOPS {
            let next = mk + self.e * ek.sin();
            if (next - ek).abs() < KEPLER_DELTA_LIMIT {
                break;
            }
            ek = next;
        }

        ek
    }

    pub fn eccentric_anomaly_at(&self, t: &GpsTime) -> f64 {
        self.eccentric_anomaly(self.period_from_time_of_ephemeris(t))
    }

    /// Time derivative of the eccentric anomaly.
    pub fn eccentric_anomaly_dot(&self, eccentric_anomaly: f64) -> f64 {
        let n = EARTH_MU_M3_S2.sqrt() / self.sqrt_a.powi(3) + self.delta_n;
        n / (1.0 - self.e * eccentric_anomaly.cos())
    }

    /// SV clock correction in seconds at `t`, compensating the signal
    /// transit time of `pseudo_range` meters. `gamma` compensates the
    /// group delay per carrier: 1 on L1, (77/60)² on L2
    /// (ICD 20.3.3.3.3.2).
    pub fn clock_error(&self, t: &GpsTime, pseudo_range: f64, gamma: f64) -> f64 {
        let transit_time = pseudo_range / SPEED_OF_LIGHT_M_S;
        let tk = self.period_from_time_of_clock(t) - transit_time;
        let ek = self.eccentric_anomaly(tk);

        // Relativistic correction term
        let dt_r = relativistic_f() * self.e * self.sqrt_a * ek.sin();

        // ICD 20.3.3.3.1 Eq.(2)
        let dt_sv = self.a_f0 + self.a_f1 * tk + self.a_f2 * tk * tk + dt_r;

        dt_sv - gamma * self.t_gd
    }

    /// Time derivative of [Ephemeris::clock_error], in s/s.
    pub fn clock_error_dot(&self, t: &GpsTime, pseudo_range: f64) -> f64 {
        let transit_time = pseudo_range / SPEED_OF_LIGHT_M_S;
        let tk = self.period_from_time_of_clock(t) - transit_time;
        let ek = self.eccentric_anomaly(tk);
        let ek_dot = self.eccentric_anomaly_dot(ek);

        let dt_r_dot = relativistic_f() * self.e * self.sqrt_a * ek_dot * ek.cos();

        self.a_f1 + self.a_f2 * 2.0 * tk + dt_r_dot
    }

    /// ECEF position (and optionally velocity) at receive time `t`,
    /// compensating the transit time of `pseudo_range` meters.
    pub fn constellation(&self, t: &GpsTime, pseudo_range: f64, with_velocity: bool) -> SvState {
        // Time from ephemeris reference epoch, then minus transit time
        let tk0 = self.period_from_time_of_ephemeris(t);
        let tk = tk0 - pseudo_range / SPEED_OF_LIGHT_M_S;

        let ek = self.eccentric_anomaly(tk);

        // Corrected radius
        let mut rk = self.sqrt_a * self.sqrt_a * (1.0 - self.e * ek.cos());

        // True anomaly
        let vk = ((1.0 - self.e * self.e).sqrt() * ek.sin()).atan2(ek.cos() - self.e);

        // Argument of latitude, inclination
        let mut pk = vk + self.omega;
        let mut ik = self.i0;

        {
            let (pk2_sin, pk2_cos) = (pk * 2.0).sin_cos();
            pk += self.c_us * pk2_sin + self.c_uc * pk2_cos;
            rk += self.c_rs * pk2_sin + self.c_rc * pk2_cos;
            ik += self.c_is * pk2_sin + self.c_ic * pk2_cos + self.dot_i0 * tk;
        }

        // Position in orbital plane
        let xk = rk * pk.cos();
        let yk = rk * pk.sin();

        // Corrected longitude of ascending node: the node rate applies to
        // the transmit time while the Earth rotation term applies to the
        // receive time
        let omegak = self.omega0 + self.dot_omega0 * tk - EARTH_ANGULAR_VEL_RAD_S * (self.t_oe + tk0);

        let (omegak_sin, omegak_cos) = omegak.sin_cos();
        let (ik_sin, ik_cos) = ik.sin_cos();

        let position = Ecef::new(
            xk * omegak_cos - yk * omegak_sin * ik_cos,
            xk * omegak_sin + yk * omegak_cos * ik_cos,
            yk * ik_sin,
        );

        // Velocity equations follow the GPS toolbox formulation,
        // http://www.ngs.noaa.gov/gps-toolbox/bc_velo.htm
        let velocity = with_velocity.then(|| {
            let ek_dot = self.eccentric_anomaly_dot(ek);
            let vk_dot = ek.sin() * ek_dot * (1.0 + self.e * vk.cos())
                / (vk.sin() * (1.0 - self.e * ek.cos()));

            let (pk2_sin, pk2_cos) = (pk * 2.0).sin_cos();
            let pk_dot = ((self.c_us * pk2_cos - self.c_uc * pk2_sin) * 2.0 + 1.0) * vk_dot;
            let rk_dot = self.sqrt_a * self.sqrt_a * self.e * ek.sin() * ek_dot
                + (self.c_rs * pk2_cos - self.c_rc * pk2_sin) * 2.0 * vk_dot;
            let ik_dot = self.dot_i0 + (self.c_is * pk2_cos - self.c_ic * pk2_sin) * 2.0 * vk_dot;

            // Velocity in orbital plane
            let xk_dot = rk_dot * pk.cos() - yk * pk_dot;
            let yk_dot = rk_dot * pk.sin() + xk * pk_dot;

            let omegak_dot = self.dot_omega0 - EARTH_ANGULAR_VEL_RAD_S;

            Vector3::new(
                (xk_dot - yk * ik_cos * omegak_dot) * omegak_cos
                    - (xk * omegak_dot + yk_dot * ik_cos - yk * ik_sin * ik_dot) * omegak_sin,
                (xk_dot - yk * ik_cos * omegak_dot) * omegak_sin
                    + (xk * omegak_dot + yk_dot * ik_cos - yk * ik_sin * ik_dot) * omegak_cos,
                yk_dot * ik_sin + yk * ik_cos * ik_dot,
            )
        });

        SvState { position, velocity }
    }

    /// ECEF position at receive time `t`.
    pub fn position(&self, t: &GpsTime, pseudo_range: f64) -> Ecef {
        self.constellation(t, pseudo_range, false).position
    }

    /// ECEF velocity at receive time `t`.
    pub fn velocity(&self, t: &GpsTime, pseudo_range: f64) -> Vector3<f64> {
        self.constellation(t, pseudo_range, true)
            .velocity
            .unwrap_or_default()
    }
}
