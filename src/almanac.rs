use crate::{
    ephemeris::{power_of_two, Ephemeris},
    telemetry::RawAlmanac,
};

/// ICD scale factors of the broadcast almanac fields.
mod scale {
    use super::power_of_two;
    use crate::constants::SC2RAD;

    pub const E: f64 = power_of_two(-21);
    pub const T_OA: f64 = power_of_two(12);
    pub const DELTA_I: f64 = SC2RAD * power_of_two(-19);
    pub const DOT_OMEGA0: f64 = SC2RAD * power_of_two(-38);
    pub const SQRT_A: f64 = power_of_two(-11);
    pub const OMEGA0: f64 = SC2RAD * power_of_two(-23);
    pub const OMEGA: f64 = SC2RAD * power_of_two(-23);
    pub const M0: f64 = SC2RAD * power_of_two(-23);
    pub const A_F0: f64 = power_of_two(-20);
    pub const A_F1: f64 = power_of_two(-38);
}

/// Scaled GPS almanac entry (subframes 4 and 5 data pages).
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Almanac {
    pub svid: u8,
    /// Eccentricity
    pub e: f64,
    /// Almanac reference time (s)
    pub t_oa: f64,
    /// Correction to inclination (rad)
    pub delta_i: f64,
    /// Rate of right ascension (rad/s)
    pub dot_omega0: f64,
    pub sv_health: u8,
    /// Square root of semi-major axis (√m)
    pub sqrt_a: f64,
    /// Longitude of ascending node (rad)
    pub omega0: f64,
    /// Argument of perigee (rad)
    pub omega: f64,
    /// Mean anomaly (rad)
    pub m0: f64,
    /// Clock correction parameter (s)
    pub a_f0: f64,
    /// Clock correction parameter (s/s)
    pub a_f1: f64,
}

impl From<&RawAlmanac> for Almanac {
    fn from(raw: &RawAlmanac) -> Self {
        Self {
            svid: raw.svid,
            e: raw.e as f64 * scale::E,
            t_oa: raw.t_oa as f64 * scale::T_OA,
            delta_i: raw.delta_i as f64 * scale::DELTA_I,
            dot_omega0: raw.dot_omega0 as f64 * scale::DOT_OMEGA0,
            sv_health: raw.sv_health,
            sqrt_a: raw.sqrt_a as f64 * scale::SQRT_A,
            omega0: raw.omega0 as f64 * scale::OMEGA0,
            omega: raw.omega as f64 * scale::OMEGA,
            m0: raw.m0 as f64 * scale::M0,
            a_f0: raw.a_f0 as f64 * scale::A_F0,
            a_f1: raw.a_f1 as f64 * scale::A_F1,
        }
    }
}

/// Lossy up-cast to an ephemeris record: harmonic corrections zeroed,
/// issue-of-data tags unknown, a plain 4 hour fit. The week number must be
/// configured by the caller.
impl From<&Almanac> for Ephemeris {
    fn from(almanac: &Almanac) -> Self {
        Ephemeris {
            svid: almanac.svid,
            wn: 0,
            ura: -1,
            sv_health: almanac.sv_health,
            iodc: -1,
            t_gd: 0.0,
            t_oc: almanac.t_oa,
            a_f2: 0.0,
            a_f1: almanac.a_f1,
            a_f0: almanac.a_f0,
            iode: -1,
            c_rs: 0.0,
            delta_n: 0.0,
            m0: almanac.m0,
            c_uc: 0.0,
            e: almanac.e,
            c_us: 0.0,
            sqrt_a: almanac.sqrt_a,
            t_oe: almanac.t_oa,
            fit_interval: 4.0 * 60.0 * 60.0,
            c_ic: 0.0,
            omega0: almanac.omega0,
            c_is: 0.0,
            i0: almanac.delta_i,
            c_rc: 0.0,
            omega: almanac.omega,
            dot_omega0: almanac.dot_omega0,
            dot_i0: 0.0,
        }
    }
}
