use crate::{
    telemetry::RawEphemeris,
    time::GpsTime,
};

mod orbit;
pub use orbit::SvState;

pub(crate) mod history;

/// 2^exp as f64, usable in constant position.
pub(crate) const fn power_of_two(exp: i32) -> f64 {
    let mut value = 1.0_f64;
    let mut n = exp;
    while n > 0 {
        value *= 2.0;
        n -= 1;
    }
    while n < 0 {
        value /= 2.0;
        n += 1;
    }
    value
}

/// ICD scale factors of the broadcast ephemeris fields.
pub(crate) mod scale {
    use super::power_of_two;
    use crate::constants::SC2RAD;

    pub const T_GD: f64 = power_of_two(-31);
    pub const T_OC: f64 = power_of_two(4);
    pub const A_F0: f64 = power_of_two(-31);
    pub const A_F1: f64 = power_of_two(-43);
    pub const A_F2: f64 = power_of_two(-55);

    pub const C_RS: f64 = power_of_two(-5);
    pub const DELTA_N: f64 = SC2RAD * power_of_two(-43);
    pub const M0: f64 = SC2RAD * power_of_two(-31);
    pub const C_UC: f64 = power_of_two(-29);
    pub const E: f64 = power_of_two(-33);
    pub const C_US: f64 = power_of_two(-29);
    pub const SQRT_A: f64 = power_of_two(-19);
    pub const T_OE: f64 = power_of_two(4);

    pub const C_IC: f64 = power_of_two(-29);
    pub const OMEGA0: f64 = SC2RAD * power_of_two(-31);
    pub const C_IS: f64 = power_of_two(-29);
    pub const I0: f64 = SC2RAD * power_of_two(-31);
    pub const C_RC: f64 = power_of_two(-5);
    pub const OMEGA: f64 = SC2RAD * power_of_two(-31);
    pub const DOT_OMEGA0: f64 = SC2RAD * power_of_two(-43);
    pub const DOT_I0: f64 = SC2RAD * power_of_two(-43);
}

/// User range accuracy 1-sigma upper limits, in meters, per URA index.
const URA_LIMITS_M: [f64; 15] = [
    2.40, 3.40, 4.85, 6.85, 9.65, 13.65, 24.00, 48.00, 96.00, 192.00, 384.00, 768.00, 1536.00,
    3072.00, 6144.00,
];

/// Scaled GPS ephemeris (subframes 1 to 3).
///
/// `fit_interval` is expressed in seconds; a negative value marks an
/// invalid placeholder record. A record is applicable at `t` when
/// `|t - t_oc| <= fit_interval / 2`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ephemeris {
    pub svid: u8,

    // Subframe 1
    /// Full week number (truncation resolved at decode time)
    pub wn: u16,
    /// User range accuracy index, negative when unknown
    pub ura: i32,
    pub sv_health: u8,
    /// Issue of clock data, negative when unknown (almanac up-cast)
    pub iodc: i32,
    /// Group delay (s)
    pub t_gd: f64,
    /// Clock data reference time (s)
    pub t_oc: f64,
    /// Clock correction parameter (s/s²)
    pub a_f2: f64,
    /// Clock correction parameter (s/s)
    pub a_f1: f64,
    /// Clock correction parameter (s)
    pub a_f0: f64,

    // Subframe 2
    /// Issue of ephemeris data, negative when unknown
    pub iode: i32,
    /// Sine correction, orbit (m)
    pub c_rs: f64,
    /// Mean motion difference (rad/s)
    pub delta_n: f64,
    /// Mean anomaly (rad)
    pub m0: f64,
    /// Cosine correction, latitude (rad)
    pub c_uc: f64,
    /// Eccentricity
    pub e: f64,
    /// Sine correction, latitude (rad)
    pub c_us: f64,
    /// Square root of semi-major axis (√m)
    pub sqrt_a: f64,
    /// Reference time ephemeris (s)
    pub t_oe: f64,
    /// Fit interval (s); negative marks an invalid record
    pub fit_interval: f64,

    // Subframe 3
    /// Cosine correction, inclination (rad)
    pub c_ic: f64,
    /// Longitude of ascending node (rad)
    pub omega0: f64,
    /// Sine correction, inclination (rad)
    pub c_is: f64,
    /// Inclination angle (rad)
    pub i0: f64,
    /// Cosine correction, orbit (m)
    pub c_rc: f64,
    /// Argument of perigee (rad)
    pub omega: f64,
    /// Rate of right ascension (rad/s)
    pub dot_omega0: f64,
    /// Rate of inclination angle (rad/s)
    pub dot_i0: f64,
}

impl Default for Ephemeris {
    /// The invalid placeholder record.
    fn default() -> Self {
        Self {
            svid: 0,
            wn: 0,
            ura: -1,
            sv_health: 0,
            iodc: -1,
            t_gd: 0.0,
            t_oc: 0.0,
            a_f2: 0.0,
            a_f1: 0.0,
            a_f0: 0.0,
            iode: -1,
            c_rs: 0.0,
            delta_n: 0.0,
            m0: 0.0,
            c_uc: 0.0,
            e: 0.0,
            c_us: 0.0,
            sqrt_a: 0.0,
            t_oe: 0.0,
            fit_interval: -1.0,
            c_ic: 0.0,
            omega0: 0.0,
            c_is: 0.0,
            i0: 0.0,
            c_rc: 0.0,
            omega: 0.0,
            dot_omega0: 0.0,
            dot_i0: 0.0,
        }
    }
}

impl From<&RawEphemeris> for Ephemeris {
    fn from(raw: &RawEphemeris) -> Self {
        Self {
            svid: raw.svid,
            wn: raw.wn,
            ura: raw.ura as i32,
            sv_health: raw.sv_health,
            iodc: raw.iodc as i32,
            t_gd: raw.t_gd as f64 * scale::T_GD,
            t_oc: raw.t_oc as f64 * scale::T_OC,
            a_f2: raw.a_f2 as f64 * scale::A_F2,
            a_f1: raw.a_f1 as f64 * scale::A_F1,
            a_f0: raw.a_f0 as f64 * scale::A_F0,
            iode: raw.iode as i32,
            c_rs: raw.c_rs as f64 * scale::C_RS,
            delta_n: raw.delta_n as f64 * scale::DELTA_N,
            m0: raw.m0 as f64 * scale::M0,
            c_uc: raw.c_uc as f64 * scale::C_UC,
            e: raw.e as f64 * scale::E,
            c_us: raw.c_us as f64 * scale::C_US,
            sqrt_a: raw.sqrt_a as f64 * scale::SQRT_A,
            t_oe: raw.t_oe as f64 * scale::T_OE,
            fit_interval: Self::fit_interval_s(raw.fit_interval_flag, raw.iodc),
            c_ic: raw.c_ic as f64 * scale::C_IC,
            omega0: raw.omega0 as f64 * scale::OMEGA0,
            c_is: raw.c_is as f64 * scale::C_IS,
            i0: raw.i0 as f64 * scale::I0,
            c_rc: raw.c_rc as f64 * scale::C_RC,
            omega: raw.omega as f64 * scale::OMEGA,
            dot_omega0: raw.dot_omega0 as f64 * scale::DOT_OMEGA0,
            dot_i0: raw.dot_i0 as f64 * scale::DOT_I0,
        }
    }
}

/// Nearest broadcast integer for a scaled value.
fn encode(value: f64, scale: f64) -> i64 {
    ((value + 0.5 * scale) / scale) as i64
}

impl Ephemeris {
    /// Fit interval in seconds from the subframe 2 flag and the IODC
    /// (ICD 20.3.4.4).
    pub fn fit_interval_s(flag: bool, iodc: u16) -> f64 {
        const HOUR: f64 = 60.0 * 60.0;
        if !flag {
            // normal operation
            return 4.0 * HOUR;
        }
        // short/long-term extended operation
        match iodc {
            240..=247 => 8.0 * HOUR,
            248..=255 | 496 => 14.0 * HOUR,
            497..=503 => 26.0 * HOUR,
            504..=510 => 50.0 * HOUR,
            511 | 752..=756 => 74.0 * HOUR,
            757..=763 => 98.0 * HOUR,
            764..=767 | 1008..=1010 => 122.0 * HOUR,
            1011..=1020 => 146.0 * HOUR,
            _ => 6.0 * HOUR,
        }
    }

    /// Re-encodes to broadcast integers, rounding each field to the
    /// nearest scale step.
    pub fn to_raw(&self) -> RawEphemeris {
        RawEphemeris {
            svid: self.svid,
            wn: self.wn,
            ura: self.ura.max(0) as u8,
            sv_health: self.sv_health,
            iodc: self.iodc.max(0) as u16,
            t_gd: encode(self.t_gd, scale::T_GD) as i8,
            t_oc: encode(self.t_oc, scale::T_OC) as u16,
            a_f2: encode(self.a_f2, scale::A_F2) as i8,
            a_f1: encode(self.a_f1, scale::A_F1) as i16,
            a_f0: encode(self.a_f0, scale::A_F0) as i32,
            iode: self.iode.max(0) as u8,
            c_rs: encode(self.c_rs, scale::C_RS) as i16,
            delta_n: encode(self.delta_n, scale::DELTA_N) as i16,
            m0: encode(self.m0, scale::M0) as i32,
            c_uc: encode(self.c_uc, scale::C_UC) as i16,
            e: encode(self.e, scale::E) as u32,
            c_us: encode(self.c_us, scale::C_US) as i16,
            sqrt_a: encode(self.sqrt_a, scale::SQRT_A) as u32,
            t_oe: encode(self.t_oe, scale::T_OE) as u16,
            fit_interval_flag: self.fit_interval > 5.0 * 60.0 * 60.0,
            c_ic: encode(self.c_ic, scale::C_IC) as i16,
            omega0: encode(self.omega0, scale::OMEGA0) as i32,
            c_is: encode(self.c_is, scale::C_IS) as i16,
            i0: encode(self.i0, scale::I0) as i32,
            c_rc: encode(self.c_rc, scale::C_RC) as i16,
            omega: encode(self.omega, scale::OMEGA) as i32,
            dot_omega0: encode(self.dot_omega0, scale::DOT_OMEGA0) as i32,
            dot_i0: encode(self.dot_i0, scale::DOT_I0) as i16,
        }
    }

    /// True when both records carry the same broadcast content: integer
    /// fields equal, scaled fields within one scale step of each other.
    pub fn is_equivalent(&self, rhs: &Ephemeris) -> bool {
        if self.wn != rhs.wn || self.ura != rhs.ura || self.sv_health != rhs.sv_health {
            return false;
        }

        macro_rules! check {
            ($field:ident, $scale:path) => {
                if (self.$field - rhs.$field).abs() > $scale {
                    return false;
                }
            };
        }

        check!(t_gd, scale::T_GD);
        check!(t_oc, scale::T_OC);
        check!(a_f2, scale::A_F2);
        check!(a_f1, scale::A_F1);
        check!(a_f0, scale::A_F0);

        check!(c_rs, scale::C_RS);
        check!(delta_n, scale::DELTA_N);
        check!(m0, scale::M0);
        check!(c_uc, scale::C_UC);
        check!(e, scale::E);
        check!(c_us, scale::C_US);
        check!(sqrt_a, scale::SQRT_A);
        check!(t_oe, scale::T_OE);

        check!(c_ic, scale::C_IC);
        check!(omega0, scale::OMEGA0);
        check!(c_is, scale::C_IS);
        check!(i0, scale::I0);
        check!(c_rc, scale::C_RC);
        check!(omega, scale::OMEGA);
        check!(dot_omega0, scale::DOT_OMEGA0);
        check!(dot_i0, scale::DOT_I0);

        true
    }

    /// Reference time of this record.
    pub fn base_time(&self) -> GpsTime {
        GpsTime::new(self.wn as i32, self.t_oc)
    }

    /// Seconds elapsed from the clock reference time to `t`.
    pub fn period_from_time_of_clock(&self, t: &GpsTime) -> f64 {
        *t - GpsTime::new(self.wn as i32, self.t_oc)
    }

    /// Seconds elapsed from the ephemeris reference time to `t`.
    pub fn period_from_time_of_ephemeris(&self, t: &GpsTime) -> f64 {
        *t - GpsTime::new(self.wn as i32, self.t_oe)
    }

    /// Seconds elapsed since the first moment this record was applicable.
    /// Positive for any time within the fit interval (ICD 20.3.4.5,
    /// Table 20-XIII).
    pub fn period_from_first_valid_transmission(&self, t: &GpsTime) -> f64 {
        self.period_from_time_of_clock(t) + self.fit_interval / 2.0
    }

    /// True when this record is applicable at `t`.
    pub fn is_valid(&self, t: &GpsTime) -> bool {
        self.period_from_time_of_clock(t).abs() <= self.fit_interval / 2.0
    }

    /// True when a fresher record is expected to have been broadcast by
    /// `t`. Vehicles on a 4 hour fit re-transmit every hour; extended fit
    /// intervals re-transmit every half fit interval.
    pub fn maybe_better_one_available(&self, t: &GpsTime) -> bool {
        let delta_t = self.period_from_first_valid_transmission(t);
        let transmission_interval = if self.fit_interval > 4.0 * 60.0 * 60.0 {
            self.fit_interval / 2.0
        } else {
            60.0 * 60.0
        };
        !((delta_t >= 0.0) && (delta_t < transmission_interval))
    }

    /// 1-sigma user range accuracy in meters for a URA index; negative
    /// index (unknown) maps to -1.
    pub fn ura_meters(index: i32) -> f64 {
        if index < 0 {
            return -1.0;
        }
        let index = index as usize;
        if index < URA_LIMITS_M.len() {
            URA_LIMITS_M[index]
        } else {
            URA_LIMITS_M[URA_LIMITS_M.len() - 1] * 2.0
        }
    }

    /// URA index covering `meters` of 1-sigma range error.
    pub fn ura_index(meters: f64) -> i32 {
        if meters < 0.0 {
            return -1;
        }
        for (index, limit) in URA_LIMITS_M.iter().enumerate() {
            if meters <= *limit {
                return index as i32;
            }
        }
        URA_LIMITS_M.len() as i32
    }
}
