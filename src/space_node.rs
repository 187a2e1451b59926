use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::{
    bias::{
        iono::klobuchar_correction_m,
        tropo::{saastamoinen_zenith_hydrostatic_m, simple_correction_m},
        NiellMapping,
    },
    constants::{EARTH_SEMI_MAJOR_AXIS_M, IONO_SHELL_HEIGHT_M},
    coords::{Ecef, Enu, Geodetic},
    ephemeris::{
        history::{EphemerisHistory, IterMode},
        Ephemeris, SvState,
    },
    telemetry::RawIonoUtc,
    time::GpsTime,
};

/// Scaled ionosphere and UTC parameters.
///
/// The broadcast week fields are truncated to 8 bits; `wn_t` and `wn_lsf`
/// hold full-width values reconstructed against the reception week.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct IonoUtc {
    /// Ionospheric coefficients (s, s/sc, s/sc², s/sc³)
    pub alpha: [f64; 4],
    /// Ionospheric coefficients (s, s/sc, s/sc², s/sc³)
    pub beta: [f64; 4],
    /// UTC drift parameter (s/s)
    pub a1: f64,
    /// UTC offset parameter (s)
    pub a0: f64,
    /// UTC reference time (s)
    pub t_ot: u32,
    /// UTC reference week
    pub wn_t: u32,
    /// Current leap seconds (s)
    pub delta_t_ls: i32,
    /// Week of the next leap second event
    pub wn_lsf: u32,
    /// Day of the next leap second event
    pub dn: u32,
    /// Leap seconds after the event (s)
    pub delta_t_lsf: i32,
}

impl From<&RawIonoUtc> for IonoUtc {
    fn from(raw: &RawIonoUtc) -> Self {
        use crate::ephemeris::power_of_two;

        const SF_ALPHA: [f64; 4] = [
            power_of_two(-30),
            power_of_two(-27),
            power_of_two(-24),
            power_of_two(-24),
        ];
        const SF_BETA: [f64; 4] = [
            power_of_two(11),
            power_of_two(14),
            power_of_two(16),
            power_of_two(16),
        ];

        let mut alpha = [0.0; 4];
        let mut beta = [0.0; 4];
        for i in 0..4 {
            alpha[i] = raw.alpha[i] as f64 * SF_ALPHA[i];
            beta[i] = raw.beta[i] as f64 * SF_BETA[i];
        }

        Self {
            alpha,
            beta,
            a1: raw.a1 as f64 * power_of_two(-50),
            a0: raw.a0 as f64 * power_of_two(-30),
            t_ot: (raw.t_ot as u32) << 12,
            wn_t: raw.wn_t as u32,
            delta_t_ls: raw.delta_t_ls as i32,
            wn_lsf: raw.wn_lsf as u32,
            dn: raw.dn as u32,
            delta_t_lsf: raw.delta_t_lsf as i32,
        }
    }
}

/// Ionospheric pierce point, as the geodetic coordinates of its Earth
/// projection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PiercePoint {
    pub latitude_rad: f64,
    pub longitude_rad: f64,
}

/// One GPS satellite and its ephemeris history.
#[derive(Debug, Clone)]
pub struct Satellite {
    pub svid: u8,
    history: EphemerisHistory,
}

impl Satellite {
    pub fn new(svid: u8) -> Self {
        Self {
            svid,
            history: EphemerisHistory::new(),
        }
    }

    pub fn register_ephemeris(&mut self, ephemeris: Ephemeris, priority_delta: i32) {
        self.history.add(ephemeris, priority_delta);
    }

    /// The currently selected record; check [Ephemeris::is_valid] before
    /// trusting derived quantities.
    pub fn ephemeris(&self) -> &Ephemeris {
        self.history.current()
    }

    pub fn history(&self) -> &EphemerisHistory {
        &self.history
    }

    pub fn iter_ephemeris(&self, mode: IterMode) -> impl Iterator<Item = &Ephemeris> {
        self.history.iter(mode).map(|entry| &entry.ephemeris)
    }

    pub fn merge(&mut self, another: &Satellite, keep_original: bool) {
        self.history.merge(&another.history, keep_original);
    }

    /// Selects the record best covering `target_time`. Returns true when a
    /// valid record is selected afterwards.
    pub fn select_ephemeris(&mut self, target_time: &GpsTime) -> bool {
        let currently_valid = self.ephemeris().is_valid(target_time);
        if currently_valid && !self.ephemeris().maybe_better_one_available(target_time) {
            return true; // conservative
        }
        self.history.select(
            target_time,
            &|ephemeris, t| ephemeris.is_valid(t),
            Some(&|ephemeris, t| ephemeris.period_from_first_valid_transmission(t)),
        ) || currently_valid
    }

    pub fn clock_error(&self, t: &GpsTime, pseudo_range: f64) -> f64 {
        self.ephemeris().clock_error(t, pseudo_range, 1.0)
    }

    pub fn clock_error_dot(&self, t: &GpsTime, pseudo_range: f64) -> f64 {
        self.ephemeris().clock_error_dot(t, pseudo_range)
    }

    pub fn constellation(&self, t: &GpsTime, pseudo_range: f64, with_velocity: bool) -> SvState {
        self.ephemeris().constellation(t, pseudo_range, with_velocity)
    }

    pub fn position(&self, t: &GpsTime, pseudo_range: f64) -> Ecef {
        self.ephemeris().position(t, pseudo_range)
    }

    pub fn velocity(&self, t: &GpsTime, pseudo_range: f64) -> Vector3<f64> {
        self.ephemeris().velocity(t, pseudo_range)
    }
}

/// Catalog of GPS satellites plus the broadcast ionosphere/UTC
/// parameters; entry point for the atmospheric corrections.
///
/// Written by the decoding path and read by the measurement-update path;
/// multi-threaded hosts must serialize those externally.
#[derive(Debug, Default, Clone)]
pub struct SpaceNode {
    satellites: BTreeMap<u8, Satellite>,
    iono_utc: IonoUtc,
    iono_valid: bool,
    utc_valid: bool,
}

impl SpaceNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iono_utc(&self) -> &IonoUtc {
        &self.iono_utc
    }

    pub fn is_valid_iono(&self) -> bool {
        self.iono_valid
    }

    pub fn is_valid_utc(&self) -> bool {
        self.utc_valid
    }

    pub fn is_valid_iono_utc(&self) -> bool {
        self.iono_valid && self.utc_valid
    }

    pub fn update_iono_utc(&mut self, params: IonoUtc, iono_valid: bool, utc_valid: bool) {
        self.iono_utc = params;
        self.iono_valid = iono_valid;
        self.utc_valid = utc_valid;
    }

    pub fn satellites(&self) -> &BTreeMap<u8, Satellite> {
        &self.satellites
    }

    pub fn has_satellite(&self, prn: u8) -> bool {
        self.satellites.contains_key(&prn)
    }

    pub fn satellite(&self, prn: u8) -> Option<&Satellite> {
        self.satellites.get(&prn)
    }

    /// The satellite entry for `prn`, created on first use.
    pub fn satellite_mut(&mut self, prn: u8) -> &mut Satellite {
        self.satellites
            .entry(prn)
            .or_insert_with(|| Satellite::new(prn))
    }

    /// Re-selects the ephemeris of every satellite for `target_time`.
    pub fn update_all_ephemeris(&mut self, target_time: &GpsTime) {
        for satellite in self.satellites.values_mut() {
            satellite.select_ephemeris(target_time);
        }
    }

    pub fn merge(&mut self, another: &SpaceNode, keep_original: bool) {
        for (prn, satellite) in &another.satellites {
            self.satellite_mut(*prn).merge(satellite, keep_original);
        }
        if !self.is_valid_iono_utc() || !keep_original {
            self.iono_utc = another.iono_utc;
            self.iono_valid = another.iono_valid;
            self.utc_valid = another.utc_valid;
        }
    }

    /// Pierce point of the line of sight with the ionospheric shell
    /// (DO-229D A4.4.10.1).
    ///
    /// The longitude needs a hemisphere correction when the pierce point
    /// falls on the far side of the pole, which is possible for
    /// horizon-grazing geometries at high latitude: with a 350 km shell
    /// the limit latitude is asin(Re / (350E3 + Re)) = 71.4 deg.
    pub fn pierce_point(
        relative_pos: &Enu,
        user: &Geodetic,
        height_over_ellipsoid_m: f64,
    ) -> PiercePoint {
        let elevation = relative_pos.elevation_rad();
        let azimuth = relative_pos.azimuth_rad();

        // Earth's central angle between user position and the projection
        let psi_pp = std::f64::consts::FRAC_PI_2
            - elevation
            - (EARTH_SEMI_MAJOR_AXIS_M / (EARTH_SEMI_MAJOR_AXIS_M + height_over_ellipsoid_m)
                * elevation.cos())
            .asin();

        let phi_pp = (user.latitude_rad.sin() * psi_pp.cos()
            + user.latitude_rad.cos() * psi_pp.sin() * azimuth.cos())
        .asin();
        let lambda_pp = (psi_pp.sin() * azimuth.sin() / phi_pp.cos()).asin();

        let phi_limit =
            (EARTH_SEMI_MAJOR_AXIS_M / (EARTH_SEMI_MAJOR_AXIS_M + height_over_ellipsoid_m)).asin();
        let lhs = psi_pp.tan() * azimuth.cos();
        let rhs = (std::f64::consts::FRAC_PI_2 - user.latitude_rad).tan();
        let longitude_rad = if (user.latitude_rad > phi_limit && lhs > rhs)
            || (user.latitude_rad < -phi_limit && lhs < rhs)
        {
            user.longitude_rad + std::f64::consts::PI - lambda_pp
        } else {
            user.longitude_rad + lambda_pp
        };

        PiercePoint {
            latitude_rad: phi_pp,
            longitude_rad,
        }
    }

    /// Slant versus vertical path ratio through a spherical single layer
    /// (Eq.(3) of "Ionospheric Range Error Correction Models",
    /// N. Jakowski).
    pub fn slant_factor(relative_pos: &Enu, height_over_ellipsoid_m: f64) -> f64 {
        let cos_el = relative_pos.elevation_rad().cos();
        (1.0 - (cos_el / (height_over_ellipsoid_m / EARTH_SEMI_MAJOR_AXIS_M + 1.0)).powi(2)).sqrt()
    }

    /// Ionospheric delay in meters for a total electron content, positive
    /// when delayed (navipedia, Ionospheric Delay, Eq.(13)).
    pub fn tec2delay(tec: f64, frequency_hz: f64) -> f64 {
        40.3E16 / (frequency_hz * frequency_hz) * tec
    }

    /// Klobuchar correction in meters to be added to the pseudo range.
    /// Meaningful only when [SpaceNode::is_valid_iono] holds.
    pub fn iono_correction(&self, relative_pos: &Enu, user: &Geodetic, t: &GpsTime) -> f64 {
        klobuchar_correction_m(
            &self.iono_utc.alpha,
            &self.iono_utc.beta,
            relative_pos,
            user,
            t,
        )
    }

    /// As [SpaceNode::iono_correction], from absolute positions.
    pub fn iono_correction_ecef(&self, sat: &Ecef, user: &Ecef, t: &GpsTime) -> f64 {
        self.iono_correction(&Enu::relative(sat, user), &user.to_geodetic(), t)
    }

    /// Flat tropospheric correction in meters to be added to the pseudo
    /// range.
    pub fn tropo_correction(relative_pos: &Enu, user: &Geodetic) -> f64 {
        simple_correction_m(relative_pos, user)
    }

    /// As [SpaceNode::tropo_correction], from absolute positions.
    pub fn tropo_correction_ecef(sat: &Ecef, user: &Ecef) -> f64 {
        Self::tropo_correction(&Enu::relative(sat, user), &user.to_geodetic())
    }

    /// Niell hydrostatic tropospheric correction in meters to be added to
    /// the pseudo range, with the Saastamoinen zenith delay mapped down to
    /// the line of sight. `pressure_hpa` is the surface pressure.
    pub fn tropo_correction_niell(
        relative_pos: &Enu,
        user: &Geodetic,
        t: &GpsTime,
        pressure_hpa: f64,
    ) -> f64 {
        let mapping = NiellMapping::new(relative_pos, user, t);
        let zenith = saastamoinen_zenith_hydrostatic_m(
            user.latitude_rad,
            pressure_hpa,
            user.height_m / 1E3,
        );
        -(zenith * mapping.hydrostatic)
    }

    /// Default 350 km single-layer shell height, in meters.
    pub fn default_shell_height_m() -> f64 {
        IONO_SHELL_HEIGHT_M
    }
}
