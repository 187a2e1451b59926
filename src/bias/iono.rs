use crate::{
    bias::{rad2sc, sc2rad},
    constants::SPEED_OF_LIGHT_M_S,
    coords::{Enu, Geodetic},
    time::{GpsTime, SECONDS_PER_DAY},
};

/// Klobuchar single-frequency ionospheric correction, in meters to be
/// added to the pseudo range (ICD 20.3.3.5.2.5).
///
/// `alpha` and `beta` are the broadcast cubic coefficients; `relative_pos`
/// locates the satellite in the user ENU frame.
pub(crate) fn klobuchar_correction_m(
    alpha: &[f64; 4],
    beta: &[f64; 4],
    relative_pos: &Enu,
    user: &Geodetic,
    t: &GpsTime,
) -> f64 {
    let elevation = relative_pos.elevation_rad();
    let azimuth = relative_pos.azimuth_rad();
    let sc_el = rad2sc(elevation);

    // Earth projection of the pierce point
    let psi = 0.0137 / (sc_el + 0.11) - 0.022;
    let mut phi_i = rad2sc(user.latitude_rad) + psi * azimuth.cos();
    phi_i = phi_i.clamp(-0.416, 0.416);
    let lambda_i = rad2sc(user.longitude_rad) + psi * azimuth.sin() / sc2rad(phi_i).cos();
    // geomagnetic latitude [sc]
    let phi_m = phi_i + 0.064 * sc2rad(lambda_i - 1.617).cos();

    // Local time [s]
    let mut lt = 4.32E4 * lambda_i + t.seconds;
    lt -= (lt / SECONDS_PER_DAY as f64).floor() * SECONDS_PER_DAY as f64;

    // Amplitude and period of the cosine term
    let mut amp = 0.0;
    let mut per = 0.0;
    let mut phi_mn = 1.0;
    for i in 0..4 {
        amp += alpha[i] * phi_mn;
        per += beta[i] * phi_mn;
        phi_mn *= phi_m;
    }
    if amp < 0.0 {
        amp = 0.0;
    }
    if per < 72000.0 {
        per = 72000.0;
    }

    // Obliquity factor
    let obliquity = 1.0 + 16.0 * (0.53 - sc_el).powi(3);

    // phase [rad]: (-1.4 pi) < x < (0.42 pi) because min(per) = 72000
    let x = 2.0 * std::f64::consts::PI * (lt - 50400.0) / per;

    let mut t_iono = 5E-9;
    if x.abs() < 1.57 {
        t_iono += amp * (1.0 - x * x * (1.0 / 2.0 - x * x / 24.0));
    }
    t_iono *= obliquity;

    -t_iono * SPEED_OF_LIGHT_M_S
}
