use std::f64::consts::FRAC_PI_2;

use crate::{
    bias::{saastamoinen_zenith_hydrostatic_m, NiellMapping},
    constants::{L1_FREQUENCY_HZ, SPEED_OF_LIGHT_M_S},
    coords::{Enu, Geodetic},
    space_node::{IonoUtc, SpaceNode},
    time::GpsTime,
};

fn zenith_pos() -> Enu {
    Enu::new(0.0, 0.0, 1.0E6)
}

#[test]
fn klobuchar_floor_at_zenith() {
    // zero amplitude: only the 5 ns floor remains, scaled by the
    // obliquity at 90 degrees elevation
    let mut space = SpaceNode::new();
    space.update_iono_utc(IonoUtc::default(), true, true);

    let user = Geodetic::new(0.3, 0.5, 0.0);
    let t = GpsTime::new(2048, 43200.0);
    let correction = space.iono_correction(&zenith_pos(), &user, &t);

    let obliquity = 1.0 + 16.0 * (0.53 - 0.5_f64).powi(3);
    let expected = -SPEED_OF_LIGHT_M_S * 5E-9 * obliquity;
    assert!(
        (correction - expected).abs() < 1E-9 * SPEED_OF_LIGHT_M_S * 1E-3,
        "correction {correction} expected {expected}",
    );
    // about -1.5 m of applied correction
    assert!(correction < -1.0 && correction > -2.0);
}

#[test]
fn klobuchar_amplitude_term() {
    let mut space = SpaceNode::new();
    let mut params = IonoUtc::default();
    // plausible broadcast magnitudes
    params.alpha = [1.2E-8, 0.0, -6.0E-8, 0.0];
    params.beta = [96000.0, 0.0, -196608.0, 0.0];
    space.update_iono_utc(params, true, true);

    let user = Geodetic::new(0.3, 0.5, 0.0);
    // local time lands near 14:00: the cosine term peaks
    let t = GpsTime::new(2048, 50400.0 - 4.32E4 * 0.5 / std::f64::consts::PI);
    let correction = space.iono_correction(&zenith_pos(), &user, &t);

    // more delay than the floor alone
    let floor = -SPEED_OF_LIGHT_M_S * 5E-9 * (1.0 + 16.0 * (0.53 - 0.5_f64).powi(3));
    assert!(correction < floor);
    assert!(correction > -30.0, "correction {correction}");
}

#[test]
fn klobuchar_low_elevation_inflates() {
    let mut space = SpaceNode::new();
    space.update_iono_utc(IonoUtc::default(), true, true);

    let user = Geodetic::new(0.3, 0.5, 0.0);
    let t = GpsTime::new(2048, 43200.0);

    let low = Enu::new(0.8E6, 0.2E6, 0.1E6);
    let at_zenith = space.iono_correction(&zenith_pos(), &user, &t);
    let at_horizon = space.iono_correction(&low, &user, &t);
    assert!(at_horizon.abs() > at_zenith.abs());
}

#[test]
fn tropo_simple_model() {
    let user = Geodetic::new(0.3, 0.5, 0.0);
    let correction = SpaceNode::tropo_correction(&zenith_pos(), &user);
    let expected = -2.47 / (FRAC_PI_2.sin() + 0.0121);
    assert!((correction - expected).abs() < 1E-9);

    // decays with altitude, dies out above the scale height
    let elevated = Geodetic::new(0.3, 0.5, 10.0E3);
    assert!(SpaceNode::tropo_correction(&zenith_pos(), &elevated).abs() < correction.abs());
    let space_user = Geodetic::new(0.3, 0.5, 50.0E3);
    assert_eq!(SpaceNode::tropo_correction(&zenith_pos(), &space_user), 0.0);

    // and grows toward the horizon
    let low = Enu::new(0.9E6, 0.0, 0.1E6);
    assert!(SpaceNode::tropo_correction(&low, &user).abs() > correction.abs());
}

#[test]
fn niell_mapping_at_zenith_is_unity() {
    let mapping = NiellMapping::get(2026.5, 0.7, FRAC_PI_2, 0.0);
    assert!((mapping.hydrostatic - 1.0).abs() < 1E-9);
    assert!((mapping.wet - 1.0).abs() < 1E-9);
}

#[test]
fn niell_mapping_grows_toward_horizon() {
    let year = 2026.1;
    let mut previous = NiellMapping::get(year, 0.7, 80.0_f64.to_radians(), 0.2);
    for elevation_deg in [60.0, 40.0, 20.0, 10.0, 5.0] {
        let mapping = NiellMapping::get(year, 0.7, (elevation_deg as f64).to_radians(), 0.2);
        assert!(mapping.hydrostatic > previous.hydrostatic);
        assert!(mapping.wet > previous.wet);
        previous = mapping;
    }
    // at 5 degrees the factors are around 10
    assert!(previous.hydrostatic > 8.0 && previous.hydrostatic < 14.0);
}

#[test]
fn niell_latitude_interpolation_is_continuous() {
    let year = 2026.1;
    let elevation = 15.0_f64.to_radians();
    let step = 0.5_f64.to_radians();
    let mut previous = NiellMapping::get(year, 16.0_f64.to_radians(), elevation, 0.0);
    let mut latitude = 16.0_f64.to_radians() + step;
    while latitude < 59.0_f64.to_radians() {
        let mapping = NiellMapping::get(year, latitude, elevation, 0.0);
        assert!(
            (mapping.hydrostatic - previous.hydrostatic).abs() < 1E-2,
            "discontinuity at {latitude}",
        );
        previous = mapping;
        latitude += step;
    }
}

#[test]
fn niell_correction_at_zenith_is_the_zenith_delay() {
    let user = Geodetic::new(0.7, 0.5, 0.0);
    let t = GpsTime::new(2048, 43200.0);
    let correction = SpaceNode::tropo_correction_niell(&zenith_pos(), &user, &t, 1013.25);
    let zenith = saastamoinen_zenith_hydrostatic_m(user.latitude_rad, 1013.25, 0.0);
    assert!((correction + zenith).abs() < 1E-9);
}

#[test]
fn saastamoinen_sea_level() {
    let zenith = saastamoinen_zenith_hydrostatic_m(0.0, 1013.25, 0.0);
    assert!((zenith - 2.313).abs() < 2E-3, "zenith {zenith}");

    // pressure scales linearly, latitude modulates a fraction of a
    // percent
    let poles = saastamoinen_zenith_hydrostatic_m(FRAC_PI_2, 1013.25, 0.0);
    assert!(poles < zenith);
    assert!((poles - zenith).abs() / zenith < 0.01);
}

#[test]
fn pierce_point_at_zenith_is_the_user() {
    let user = Geodetic::new(0.3, 0.5, 0.0);
    let pp = SpaceNode::pierce_point(&zenith_pos(), &user, SpaceNode::default_shell_height_m());
    assert!((pp.latitude_rad - user.latitude_rad).abs() < 1E-9);
    assert!((pp.longitude_rad - user.longitude_rad).abs() < 1E-9);
}

#[test]
fn slant_factor_bounds() {
    let vertical = SpaceNode::slant_factor(&zenith_pos(), SpaceNode::default_shell_height_m());
    assert!((vertical - 1.0).abs() < 1E-9);

    let grazing = Enu::new(1.0E6, 0.0, 1.0E3);
    let slant = SpaceNode::slant_factor(&grazing, SpaceNode::default_shell_height_m());
    assert!(slant < 1.0 && slant > 0.3);
}

#[test]
fn tec_to_delay() {
    // 1 TECU on L1 is about 16 cm of delay
    let delay = SpaceNode::tec2delay(1.0E16, L1_FREQUENCY_HZ);
    assert!((delay - 0.162).abs() < 2E-3, "delay {delay}");
}
