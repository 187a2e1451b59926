use std::f64::consts::PI;

use crate::{
    coords::{Enu, Geodetic},
    time::GpsTime,
};

/// Flat tropospheric correction in meters to be added to the pseudo
/// range, driven by elevation and user altitude only.
pub(crate) fn simple_correction_m(relative_pos: &Enu, user: &Geodetic) -> f64 {
    let elevation = relative_pos.elevation_rad();

    let h = user.height_m;
    let mut f = 1.0;
    if h > 1.0 / 2.3E-5 {
        f = 0.0;
    } else if h > 0.0 {
        f -= h * 2.3E-5;
    }

    -2.47 * f.powi(5) / (elevation.sin() + 0.0121)
}

/// Niell hydrostatic and wet mapping functions.
///
/// Coefficients are indexed by latitude (15°/30°/45°/60°/75° rows,
/// linearly interpolated); the hydrostatic annual cycle is referenced to
/// day 28 of the year and the height correction applies to the
/// hydrostatic factor only.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NiellMapping {
    pub hydrostatic: f64,
    pub wet: f64,
}

const TBL_HYD_AVG: [[f64; 3]; 5] = [
    [1.2769934e-3, 2.9153695e-3, 62.610505e-3], // 15
    [1.2683230e-3, 2.9152299e-3, 62.837393e-3], // 30
    [1.2465397e-3, 2.9288445e-3, 63.721774e-3], // 45
    [1.2196049e-3, 2.9022565e-3, 63.824265e-3], // 60
    [1.2045996e-3, 2.9024912e-3, 64.258455e-3], // 75
];

const TBL_HYD_AMP: [[f64; 3]; 5] = [
    [0.0, 0.0, 0.0],                            // 15
    [1.2709626e-5, 2.1414979e-5, 9.0128400e-5], // 30
    [2.6523662e-5, 3.0160779e-5, 4.3497037e-5], // 45
    [3.4000452e-5, 7.2562722e-5, 84.795348e-5], // 60
    [4.1202191e-5, 11.723375e-5, 170.37206e-5], // 75
];

const TBL_WET: [[f64; 3]; 5] = [
    [5.8021897e-4, 1.4275268e-3, 4.3472961e-2], // 15
    [5.6794847e-4, 1.5138625e-3, 4.6729510e-2], // 30
    [5.8118019e-4, 1.4572752e-3, 4.3908931e-2], // 45
    [5.9727542e-4, 1.5007428e-3, 4.4626982e-2], // 60
    [6.1641693e-4, 1.7599082e-3, 5.4736038e-2], // 75
];

const TBL_HEIGHT: [f64; 3] = [2.53e-5, 5.49e-3, 1.14e-3];

/// Marini (1972) three-term continued fraction.
fn marini1972_2(v: f64, coef: &[f64; 3]) -> f64 {
    coef[0] / (coef[1] / (coef[2] + v) + v) + v
}

fn marini1972(sin_elevation: f64, coef: &[f64; 3]) -> f64 {
    marini1972_2(1.0, coef) / marini1972_2(sin_elevation, coef)
}

fn interpolated(table: &[[f64; 3]; 5], index: usize, weight: f64) -> [f64; 3] {
    let mut coef = [0.0; 3];
    for i in 0..3 {
        coef[i] = table[index - 1][i] * (1.0 - weight) + table[index][i] * weight;
    }
    coef
}

impl NiellMapping {
    /// Mapping factors for a fractional civil `year`, geodetic latitude,
    /// elevation and user height in kilometers.
    pub fn get(year: f64, latitude_rad: f64, elevation_rad: f64, height_km: f64) -> Self {
        const DELTA: f64 = PI / 180.0 * 15.0;
        let index_f = latitude_rad / DELTA;
        let index = index_f as i64;

        let (abc_avg, abc_amp, abc_wet) = if index < 1 {
            (TBL_HYD_AVG[0], TBL_HYD_AMP[0], TBL_WET[0])
        } else if index >= (TBL_HYD_AVG.len() - 1) as i64 {
            let last = TBL_HYD_AVG.len() - 1;
            (TBL_HYD_AVG[last], TBL_HYD_AMP[last], TBL_WET[last])
        } else {
            let index = index as usize;
            let weight = index_f - index as f64;
            (
                interpolated(&TBL_HYD_AVG, index, weight),
                interpolated(&TBL_HYD_AMP, index, weight),
                interpolated(&TBL_WET, index, weight),
            )
        };

        let sin_elevation = elevation_rad.sin();

        let hydrostatic = {
            let k_amp = (PI * 2.0 * (year - 28.0 / 365.25)).cos();
            let mut xi = [0.0; 3];
            for i in 0..3 {
                xi[i] = abc_avg[i] - abc_amp[i] * k_amp;
            }

            marini1972(sin_elevation, &xi)
                + (1.0 / sin_elevation - marini1972(sin_elevation, &TBL_HEIGHT)) * height_km
        };

        Self {
            hydrostatic,
            wet: marini1972(sin_elevation, &abc_wet),
        }
    }

    pub fn new(relative_pos: &Enu, user: &Geodetic, t: &GpsTime) -> Self {
        Self::get(
            t.year(0.0),
            user.latitude_rad,
            relative_pos.elevation_rad(),
            user.height_m / 1E3,
        )
    }
}

/// Saastamoinen hydrostatic zenith delay, in meters of delay (positive).
pub fn saastamoinen_zenith_hydrostatic_m(
    latitude_rad: f64,
    pressure_hpa: f64,
    height_km: f64,
) -> f64 {
    (0.0022767 * pressure_hpa) / (1.0 - 0.00266 * (latitude_rad * 2.0).cos() - 0.00028 * height_km)
}
