use map_3d::{ecef2geodetic, geodetic2ecef, Ellipsoid};
use nalgebra::Vector3;

/// Earth-centered Earth-fixed position, in meters.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Ecef(pub Vector3<f64>);

/// Geodetic position on the WGS84 ellipsoid (radians, meters).
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Geodetic {
    pub latitude_rad: f64,
    pub longitude_rad: f64,
    pub height_m: f64,
}

/// East-north-up position relative to some reference, in meters.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Enu(pub Vector3<f64>);

impl Ecef {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    pub fn z(&self) -> f64 {
        self.0[2]
    }

    pub fn to_geodetic(&self) -> Geodetic {
        let (latitude_rad, longitude_rad, height_m) =
            ecef2geodetic(self.x(), self.y(), self.z(), Ellipsoid::WGS84);
        Geodetic {
            latitude_rad,
            longitude_rad,
            height_m,
        }
    }
}

impl Geodetic {
    pub fn new(latitude_rad: f64, longitude_rad: f64, height_m: f64) -> Self {
        Self {
            latitude_rad,
            longitude_rad,
            height_m,
        }
    }

    pub fn to_ecef(&self) -> Ecef {
        let (x, y, z) = geodetic2ecef(
            self.latitude_rad,
            self.longitude_rad,
            self.height_m,
            Ellipsoid::WGS84,
        );
        Ecef::new(x, y, z)
    }
}

impl Enu {
    pub fn new(east_m: f64, north_m: f64, up_m: f64) -> Self {
        Self(Vector3::new(east_m, north_m, up_m))
    }

    pub fn east(&self) -> f64 {
        self.0[0]
    }

    pub fn north(&self) -> f64 {
        self.0[1]
    }

    pub fn up(&self) -> f64 {
        self.0[2]
    }

    /// Position of `target` relative to `reference`, rotated into the local
    /// east-north-up frame of `reference`.
    pub fn relative(target: &Ecef, reference: &Ecef) -> Self {
        let geo = reference.to_geodetic();
        let (sin_lat, cos_lat) = geo.latitude_rad.sin_cos();
        let (sin_lon, cos_lon) = geo.longitude_rad.sin_cos();

        let d = target.0 - reference.0;
        Self(Vector3::new(
            -sin_lon * d[0] + cos_lon * d[1],
            -sin_lat * cos_lon * d[0] - sin_lat * sin_lon * d[1] + cos_lat * d[2],
            cos_lat * cos_lon * d[0] + cos_lat * sin_lon * d[1] + sin_lat * d[2],
        ))
    }

    /// Elevation above the local horizon, in radians.
    pub fn elevation_rad(&self) -> f64 {
        (self.up() / self.0.norm()).asin()
    }

    /// Azimuth from North, clockwise, in radians.
    pub fn azimuth_rad(&self) -> f64 {
        self.east().atan2(self.north())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn geodetic_round_trip() {
        let geo = Geodetic::new(0.62, 2.41, 120.0);
        let back = geo.to_ecef().to_geodetic();
        assert!((back.latitude_rad - geo.latitude_rad).abs() < 1E-9);
        assert!((back.longitude_rad - geo.longitude_rad).abs() < 1E-9);
        assert!((back.height_m - geo.height_m).abs() < 1E-3);
    }

    #[test]
    fn zenith_target() {
        let usr = Geodetic::new(0.5, 1.0, 0.0);
        let above = Geodetic::new(0.5, 1.0, 100.0E3);
        let enu = Enu::relative(&above.to_ecef(), &usr.to_ecef());
        assert!((enu.elevation_rad() - std::f64::consts::FRAC_PI_2).abs() < 1E-6);
    }
}
