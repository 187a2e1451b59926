/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 2.99792458E8;

/// GPS L1 carrier frequency (Hz)
pub const L1_FREQUENCY_HZ: f64 = 1575.42E6;

/// GPS L2 carrier frequency (Hz)
pub const L2_FREQUENCY_HZ: f64 = 1227.6E6;

/// L1/L2 group delay compensation factor (ICD 20.3.3.3.3.2)
pub const GAMMA_L1_L2: f64 = (77.0 * 77.0) / (60.0 * 60.0);

/// Semicircle to radian conversion, with the precision the ICD states it
pub const SC2RAD: f64 = 3.1415926535898;

/// WGS84 Earth gravitational constant (m³.s⁻²)
pub const EARTH_MU_M3_S2: f64 = 3.986005E14;

/// WGS84 Earth angular velocity (rad.s⁻¹)
pub const EARTH_ANGULAR_VEL_RAD_S: f64 = 7.2921151467E-5;

/// WGS84 Earth Frame Ellipsoid semi-major axis (m)
pub const EARTH_SEMI_MAJOR_AXIS_M: f64 = 6378137.0_f64;

/// WGS84 first eccentricity of the Earth ellipsoid
pub const EARTH_ECCENTRICITY: f64 = 0.0818191908426215;

/// Default ionospheric single-layer shell height (m)
pub const IONO_SHELL_HEIGHT_M: f64 = 350.0E3;
