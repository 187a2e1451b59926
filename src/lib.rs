#![doc = include_str!("../README.md")]

// private modules
mod almanac;
mod bias;
mod bits;
mod cfg;
mod constants;
mod coords;
mod decoder;
mod ephemeris;
mod error;
mod navigation;
mod space_node;
mod telemetry;
mod time;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::almanac::Almanac;
    pub use crate::bias::{saastamoinen_zenith_hydrostatic_m, NiellMapping};
    pub use crate::bits::{PackedBits, Word};
    pub use crate::cfg::{Config, DelayMode};
    pub use crate::constants::{
        EARTH_ANGULAR_VEL_RAD_S, EARTH_MU_M3_S2, GAMMA_L1_L2, L1_FREQUENCY_HZ, L2_FREQUENCY_HZ,
        SC2RAD, SPEED_OF_LIGHT_M_S,
    };
    pub use crate::coords::{Ecef, Enu, Geodetic};
    pub use crate::decoder::Decoder;
    pub use crate::ephemeris::{
        history::{Entry, EphemerisHistory, IterMode},
        Ephemeris, SvState,
    };
    pub use crate::error::Error;
    pub use crate::navigation::{
        BackPropagation, ClockAugmented, ClockState, CorrectInfo, DelayedUpdate, Filter,
        GnssObservation, InertialState, Propagation, SvMeasurement, TightlyCoupled, ATTITUDE_ERR,
        BASE_ERR_STATE, HEIGHT_ERR, POSITION_ERR, VELOCITY_ERR,
    };
    pub use crate::space_node::{IonoUtc, PiercePoint, Satellite, SpaceNode};
    pub use crate::telemetry::{
        AlmanacPage, IonoUtcPage, RawAlmanac, RawEphemeris, RawIonoUtc, Subframe, Subframe1,
        Subframe2, Subframe3,
    };
    pub use crate::time::{is_leap_year, leap_year_prop, CivilDateTime, GpsTime};
    // re-export
    pub use nalgebra::{DMatrix, DVector, Quaternion, Vector3};
}
