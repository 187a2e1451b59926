use thiserror::Error;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Configuration Error
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid delayed-update mode")]
    InvalidDelayMode,
}

/// How delayed measurements are rolled forward through the snapshot ring.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DelayMode {
    /// Multiply H through every stored inverse transition and inflate R
    /// at each step. Exact, one matrix product per snapshot.
    #[default]
    Normal,
    /// Averaged single-step approximation of the same roll-forward.
    LightWeight,
}

impl std::str::FromStr for DelayMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<DelayMode, Error> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(DelayMode::Normal),
            "lightweight" | "light-weight" => Ok(DelayMode::LightWeight),
            _ => Err(Error::InvalidDelayMode),
        }
    }
}

fn default_elevation_mask() -> f64 {
    0.0
}

fn default_clock_beta() -> f64 {
    1.0
}

fn default_back_propagate_depth() -> f64 {
    0.0
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Elevation mask [rad]: satellites under it do not contribute rows
    /// to the measurement update.
    #[cfg_attr(feature = "serde", serde(default = "default_elevation_mask"))]
    pub elevation_mask_rad: f64,

    /// First-order Gauss-Markov constant of the receiver clock bias
    /// states [1/s].
    #[cfg_attr(feature = "serde", serde(default = "default_clock_beta"))]
    pub beta_clock_bias: f64,

    /// First-order Gauss-Markov constant of the receiver clock drift
    /// states [1/s].
    #[cfg_attr(feature = "serde", serde(default = "default_clock_beta"))]
    pub beta_clock_drift: f64,

    /// Roll-forward algorithm of the real-time delayed update.
    #[cfg_attr(feature = "serde", serde(default))]
    pub delay_mode: DelayMode,

    /// How far corrections reach back through the snapshot ring [s].
    /// Zero corrects the last snapshot only; negative values reach
    /// deeper.
    #[cfg_attr(feature = "serde", serde(default = "default_back_propagate_depth"))]
    pub back_propagate_depth_s: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elevation_mask_rad: default_elevation_mask(),
            beta_clock_bias: default_clock_beta(),
            beta_clock_drift: default_clock_beta(),
            delay_mode: DelayMode::default(),
            back_propagate_depth_s: default_back_propagate_depth(),
        }
    }
}
