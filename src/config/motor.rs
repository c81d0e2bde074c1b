//! Motor and current-loop configuration

use core::fmt;

use super::params;

/// Configuration rejected at construction time
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pole pair count is zero
    ZeroPolePairs,

    /// Control period is zero, negative or not finite
    InvalidTickPeriod,

    /// A PI gain is negative or not finite
    InvalidGain,

    /// Flux linkage is zero, negative or not finite
    InvalidFluxLinkage,

    /// Current ceiling is negative or not finite
    InvalidCurrentLimit,

    /// Hall capture timer frequency is zero, negative or not finite
    InvalidTimerFrequency,

    /// Stall timeout is zero
    ZeroStallTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroPolePairs => "pole pair count must be non-zero",
            ConfigError::InvalidTickPeriod => "control period must be positive",
            ConfigError::InvalidGain => "PI gains must be non-negative",
            ConfigError::InvalidFluxLinkage => "flux linkage must be positive",
            ConfigError::InvalidCurrentLimit => "current ceiling must be non-negative",
            ConfigError::InvalidTimerFrequency => "hall timer frequency must be positive",
            ConfigError::ZeroStallTimeout => "stall timeout must be non-zero",
        };
        f.write_str(msg)
    }
}

/// Motor parameters, limits and current-loop gains
///
/// Set once per session. `enabled` is only the initial state of the
/// controller; it is toggled at runtime through the controller itself.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorConfig {
    // === Motor ===
    /// Pole pair count
    pub pole_pairs: u8,
    /// Phase resistance [Ω]
    pub phase_resistance: f32,
    /// d-axis inductance [H]
    pub l_d: f32,
    /// q-axis inductance [H]
    pub l_q: f32,
    /// Permanent magnet flux linkage [Wb]
    pub flux_linkage: f32,

    // === Limits ===
    /// Phase voltage limit [V]
    pub voltage_limit: f32,
    /// Continuous current limit [A]
    pub current_limit: f32,
    /// Electrical speed limit [rad/s]
    pub max_speed_rad_s: f32,
    /// Absolute current ceiling applied to the q-axis reference [A]
    pub i_s_max: f32,

    // === Current loop ===
    pub kp_d: f32,
    pub ki_d: f32,
    pub kp_q: f32,
    pub ki_q: f32,
    /// Control period [s]
    pub ts: f32,

    /// Current control active at startup
    pub enabled: bool,
}

impl MotorConfig {
    /// Defaults from `params`
    pub const fn default() -> Self {
        Self {
            pole_pairs: params::DEFAULT_POLE_PAIRS,
            phase_resistance: params::DEFAULT_PHASE_RESISTANCE,
            l_d: params::DEFAULT_L_D,
            l_q: params::DEFAULT_L_Q,
            flux_linkage: params::DEFAULT_FLUX_LINKAGE,
            voltage_limit: params::DEFAULT_VOLTAGE_LIMIT,
            current_limit: params::DEFAULT_CURRENT_LIMIT,
            max_speed_rad_s: params::DEFAULT_MAX_SPEED_RAD_S,
            i_s_max: params::DEFAULT_I_S_MAX,
            kp_d: params::DEFAULT_KP_D,
            ki_d: params::DEFAULT_KI_D,
            kp_q: params::DEFAULT_KP_Q,
            ki_q: params::DEFAULT_KI_Q,
            ts: params::DEFAULT_TS,
            enabled: params::command::DEFAULT_ENABLED,
        }
    }

    /// Check the constraints the pipeline relies on
    ///
    /// # Returns
    /// * `Ok(())` - configuration is usable
    /// * `Err(ConfigError)` - the first violated constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pole_pairs == 0 {
            return Err(ConfigError::ZeroPolePairs);
        }
        if !(self.ts.is_finite() && self.ts > 0.0) {
            return Err(ConfigError::InvalidTickPeriod);
        }
        let gains = [self.kp_d, self.ki_d, self.kp_q, self.ki_q];
        if gains.iter().any(|g| !(g.is_finite() && *g >= 0.0)) {
            return Err(ConfigError::InvalidGain);
        }
        if !(self.flux_linkage.is_finite() && self.flux_linkage > 0.0) {
            return Err(ConfigError::InvalidFluxLinkage);
        }
        if !(self.i_s_max.is_finite() && self.i_s_max >= 0.0) {
            return Err(ConfigError::InvalidCurrentLimit);
        }
        Ok(())
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self::default()
    }
}
