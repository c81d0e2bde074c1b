//! Hall estimator configuration

use super::params;
use super::ConfigError;

/// Timing parameters of the Hall angle/speed estimator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HallConfig {
    /// Pole pair count, used only for speed
    pub pole_pairs: u8,
    /// Tick frequency of the capture counter [Hz]
    pub timer_frequency_hz: f32,
    /// No transition for longer than this means stalled [ms]
    pub stall_timeout_ms: u32,
}

impl HallConfig {
    /// Defaults from `params`
    pub const fn default() -> Self {
        Self {
            pole_pairs: params::DEFAULT_POLE_PAIRS,
            timer_frequency_hz: params::hall_timing::DEFAULT_TIMER_FREQUENCY_HZ,
            stall_timeout_ms: params::hall_timing::DEFAULT_STALL_TIMEOUT_MS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pole_pairs == 0 {
            return Err(ConfigError::ZeroPolePairs);
        }
        if !(self.timer_frequency_hz.is_finite() && self.timer_frequency_hz > 0.0) {
            return Err(ConfigError::InvalidTimerFrequency);
        }
        if self.stall_timeout_ms == 0 {
            return Err(ConfigError::ZeroStallTimeout);
        }
        Ok(())
    }
}

impl Default for HallConfig {
    fn default() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(HallConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_invalid_timing() {
        let config = HallConfig {
            timer_frequency_hz: 0.0,
            ..HallConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimerFrequency));

        let config = HallConfig {
            stall_timeout_ms: 0,
            ..HallConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroStallTimeout));
    }
}
