//! Default motor and controller parameters
//!
//! Values are for a 15 pole-pair hoverboard hub motor on a 36-48 V pack.

/// Pole pairs (30 magnets)
pub const DEFAULT_POLE_PAIRS: u8 = 15;

/// Phase resistance [Ω]
pub const DEFAULT_PHASE_RESISTANCE: f32 = 0.28;

/// d-axis inductance [H]
pub const DEFAULT_L_D: f32 = 0.000_45;

/// q-axis inductance [H]
pub const DEFAULT_L_Q: f32 = 0.000_45;

/// Permanent magnet flux linkage [Wb]
pub const DEFAULT_FLUX_LINKAGE: f32 = 0.01;

/// Phase voltage limit [V]
pub const DEFAULT_VOLTAGE_LIMIT: f32 = 24.0;

/// Continuous phase current limit [A]
pub const DEFAULT_CURRENT_LIMIT: f32 = 15.0;

/// Electrical speed limit [rad/s]
pub const DEFAULT_MAX_SPEED_RAD_S: f32 = 2_000.0;

/// Absolute current ceiling for the q-axis reference [A]
pub const DEFAULT_I_S_MAX: f32 = 20.0;

/// Current loop gains, tuned for ~200 Hz bandwidth at the default control period
/// (Kp = L·ωc, Ki = R·ωc)
pub const DEFAULT_KP_D: f32 = 0.6;
pub const DEFAULT_KI_D: f32 = 350.0;
pub const DEFAULT_KP_Q: f32 = 0.6;
pub const DEFAULT_KI_Q: f32 = 350.0;

/// Control period [μs] (2.5kHz)
pub const DEFAULT_CONTROL_PERIOD_US: u64 = 400;

/// Control period [s], must match `DEFAULT_CONTROL_PERIOD_US`
pub const DEFAULT_TS: f32 = 0.0004;

/// Bus readings below this are not trusted [V]
pub const MIN_BUS_VOLTAGE: f32 = 1.0;

/// Substituted for an untrusted bus reading [V]
pub const NOMINAL_BUS_VOLTAGE: f32 = 12.0;

/// Usable linear voltage fraction of the bus for SVPWM (1/√3)
pub const SVPWM_LINEAR_FRACTION: f32 = 0.57735;

/// Hall sensor timing
pub mod hall_timing {
    /// Capture timer tick frequency [Hz] (170MHz / (169 + 1))
    pub const DEFAULT_TIMER_FREQUENCY_HZ: f32 = 1_000_000.0;

    /// Timer prescaler giving `DEFAULT_TIMER_FREQUENCY_HZ` from the 170MHz timer clock
    pub const TIMER_PRESCALER: u16 = 169;

    /// No sector transition for longer than this means the rotor is stopped [ms]
    pub const DEFAULT_STALL_TIMEOUT_MS: u32 = 100;
}

/// Startup command defaults
pub mod command {
    /// Torque reference applied after boot [N·m]
    pub const DEFAULT_TORQUE_REF: f32 = 0.0;

    /// Current control enabled after boot
    pub const DEFAULT_ENABLED: bool = false;
}

/// Inverter PWM (TIM1)
pub mod pwm {
    /// Switching frequency [Hz]
    pub const DEFAULT_FREQUENCY_HZ: u32 = 20_000;

    /// Dead time [timer ticks]
    pub const DEFAULT_DEAD_TIME: u16 = 85;
}

/// Analog front end
pub mod sensing {
    /// ADC full scale (12 bit)
    pub const ADC_MAX: u16 = 4096;

    /// ADC reference [V]
    pub const ADC_VREF: f32 = 3.3;

    /// Amplifier output at zero phase current [V]
    pub const CURRENT_OFFSET_V: f32 = 1.65;

    /// Phase shunt [Ω]
    pub const SHUNT_RESISTANCE: f32 = 0.003;

    /// Shunt amplifier gain (OPAMP PGA)
    pub const CURRENT_AMP_GAIN: f32 = 4.0;

    /// Bus divider, upper resistor [Ω]
    pub const BUS_R_UPPER: f32 = 33_300.0;

    /// Bus divider, lower resistor [Ω]
    pub const BUS_R_LOWER: f32 = 3_300.0;

    /// Bus voltage low-pass coefficient (0.0-1.0, larger is faster)
    pub const BUS_FILTER_ALPHA: f32 = 0.1;
}
