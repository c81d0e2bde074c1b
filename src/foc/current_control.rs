// Field oriented current control pipeline
//
// One call to `CurrentController::run` per control tick:
// Clarke → Park → torque reference → voltage envelope → decoupling →
// d-axis PI → q-axis PI → inverse Park → SVPWM.

use super::pi_controller::PiController;
use super::svpwm::{calculate_svpwm, guard_bus_voltage};
use super::transforms::{
    clamp_symmetric, clarke, inverse_clarke, inverse_park, park, remaining_voltage,
};
use super::trig::CosSin;
use crate::config::{ConfigError, MotorConfig, SVPWM_LINEAR_FRACTION};

/// Current controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    /// Full pipeline runs every tick
    Active,
    /// Outputs and integrators held at zero
    Idle,
}

/// Per-tick measurements and commands
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlInputs {
    /// Phase A current [A]
    pub i_a: f32,
    /// Phase B current [A] (phase C inferred)
    pub i_b: f32,
    /// Electrical angular speed [rad/s]
    pub w_rad_s: f32,
    /// Electrical angle [rad], any range
    pub electrical_angle_rad: f32,
    /// Torque command [N·m]
    pub torque_ref: f32,
    /// DC bus voltage [V]
    pub bus_voltage: f32,
}

/// Inverter duty cycles, each in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlOutputs {
    pub duty_a: f32,
    pub duty_b: f32,
    pub duty_c: f32,
}

impl ControlOutputs {
    /// All phases off
    pub const ZERO: Self = Self {
        duty_a: 0.0,
        duty_b: 0.0,
        duty_c: 0.0,
    };

    /// Convert to timer compare values
    ///
    /// # Arguments
    /// * `max_duty` - Compare value for 100% duty
    pub fn to_compare_values(&self, max_duty: u16) -> [u16; 3] {
        let scale = |duty: f32| -> u16 {
            // Float to int casts saturate, NaN -> 0
            let value = (duty * max_duty as f32) as u16;
            value.min(max_duty)
        };
        [scale(self.duty_a), scale(self.duty_b), scale(self.duty_c)]
    }
}

/// Intermediate values of the last tick plus the integrators
///
/// All voltages in volts, currents in amps.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlState {
    pub i_d_ref: f32,
    pub i_q_ref: f32,
    pub i_alpha: f32,
    pub i_beta: f32,
    pub i_d: f32,
    pub i_q: f32,
    pub u_d_decoupling: f32,
    pub u_q_decoupling: f32,
    /// Linear-region voltage magnitude available this tick
    pub voltage_envelope: f32,
    /// q-axis limit left on the voltage circle after u_d
    pub limit_q: f32,
    pub u_d: f32,
    pub u_q: f32,
    pub u_alpha: f32,
    pub u_beta: f32,
    /// Phase potentials before the SVPWM zero-sequence offset
    pub u_a: f32,
    pub u_b: f32,
    pub u_c: f32,
    pi_d: PiController,
    pi_q: PiController,
}

impl ControlState {
    const fn new(config: &MotorConfig) -> Self {
        Self {
            i_d_ref: 0.0,
            i_q_ref: 0.0,
            i_alpha: 0.0,
            i_beta: 0.0,
            i_d: 0.0,
            i_q: 0.0,
            u_d_decoupling: 0.0,
            u_q_decoupling: 0.0,
            voltage_envelope: 0.0,
            limit_q: 0.0,
            u_d: 0.0,
            u_q: 0.0,
            u_alpha: 0.0,
            u_beta: 0.0,
            u_a: 0.0,
            u_b: 0.0,
            u_c: 0.0,
            pi_d: PiController::new(config.kp_d, config.ki_d),
            pi_q: PiController::new(config.kp_q, config.ki_q),
        }
    }

    /// d-axis integrator [V]
    pub fn d_integral(&self) -> f32 {
        self.pi_d.integral()
    }

    /// q-axis integrator [V]
    pub fn q_integral(&self) -> f32 {
        self.pi_q.integral()
    }
}

/// Torque command → q-axis current reference
///
/// i_q = 2·T / (3·pp·ψ), limited to ±`i_s_max`. A non-finite command is
/// treated as zero torque.
pub fn torque_to_current(torque: f32, pole_pairs: u8, flux_linkage: f32, i_s_max: f32) -> f32 {
    let torque = finite_or_zero(torque);
    let i_q_ref = (2.0 * torque) / (3.0 * pole_pairs as f32 * flux_linkage);
    clamp_symmetric(finite_or_zero(i_q_ref), i_s_max)
}

#[inline]
fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Hall-angle FOC current controller
///
/// Owns its state exclusively; nothing is shared with the angle estimator
/// except the angle passed in `ControlInputs`.
pub struct CurrentController<T> {
    config: MotorConfig,
    trig: T,
    enabled: bool,
    state: ControlState,
    outputs: ControlOutputs,
}

impl<T: CosSin> CurrentController<T> {
    /// Create a controller after validating `config`
    ///
    /// # Arguments
    /// * `config` - Motor parameters, gains and the initial enable flag
    /// * `trig` - Cosine/sine backend
    pub fn new(config: MotorConfig, trig: T) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            error!("Motor config rejected: {}", e);
            return Err(e);
        }

        Ok(Self {
            enabled: config.enabled,
            state: ControlState::new(&config),
            outputs: ControlOutputs::ZERO,
            config,
            trig,
        })
    }

    /// Enable or disable current control
    ///
    /// Takes effect on the next tick; re-enabling starts from zero integrators.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            if enabled {
                info!("Current control enabled");
            } else {
                info!("Current control disabled");
            }
        }
        self.enabled = enabled;
    }

    pub fn mode(&self) -> ControlMode {
        if self.enabled {
            ControlMode::Active
        } else {
            ControlMode::Idle
        }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn outputs(&self) -> ControlOutputs {
        self.outputs
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    /// Clear all intermediate values, integrators and outputs
    pub fn reset(&mut self) {
        self.state = ControlState::new(&self.config);
        self.outputs = ControlOutputs::ZERO;
    }

    /// Execute one control tick
    ///
    /// # Returns
    /// Duty cycles for the inverter (all zero while idle)
    pub fn run(&mut self, inputs: &ControlInputs) -> ControlOutputs {
        if !self.enabled {
            self.outputs = ControlOutputs::ZERO;
            self.state.pi_d.reset();
            self.state.pi_q.reset();
            return self.outputs;
        }

        let i_a = finite_or_zero(inputs.i_a);
        let i_b = finite_or_zero(inputs.i_b);
        let w = finite_or_zero(inputs.w_rad_s);
        let bus = guard_bus_voltage(inputs.bus_voltage);

        // Same angle for Park and inverse Park within one tick
        let (cos_theta, sin_theta) = self.trig.cos_sin(inputs.electrical_angle_rad);

        let config = &self.config;
        let s = &mut self.state;

        // Clarke & Park
        (s.i_alpha, s.i_beta) = clarke(i_a, i_b);
        (s.i_d, s.i_q) = park(s.i_alpha, s.i_beta, cos_theta, sin_theta);

        // Torque reference (no flux weakening)
        s.i_d_ref = 0.0;
        s.i_q_ref = torque_to_current(
            inputs.torque_ref,
            config.pole_pairs,
            config.flux_linkage,
            config.i_s_max,
        );

        s.voltage_envelope = SVPWM_LINEAR_FRACTION * bus;

        // Cross-coupling feed-forward
        s.u_d_decoupling = -w * config.l_q * s.i_q;
        s.u_q_decoupling = w * (config.l_d * s.i_d + config.flux_linkage);

        // d-axis first; q gets what is left of the voltage circle
        s.u_d = s.pi_d.update(
            s.i_d_ref,
            s.i_d,
            s.u_d_decoupling,
            s.voltage_envelope,
            config.ts,
        );

        s.limit_q = remaining_voltage(s.voltage_envelope, s.u_d);
        s.u_q = s.pi_q.update(
            s.i_q_ref,
            s.i_q,
            s.u_q_decoupling,
            s.limit_q,
            config.ts,
        );

        (s.u_alpha, s.u_beta) = inverse_park(s.u_d, s.u_q, cos_theta, sin_theta);
        (s.u_a, s.u_b, s.u_c) = inverse_clarke(s.u_alpha, s.u_beta);

        let (duty_a, duty_b, duty_c) = calculate_svpwm(s.u_alpha, s.u_beta, bus);
        self.outputs = ControlOutputs {
            duty_a,
            duty_b,
            duty_c,
        };
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foc::trig::LibmCosSin;
    use core::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn scenario_config() -> MotorConfig {
        MotorConfig {
            pole_pairs: 15,
            flux_linkage: 0.01,
            i_s_max: 20.0,
            enabled: true,
            ..MotorConfig::default()
        }
    }

    fn scenario_inputs() -> ControlInputs {
        ControlInputs {
            torque_ref: 1.0,
            bus_voltage: 48.0,
            ..ControlInputs::default()
        }
    }

    fn in_range(o: &ControlOutputs) -> bool {
        [o.duty_a, o.duty_b, o.duty_c]
            .iter()
            .all(|d| (0.0..=1.0).contains(d))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = MotorConfig {
            pole_pairs: 0,
            ..MotorConfig::default()
        };
        assert_eq!(
            CurrentController::new(config, LibmCosSin).err(),
            Some(ConfigError::ZeroPolePairs)
        );
    }

    #[test]
    fn test_torque_to_current() {
        assert!(approx_eq(torque_to_current(1.0, 15, 0.01, 20.0), 4.444_444));
        assert_eq!(torque_to_current(10.0, 15, 0.01, 20.0), 20.0);
        assert_eq!(torque_to_current(-10.0, 15, 0.01, 20.0), -20.0);
        assert_eq!(torque_to_current(f32::NAN, 15, 0.01, 20.0), 0.0);
    }

    #[test]
    fn test_first_tick_scenario() {
        let config = MotorConfig {
            kp_d: 0.0,
            ki_d: 0.0,
            kp_q: 0.0,
            ki_q: 0.0,
            ..scenario_config()
        };
        let mut foc = CurrentController::new(config, LibmCosSin).unwrap();
        let out = foc.run(&scenario_inputs());

        let s = foc.state();
        assert!(approx_eq(s.i_q_ref, 2.0 / (3.0 * 15.0 * 0.01)));
        assert_eq!(s.i_d_ref, 0.0);
        assert!(approx_eq(s.voltage_envelope, 0.57735 * 48.0));
        assert_eq!(s.u_d, 0.0);
        assert_eq!(s.u_q, 0.0);
        assert_eq!(out.duty_a, 0.5);
        assert_eq!(out.duty_b, 0.5);
        assert_eq!(out.duty_c, 0.5);
    }

    #[test]
    fn test_first_tick_with_gains() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        let out = foc.run(&scenario_inputs());
        let s = foc.state();

        // One step: u_q = Kp·e + Ki·e·Ts
        let e = s.i_q_ref;
        assert!(approx_eq(s.q_integral(), 350.0 * e * 0.0004));
        assert!(approx_eq(s.u_q, 0.6 * e + 350.0 * e * 0.0004));
        assert_eq!(s.u_d, 0.0);

        // At angle 0 u_q lies on beta: phase A stays at the midpoint
        assert!(approx_eq(out.duty_a, 0.5));
        assert!(approx_eq(out.duty_b + out.duty_c, 1.0));
        assert!(out.duty_b > out.duty_c);
    }

    #[test]
    fn test_idle_zeroes_outputs_and_integrators() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        for _ in 0..10 {
            foc.run(&scenario_inputs());
        }
        assert!(foc.state().q_integral() > 0.0);

        foc.set_enabled(false);
        assert_eq!(foc.mode(), ControlMode::Idle);
        for _ in 0..3 {
            let out = foc.run(&scenario_inputs());
            assert_eq!(out, ControlOutputs::ZERO);
            assert_eq!(foc.state().d_integral(), 0.0);
            assert_eq!(foc.state().q_integral(), 0.0);
        }

        // Re-enable restarts from zero integrators
        foc.set_enabled(true);
        foc.run(&scenario_inputs());
        let e = foc.state().i_q_ref;
        assert!(approx_eq(foc.state().q_integral(), 350.0 * e * 0.0004));
    }

    #[test]
    fn test_starts_idle_by_default() {
        let mut foc = CurrentController::new(MotorConfig::default(), LibmCosSin).unwrap();
        assert_eq!(foc.mode(), ControlMode::Idle);
        assert_eq!(foc.run(&scenario_inputs()), ControlOutputs::ZERO);
    }

    #[test]
    fn test_integrators_stay_within_limits() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        // Open loop (no current feedback): integrators run into the limits
        let mut inputs = ControlInputs {
            torque_ref: 5.0,
            bus_voltage: 24.0,
            w_rad_s: 300.0,
            i_a: 1.5,
            ..ControlInputs::default()
        };
        for k in 0..2_000 {
            inputs.electrical_angle_rad = k as f32 * 0.05;
            inputs.bus_voltage = if k % 500 < 250 { 24.0 } else { 6.0 };
            let out = foc.run(&inputs);
            let s = foc.state();
            assert!(s.d_integral().abs() <= s.voltage_envelope + 1e-4);
            assert!(s.q_integral().abs() <= s.limit_q + 1e-4);
            assert!(s.u_d.abs() <= s.voltage_envelope + 1e-4);
            assert!(s.u_q.abs() <= s.limit_q + 1e-4);
            assert!(in_range(&out));
        }
    }

    #[test]
    fn test_d_axis_has_priority() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        // Large d-axis error saturates u_d at the envelope, leaving nothing for q
        let inputs = ControlInputs {
            i_a: 500.0,
            torque_ref: 1.0,
            bus_voltage: 12.0,
            ..ControlInputs::default()
        };
        foc.run(&inputs);
        let s = foc.state();
        assert!(approx_eq(s.u_d.abs(), s.voltage_envelope));
        assert!(s.limit_q < 0.01);
        assert!(s.u_q.abs() < 0.01);
    }

    #[test]
    fn test_decoupling_terms() {
        let config = MotorConfig {
            l_d: 0.001,
            l_q: 0.002,
            ..scenario_config()
        };
        let mut foc = CurrentController::new(config, LibmCosSin).unwrap();
        // Angle 0: i_d = i_alpha = 2, i_q = i_beta = 0
        let inputs = ControlInputs {
            i_a: 2.0,
            i_b: -1.0,
            w_rad_s: 100.0,
            bus_voltage: 48.0,
            ..ControlInputs::default()
        };
        foc.run(&inputs);
        let s = foc.state();
        assert!(approx_eq(s.i_d, 2.0));
        assert!(approx_eq(s.i_q, 0.0));
        assert!(approx_eq(s.u_d_decoupling, 0.0));
        assert!(approx_eq(s.u_q_decoupling, 100.0 * (0.001 * 2.0 + 0.01)));
    }

    #[test]
    fn test_angle_rotates_output_vector() {
        let config = MotorConfig {
            kp_d: 1.0,
            ki_d: 0.0,
            kp_q: 1.0,
            ki_q: 0.0,
            ..scenario_config()
        };
        let mut foc = CurrentController::new(config, LibmCosSin).unwrap();
        let inputs = ControlInputs {
            electrical_angle_rad: FRAC_PI_2,
            ..scenario_inputs()
        };
        foc.run(&inputs);
        let s = foc.state();
        // u_q along -alpha at 90°
        assert!(approx_eq(s.u_alpha, -s.u_q));
        assert!(approx_eq(s.u_beta, 0.0));
    }

    #[test]
    fn test_low_bus_uses_nominal_voltage() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        let inputs = ControlInputs {
            bus_voltage: 0.0,
            ..scenario_inputs()
        };
        let out = foc.run(&inputs);
        assert!(approx_eq(foc.state().voltage_envelope, 0.57735 * 12.0));
        assert!(in_range(&out));
    }

    #[test]
    fn test_infinite_bus_keeps_integrators_bounded() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        let inputs = ControlInputs {
            bus_voltage: f32::INFINITY,
            ..scenario_inputs()
        };
        for _ in 0..5_000 {
            let out = foc.run(&inputs);
            assert!(in_range(&out));
        }
        let s = foc.state();
        assert!(approx_eq(s.voltage_envelope, 0.57735 * 12.0));
        assert!(s.limit_q.is_finite());
        assert!(s.q_integral().abs() <= s.limit_q + 1e-4);
        assert!(s.u_q.abs() <= s.limit_q + 1e-4);

        // No current feedback: u_q sits at the nominal-bus limit and drives the bridge
        let out = foc.outputs();
        assert!(out.duty_b > 0.5 && out.duty_c < 0.5);
    }

    #[test]
    fn test_phase_voltages_follow_alpha_beta() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        let inputs = ControlInputs {
            electrical_angle_rad: 0.4,
            ..scenario_inputs()
        };
        foc.run(&inputs);
        let s = foc.state();
        assert!(approx_eq(s.u_a, s.u_alpha));
        assert!(approx_eq(s.u_a + s.u_b + s.u_c, 0.0));
        assert!(approx_eq(s.u_b - s.u_c, 1.732_050_8 * s.u_beta));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut foc = CurrentController::new(scenario_config(), LibmCosSin).unwrap();
        foc.run(&scenario_inputs());
        foc.reset();
        assert_eq!(foc.state().q_integral(), 0.0);
        assert_eq!(foc.state().i_q_ref, 0.0);
        assert_eq!(foc.outputs(), ControlOutputs::ZERO);
        assert_eq!(foc.mode(), ControlMode::Active);
    }

    #[test]
    fn test_compare_values() {
        let out = ControlOutputs {
            duty_a: 0.0,
            duty_b: 0.5,
            duty_c: 1.0,
        };
        assert_eq!(out.to_compare_values(4250), [0, 2125, 4250]);
        assert_eq!(ControlOutputs::ZERO.to_compare_values(4250), [0, 0, 0]);
    }
}
