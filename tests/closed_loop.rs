// Current loop against a simulated surface-mount PMSM (R-L per axis plus back-EMF)

use hall_foc::config::MotorConfig;
use hall_foc::foc::{ControlInputs, ControlOutputs, CurrentController, LibmCosSin};

const R: f32 = 0.28;
const L: f32 = 0.000_45;
const TS: f32 = 0.0004;
const FLUX: f32 = 0.01;
const SQRT3: f32 = 1.732_050_8;

/// Stationary-frame R-L load with a rotating back-EMF source
struct Plant {
    i_alpha: f32,
    i_beta: f32,
}

impl Plant {
    fn new() -> Self {
        Self {
            i_alpha: 0.0,
            i_beta: 0.0,
        }
    }

    /// Phase currents as the shunts see them
    fn phase_currents(&self) -> (f32, f32) {
        let i_a = self.i_alpha;
        let i_b = (-self.i_alpha + SQRT3 * self.i_beta) / 2.0;
        (i_a, i_b)
    }

    /// Forward Euler step with the applied stationary-frame voltage
    fn step(&mut self, u_alpha: f32, u_beta: f32, w: f32, theta: f32) {
        let e_alpha = -w * FLUX * theta.sin();
        let e_beta = w * FLUX * theta.cos();
        self.i_alpha += (u_alpha - R * self.i_alpha - e_alpha) / L * TS;
        self.i_beta += (u_beta - R * self.i_beta - e_beta) / L * TS;
    }
}

fn motor_config() -> MotorConfig {
    MotorConfig {
        pole_pairs: 15,
        phase_resistance: R,
        l_d: L,
        l_q: L,
        flux_linkage: FLUX,
        i_s_max: 20.0,
        kp_d: 0.6,
        ki_d: 350.0,
        kp_q: 0.6,
        ki_q: 350.0,
        ts: TS,
        enabled: true,
        ..MotorConfig::default()
    }
}

/// Run `ticks` control periods at constant electrical speed `w`
fn simulate(
    foc: &mut CurrentController<LibmCosSin>,
    plant: &mut Plant,
    start_angle: f32,
    w: f32,
    torque: f32,
    ticks: usize,
) {
    let mut theta = start_angle;
    for _ in 0..ticks {
        let (i_a, i_b) = plant.phase_currents();
        let inputs = ControlInputs {
            i_a,
            i_b,
            w_rad_s: w,
            electrical_angle_rad: theta,
            torque_ref: torque,
            bus_voltage: 48.0,
        };
        let out = foc.run(&inputs);
        for d in [out.duty_a, out.duty_b, out.duty_c] {
            assert!((0.0..=1.0).contains(&d));
        }

        let s = foc.state();
        plant.step(s.u_alpha, s.u_beta, w, theta);
        theta += w * TS;
    }
}

#[test]
fn q_current_converges_at_standstill() {
    let expected = 2.0 * 1.0 / (3.0 * 15.0 * FLUX);

    for start_angle in [0.0, 0.7, 2.5, -1.2, 10.0] {
        let mut foc = CurrentController::new(motor_config(), LibmCosSin).unwrap();
        let mut plant = Plant::new();
        simulate(&mut foc, &mut plant, start_angle, 0.0, 1.0, 200);

        let s = foc.state();
        assert!((s.i_q_ref - expected).abs() < 1e-3);
        assert!(
            (s.i_q - expected).abs() < 0.01,
            "angle {}: i_q = {}",
            start_angle,
            s.i_q
        );
        assert!(s.i_d.abs() < 1e-3, "angle {}: i_d = {}", start_angle, s.i_d);
    }
}

#[test]
fn q_current_converges_while_rotating() {
    let expected = 2.0 * 1.0 / (3.0 * 15.0 * FLUX);

    for w in [50.0, 100.0, 200.0] {
        let mut foc = CurrentController::new(motor_config(), LibmCosSin).unwrap();
        let mut plant = Plant::new();
        simulate(&mut foc, &mut plant, 0.0, w, 1.0, 1_000);

        let s = foc.state();
        assert!((s.i_q - expected).abs() < 0.05, "w {}: i_q = {}", w, s.i_q);
        assert!(s.i_d.abs() < 0.05, "w {}: i_d = {}", w, s.i_d);
    }
}

#[test]
fn q_reference_is_clamped_to_current_ceiling() {
    let mut foc = CurrentController::new(motor_config(), LibmCosSin).unwrap();
    let mut plant = Plant::new();
    // 10 N·m would need 44 A
    simulate(&mut foc, &mut plant, 0.3, 0.0, 10.0, 300);

    let s = foc.state();
    assert_eq!(s.i_q_ref, 20.0);
    assert!((s.i_q - 20.0).abs() < 0.05);
}

#[test]
fn disabling_always_zeroes_outputs_and_integrators() {
    let mut foc = CurrentController::new(motor_config(), LibmCosSin).unwrap();
    let mut plant = Plant::new();
    simulate(&mut foc, &mut plant, 0.0, 100.0, 1.0, 100);
    assert!(foc.state().q_integral() != 0.0);

    foc.set_enabled(false);
    for n in 1..=5 {
        let (i_a, i_b) = plant.phase_currents();
        let out = foc.run(&ControlInputs {
            i_a,
            i_b,
            w_rad_s: 100.0,
            electrical_angle_rad: n as f32,
            torque_ref: 1.0,
            bus_voltage: 48.0,
        });
        assert_eq!(out, ControlOutputs::ZERO);
        assert_eq!(foc.state().d_integral(), 0.0);
        assert_eq!(foc.state().q_integral(), 0.0);
    }
}
