// Space Vector PWM (SVPWM) generation
//
// Midpoint-clamp method: the three phase potentials from an inverse Clarke
// projection get a common zero-sequence offset that centres the largest and
// smallest phase around the bus midpoint. Equivalent to sector-based SVPWM
// without any sector detection or trigonometry.

use super::transforms::inverse_clarke;
use crate::config::{MIN_BUS_VOLTAGE, NOMINAL_BUS_VOLTAGE};

/// Bus voltage to divide by
///
/// Readings below `MIN_BUS_VOLTAGE` or not finite are replaced by
/// `NOMINAL_BUS_VOLTAGE`.
#[inline]
pub fn guard_bus_voltage(v_dc: f32) -> f32 {
    if v_dc.is_finite() && v_dc >= MIN_BUS_VOLTAGE {
        v_dc
    } else {
        NOMINAL_BUS_VOLTAGE
    }
}

/// Calculate Space Vector PWM duty cycles
///
/// # Arguments
/// * `v_alpha` - Alpha-axis voltage command (volts)
/// * `v_beta` - Beta-axis voltage command (volts)
/// * `v_dc` - DC bus voltage (volts), guarded by `guard_bus_voltage`
///
/// # Returns
/// Tuple of (duty_u, duty_v, duty_w), each in [0.0, 1.0]
///
/// # Algorithm
/// 1. Va = Vα, Vb = -Vα/2 + (√3/2)Vβ, Vc = -Vα/2 - (√3/2)Vβ
/// 2. offset = -(max + min) / 2
/// 3. duty = (V + offset) / Vdc + 0.5, clamped to [0, 1]
pub fn calculate_svpwm(v_alpha: f32, v_beta: f32, v_dc: f32) -> (f32, f32, f32) {
    let v_dc = guard_bus_voltage(v_dc);

    let (va, vb, vc) = inverse_clarke(v_alpha, v_beta);

    let v_max = va.max(vb).max(vc);
    let v_min = va.min(vb).min(vc);
    let offset = -0.5 * (v_max + v_min);

    (
        to_duty(va + offset, v_dc),
        to_duty(vb + offset, v_dc),
        to_duty(vc + offset, v_dc),
    )
}

/// Normalize a phase voltage to a duty cycle in [0, 1]
#[inline]
fn to_duty(v: f32, v_dc: f32) -> f32 {
    let duty = v / v_dc + 0.5;
    if duty > 1.0 {
        1.0
    } else if duty >= 0.0 {
        duty
    } else {
        // Negative or NaN
        0.0
    }
}
