// Coordinate transformations for FOC (Field Oriented Control)
// Clarke/Park forward and inverse, plus the d/q voltage budget

use libm::sqrtf;

const ONE_DIV_SQRT3: f32 = 0.577_350_2; // 1 / sqrt(3)
const SQRT3_DIV_2: f32 = 0.866_025_4; // sqrt(3) / 2

/// Clarke transformation (ab → αβ)
///
/// Two-phase projection; the third phase current is implied by a + b + c = 0.
///
/// # Arguments
/// * `i_a` - Phase A current
/// * `i_b` - Phase B current
///
/// # Returns
/// Tuple of (i_alpha, i_beta) in the stationary frame
pub fn clarke(i_a: f32, i_b: f32) -> (f32, f32) {
    let i_alpha = i_a;
    let i_beta = ONE_DIV_SQRT3 * (i_a + 2.0 * i_b);

    (i_alpha, i_beta)
}

/// Park transformation (αβ → dq)
///
/// # Arguments
/// * `alpha`, `beta` - Stationary frame components
/// * `cos_theta`, `sin_theta` - Cosine and sine of the electrical angle
///
/// # Returns
/// Tuple of (d, q) in the rotor frame
pub fn park(alpha: f32, beta: f32, cos_theta: f32, sin_theta: f32) -> (f32, f32) {
    let d = alpha * cos_theta + beta * sin_theta;
    let q = -alpha * sin_theta + beta * cos_theta;

    (d, q)
}

/// Inverse Park transformation (dq → αβ)
///
/// Transforms from the rotating dq reference frame to the stationary αβ frame
///
/// # Arguments
/// * `vd` - d-axis voltage (aligned with rotor flux)
/// * `vq` - q-axis voltage (perpendicular to rotor flux, produces torque)
/// * `cos_theta`, `sin_theta` - Cosine and sine of the electrical angle
///
/// # Returns
/// Tuple of (v_alpha, v_beta) in the stationary frame
pub fn inverse_park(vd: f32, vq: f32, cos_theta: f32, sin_theta: f32) -> (f32, f32) {
    let v_alpha = vd * cos_theta - vq * sin_theta;
    let v_beta = vd * sin_theta + vq * cos_theta;

    (v_alpha, v_beta)
}

/// Inverse Clarke transformation (αβ → abc/uvw)
///
/// # Returns
/// Tuple of (v_u, v_v, v_w) three-phase voltages
pub fn inverse_clarke(v_alpha: f32, v_beta: f32) -> (f32, f32, f32) {
    let v_u = v_alpha;
    let v_v = -0.5 * v_alpha + SQRT3_DIV_2 * v_beta;
    let v_w = -0.5 * v_alpha - SQRT3_DIV_2 * v_beta;

    (v_u, v_v, v_w)
}

/// Voltage left for the q-axis on the limit circle once `vd` is committed
///
/// Returns sqrt(max(envelope² − vd², 0)).
pub fn remaining_voltage(envelope: f32, vd: f32) -> f32 {
    let limit_sq = envelope * envelope - vd * vd;
    if limit_sq > 0.0 {
        sqrtf(limit_sq)
    } else {
        0.0
    }
}

/// Saturate `value` to ±`limit`
///
/// Comparison based: a NaN or negative limit never panics (unlike `f32::clamp`).
#[inline]
pub fn clamp_symmetric(value: f32, limit: f32) -> f32 {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}
