// Trigonometric service for the Park transforms
//
// The pipeline only sees the `CosSin` trait. Backends may be a software
// approximation or a hardware coprocessor; fixed-point scaling stays inside
// the backend that needs it.

use core::f32::consts::{PI, TAU};

use libm::{cosf, fabsf, remainderf, sinf};

/// Beyond this magnitude repeated subtraction of 2π would take too many
/// iterations (and stops converging once one ulp exceeds 2π), so the angle is
/// reduced with a remainder first.
const WRAP_LOOP_LIMIT: f32 = 64.0 * TAU;

/// Angle → (cos, sin) evaluation
pub trait CosSin {
    /// Evaluate cosine and sine of `angle`
    ///
    /// # Arguments
    /// * `angle` - Angle in radians, any range (wrapped internally)
    ///
    /// # Returns
    /// Tuple of (cos, sin)
    fn cos_sin(&mut self, angle: f32) -> (f32, f32);
}

impl<T: CosSin + ?Sized> CosSin for &mut T {
    fn cos_sin(&mut self, angle: f32) -> (f32, f32) {
        (**self).cos_sin(angle)
    }
}

/// Wrap angle into [-π, π]
///
/// Uses repeated addition/subtraction of 2π, matching fixed-point hardware
/// behaviour. Non-finite input maps to 0.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }

    let mut wrapped = if fabsf(angle) > WRAP_LOOP_LIMIT {
        remainderf(angle, TAU)
    } else {
        angle
    };
    while wrapped > PI {
        wrapped -= TAU;
    }
    while wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Software backend using libm
#[derive(Debug, Default, Clone, Copy)]
pub struct LibmCosSin;

impl CosSin for LibmCosSin {
    fn cos_sin(&mut self, angle: f32) -> (f32, f32) {
        let theta = wrap_angle(angle);
        (cosf(theta), sinf(theta))
    }
}

/// Fixed-point backend using `idsp::cossin()` (~40 cycles on Cortex-M4)
#[derive(Debug, Default, Clone, Copy)]
pub struct IdspCosSin;

impl IdspCosSin {
    /// Radians in [-π, π] → i32 phase (full scale = ±π)
    const PHASE_SCALE: f32 = 2_147_483_648.0 / PI; // 2^31 / π
    /// i32 full scale → [-1.0, 1.0]
    const UNSCALE: f32 = 1.0 / 2_147_483_648.0; // 1 / 2^31
}

impl CosSin for IdspCosSin {
    fn cos_sin(&mut self, angle: f32) -> (f32, f32) {
        let theta = wrap_angle(angle);

        // Saturating cast keeps +π at i32::MAX
        let phase = (theta * Self::PHASE_SCALE) as i32;
        let (cos_i32, sin_i32) = idsp::cossin(phase);

        (
            cos_i32 as f32 * Self::UNSCALE,
            sin_i32 as f32 * Self::UNSCALE,
        )
    }
}
