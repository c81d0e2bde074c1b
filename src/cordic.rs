//! STM32G4 CORDIC coprocessor as the `CosSin` backend
//!
//! Q1.31 in and out; the argument is the angle divided by π.

use core::f32::consts::PI;

use embassy_stm32::pac::cordic::vals;
use embassy_stm32::pac::{CORDIC, RCC};
use hall_foc::foc::{wrap_angle, CosSin};

const Q31_SCALE: f32 = 2_147_483_648.0;

// Q1.31 representation of 1.0 (maximum positive value)
const Q31_ONE: u32 = 0x7FFF_FFFF;

#[inline]
fn q31_from_f32(x: f32) -> u32 {
    let y = if x > 0.999_999_94 {
        0.999_999_94
    } else if x < -1.0 {
        -1.0
    } else {
        x
    };
    (y * Q31_SCALE) as i32 as u32
}

#[inline]
fn f32_from_q31(x: u32) -> f32 {
    (x as i32 as f32) / Q31_SCALE
}

/// Owner of the CORDIC unit
///
/// Only one instance may exist; `cos_sin` takes `&mut self` so the
/// write/read sequence is never interleaved.
pub struct Cordic {
    _private: (),
}

impl Cordic {
    /// Enable, reset and configure the unit for cosine with two results
    pub fn new() -> Self {
        RCC.ahb1enr().modify(|w| w.set_cordicen(true));
        RCC.ahb1rstr().modify(|w| w.set_cordicrst(true));
        RCC.ahb1rstr().modify(|w| w.set_cordicrst(false));

        CORDIC.csr().write(|w| {
            w.set_func(vals::Func::COSINE);
            w.set_precision(vals::Precision::ITERS24);
            w.set_nargs(vals::Num::NUM2); // angle and modulus
            w.set_nres(vals::Num::NUM2); // cos and sin
            w.set_argsize(vals::Size::BITS32);
            w.set_ressize(vals::Size::BITS32);
            w.set_scale(vals::Scale::A1_R1);
        });

        let mut cordic = Self { _private: () };
        cordic.drain();
        cordic
    }

    /// Discard stale results
    fn drain(&mut self) {
        while CORDIC.csr().read().rrdy() {
            let _ = CORDIC.rdata().read();
        }
    }
}

impl CosSin for Cordic {
    fn cos_sin(&mut self, angle: f32) -> (f32, f32) {
        let normalized = wrap_angle(angle) / PI;

        CORDIC.wdata().write_value(q31_from_f32(normalized));
        CORDIC.wdata().write_value(Q31_ONE);

        // Reads stall the bus until the result is ready
        let cos = f32_from_q31(CORDIC.rdata().read());
        let sin = f32_from_q31(CORDIC.rdata().read());
        (cos, sin)
    }
}
