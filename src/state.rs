//! Shared command state
//!
//! Written by whoever issues commands, read once per control tick.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use hall_foc::config::command::{DEFAULT_ENABLED, DEFAULT_TORQUE_REF};

/// Torque reference [N·m] as f32 bits
static TORQUE_REF: AtomicU32 = AtomicU32::new(DEFAULT_TORQUE_REF.to_bits());

/// Current control enable flag
static MOTOR_ENABLE: AtomicBool = AtomicBool::new(DEFAULT_ENABLED);

pub fn set_torque_ref(torque: f32) {
    TORQUE_REF.store(torque.to_bits(), Ordering::Relaxed);
}

pub fn torque_ref() -> f32 {
    f32::from_bits(TORQUE_REF.load(Ordering::Relaxed))
}

pub fn set_motor_enable(enabled: bool) {
    MOTOR_ENABLE.store(enabled, Ordering::Relaxed);
}

pub fn motor_enable() -> bool {
    MOTOR_ENABLE.load(Ordering::Relaxed)
}
