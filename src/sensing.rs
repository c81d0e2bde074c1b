//! ADC reading → physical units
//!
//! Phase currents come from shunt amplifiers biased at mid-supply; the bus
//! voltage comes from a resistive divider and is low-pass filtered.

use crate::config::sensing::{
    ADC_MAX, ADC_VREF, BUS_R_LOWER, BUS_R_UPPER, CURRENT_AMP_GAIN, CURRENT_OFFSET_V,
    SHUNT_RESISTANCE,
};

/// ADC raw value → pin voltage [V]
#[inline]
pub fn adc_to_volts(adc_raw: u16) -> f32 {
    (adc_raw as f32 / ADC_MAX as f32) * ADC_VREF
}

/// Shunt amplifier reading → phase current [A]
pub fn adc_to_phase_current(adc_raw: u16) -> f32 {
    (adc_to_volts(adc_raw) - CURRENT_OFFSET_V) / (CURRENT_AMP_GAIN * SHUNT_RESISTANCE)
}

/// Divider reading → bus voltage [V]
///
/// V_bus = V_adc · (R_upper + R_lower) / R_lower
pub fn adc_to_bus_voltage(adc_raw: u16) -> f32 {
    let divider_ratio = (BUS_R_UPPER + BUS_R_LOWER) / BUS_R_LOWER;
    adc_to_volts(adc_raw) * divider_ratio
}

/// First-order low-pass filter for the bus voltage
///
/// The first sample seeds the filter so startup does not ramp from 0 V.
#[derive(Debug, Clone, Copy)]
pub struct BusVoltageFilter {
    alpha: f32,
    voltage: f32,
    seeded: bool,
}

impl BusVoltageFilter {
    /// # Arguments
    /// * `alpha` - Filter coefficient, clamped to (0.0, 1.0]
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha > 0.0 && alpha <= 1.0 { alpha } else { 1.0 };
        Self {
            alpha,
            voltage: 0.0,
            seeded: false,
        }
    }

    /// Feed one raw voltage sample [V] and return the filtered value
    pub fn update(&mut self, voltage_raw: f32) -> f32 {
        if !self.seeded {
            self.voltage = voltage_raw;
            self.seeded = true;
        } else {
            // filtered = alpha * raw + (1 - alpha) * filtered_prev
            self.voltage = self.alpha * voltage_raw + (1.0 - self.alpha) * self.voltage;
        }
        self.voltage
    }

    pub fn voltage(&self) -> f32 {
        self.voltage
    }
}
