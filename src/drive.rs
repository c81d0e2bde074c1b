//! Hall estimator → current controller glue
//!
//! The estimator reports degrees and mechanical RPM; the controller expects
//! radians and electrical rad/s. Both conversions happen here and nowhere else.

use core::f32::consts::PI;

use crate::config::ConfigError;
use crate::foc::{
    CosSin, ControlInputs, ControlOutputs, CurrentController, HallEstimator, HallInputs, HallTimer,
};

/// Measurements and commands sampled by the caller each tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveSample {
    /// Phase A current [A]
    pub i_a: f32,
    /// Phase B current [A]
    pub i_b: f32,
    /// DC bus voltage [V]
    pub bus_voltage: f32,
    /// Torque command [N·m]
    pub torque_ref: f32,
}

/// Estimator angle [deg] → controller angle [rad]
#[inline]
pub fn hall_angle_to_radians(angle_deg: f32) -> f32 {
    angle_deg * (PI / 180.0)
}

/// Mechanical speed [RPM] → electrical angular speed [rad/s]
#[inline]
pub fn rpm_to_electrical_rad_s(rpm: f32, pole_pairs: u8) -> f32 {
    rpm * (2.0 * PI / 60.0) * pole_pairs as f32
}

/// One Hall estimator feeding one current controller
pub struct HallFocDrive<'a, I, T, C> {
    hall: &'a HallEstimator<I, T>,
    controller: CurrentController<C>,
}

impl<'a, I, T, C> HallFocDrive<'a, I, T, C>
where
    I: HallInputs,
    T: HallTimer,
    C: CosSin,
{
    pub fn new(
        hall: &'a HallEstimator<I, T>,
        controller: CurrentController<C>,
    ) -> Result<Self, ConfigError> {
        hall.config().validate()?;
        if hall.config().pole_pairs != controller.config().pole_pairs {
            warn!(
                "Pole pairs differ: hall={}, motor={}",
                hall.config().pole_pairs,
                controller.config().pole_pairs
            );
        }
        Ok(Self { hall, controller })
    }

    /// Read the estimator and assemble this tick's controller inputs
    pub fn control_inputs(&self, sample: &DriveSample) -> ControlInputs {
        let angle_deg = self.hall.electrical_angle_deg();
        let speed_rpm = self.hall.signed_speed_rpm();

        ControlInputs {
            i_a: sample.i_a,
            i_b: sample.i_b,
            w_rad_s: rpm_to_electrical_rad_s(speed_rpm, self.hall.config().pole_pairs),
            electrical_angle_rad: hall_angle_to_radians(angle_deg),
            torque_ref: sample.torque_ref,
            bus_voltage: sample.bus_voltage,
        }
    }

    /// Run one control tick
    pub fn tick(&mut self, sample: &DriveSample) -> ControlOutputs {
        let inputs = self.control_inputs(sample);
        self.controller.run(&inputs)
    }

    pub fn hall(&self) -> &HallEstimator<I, T> {
        self.hall
    }

    pub fn controller(&self) -> &CurrentController<C> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CurrentController<C> {
        &mut self.controller
    }
}
