//! Inverter driver
//!
//! Hides the TIM1 complementary PWM behind duty cycles from the current
//! controller.

use embassy_stm32::{
    peripherals,
    timer::{complementary_pwm::ComplementaryPwm, Channel},
};
use hall_foc::foc::ControlOutputs;

/// Three-phase bridge on TIM1
pub struct MotorDriver {
    pwm: ComplementaryPwm<'static, peripherals::TIM1>,
    max_duty: u16,
    enabled: bool,
}

impl MotorDriver {
    /// Wrap the PWM peripheral; all channels start disabled
    pub fn new(pwm: ComplementaryPwm<'static, peripherals::TIM1>) -> Self {
        let max_duty = pwm.get_max_duty();
        let mut driver = Self {
            pwm,
            max_duty,
            enabled: true,
        };
        driver.stop();
        driver
    }

    /// Apply normalized duties to the three half bridges
    pub fn apply(&mut self, outputs: &ControlOutputs) {
        let [duty_u, duty_v, duty_w] = outputs.to_compare_values(self.max_duty);
        self.pwm.set_duty(Channel::Ch1, duty_u);
        self.pwm.set_duty(Channel::Ch2, duty_v);
        self.pwm.set_duty(Channel::Ch3, duty_w);
    }

    /// Enable all channels (no-op if already enabled)
    pub fn start(&mut self) {
        if self.enabled {
            return;
        }
        self.pwm.enable(Channel::Ch1);
        self.pwm.enable(Channel::Ch2);
        self.pwm.enable(Channel::Ch3);
        self.enabled = true;
    }

    /// Zero the duties and float the bridge
    pub fn stop(&mut self) {
        self.apply(&ControlOutputs::ZERO);
        if !self.enabled {
            return;
        }
        self.pwm.disable(Channel::Ch1);
        self.pwm.disable(Channel::Ch2);
        self.pwm.disable(Channel::Ch3);
        self.enabled = false;
    }
}
