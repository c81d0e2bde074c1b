//! Motor control task
//!
//! Runs the Hall FOC current loop at the control period.

use embassy_time::{Duration, Ticker};
use hall_foc::config::{MotorConfig, DEFAULT_CONTROL_PERIOD_US};
use hall_foc::drive::HallFocDrive;
use hall_foc::foc::{ControlMode, CurrentController};

use crate::cordic::Cordic;
use crate::hall_tim::HALL_ESTIMATOR;
use crate::hardware::AnalogInputs;
use crate::motor_driver::MotorDriver;
use crate::state;

/// Telemetry every 2500 ticks (1 s at 2.5 kHz)
const LOG_INTERVAL: u32 = 2_500;

#[embassy_executor::task]
pub async fn motor_control_task(
    mut motor_driver: MotorDriver,
    mut analog: AnalogInputs,
    cordic: Cordic,
) {
    info!("Motor control task started");

    let config = MotorConfig::default();
    let controller = match CurrentController::new(config, cordic) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Motor control task stopped: {}", e);
            return;
        }
    };
    let mut drive = match HallFocDrive::new(&HALL_ESTIMATOR, controller) {
        Ok(drive) => drive,
        Err(e) => {
            error!("Motor control task stopped: {}", e);
            return;
        }
    };

    info!(
        "FOC parameters: Pole pairs={}, Control freq={}Hz, Kp={}, Ki={}",
        config.pole_pairs,
        1_000_000 / DEFAULT_CONTROL_PERIOD_US,
        config.kp_q,
        config.ki_q
    );

    let mut ticker = Ticker::every(Duration::from_micros(DEFAULT_CONTROL_PERIOD_US));
    let mut log_counter = 0u32;

    loop {
        ticker.next().await;

        drive.controller_mut().set_enabled(state::motor_enable());

        let sample = analog.sample(state::torque_ref());
        let outputs = drive.tick(&sample);

        match drive.controller().mode() {
            ControlMode::Active => {
                motor_driver.apply(&outputs);
                motor_driver.start();
            }
            ControlMode::Idle => motor_driver.stop(),
        }

        log_counter += 1;
        if log_counter >= LOG_INTERVAL {
            log_counter = 0;
            let s = drive.controller().state();
            debug!(
                "[FOC] Hall: {}, Speed: {} RPM, Iq: {}/{} A, Id: {} A, Vbus: {} V",
                drive.hall().snapshot(),
                drive.hall().signed_speed_rpm(),
                s.i_q,
                s.i_q_ref,
                s.i_d,
                analog.bus_voltage()
            );
        }
    }
}
