#![no_std]
#![no_main]

mod fmt;

mod cordic;
mod hall_tim;
mod hardware;
mod motor_driver;
mod state;
mod tasks;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::{
    adc::{Adc, AdcChannel, SampleTime},
    opamp::{OpAmp, OpAmpGain, OpAmpSpeed},
    peripherals,
    time::Hertz,
    timer::{
        complementary_pwm::{ComplementaryPwm, ComplementaryPwmPin},
        low_level::CountingMode,
        simple_pwm::PwmPin,
    },
};
use embassy_time::{Duration, Timer};
use hall_foc::config::{command, pwm};

use tasks::motor_control_task;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let config = hardware::create_clock_config();
    let p = embassy_stm32::init(config);

    info!("Hall FOC current controller • STM32G431VB @ 170MHz");

    // Shunt amplifiers: OPAMP outputs are sampled directly by ADC1/ADC2
    let op1 = cortex_m::singleton!(
        : OpAmp<'static, peripherals::OPAMP1> = OpAmp::new(p.OPAMP1, OpAmpSpeed::HighSpeed)
    )
    .unwrap();
    let phase_a = op1.pga_ext(p.PA1, p.PA2, OpAmpGain::Mul4);
    let op2 = cortex_m::singleton!(
        : OpAmp<'static, peripherals::OPAMP2> = OpAmp::new(p.OPAMP2, OpAmpSpeed::HighSpeed)
    )
    .unwrap();
    let phase_b = op2.pga_ext(p.PA7, p.PA6, OpAmpGain::Mul4);

    let mut adc1 = Adc::new(p.ADC1);
    adc1.set_sample_time(SampleTime::CYCLES47_5);
    let mut adc2 = Adc::new(p.ADC2);
    adc2.set_sample_time(SampleTime::CYCLES47_5);

    // PC1 = ADC2_IN7
    let bus_pin = p.PC1.degrade_adc();
    let analog = hardware::AnalogInputs::new(adc1, adc2, phase_a, phase_b, bus_pin);
    info!("Analog front end ready (phase A: PA2, phase B: PA6, bus: PC1)");

    // TIM1 complementary PWM, center aligned
    let mut uvw_pwm = ComplementaryPwm::new(
        p.TIM1,
        Some(PwmPin::new(
            p.PE9,
            embassy_stm32::gpio::OutputType::PushPull,
        )),
        Some(ComplementaryPwmPin::new(
            p.PE8,
            embassy_stm32::gpio::OutputType::PushPull,
        )),
        Some(PwmPin::new(
            p.PE11,
            embassy_stm32::gpio::OutputType::PushPull,
        )),
        Some(ComplementaryPwmPin::new(
            p.PE10,
            embassy_stm32::gpio::OutputType::PushPull,
        )),
        Some(PwmPin::new(
            p.PE13,
            embassy_stm32::gpio::OutputType::PushPull,
        )),
        Some(ComplementaryPwmPin::new(
            p.PE12,
            embassy_stm32::gpio::OutputType::PushPull,
        )),
        None,
        None,
        Hertz(pwm::DEFAULT_FREQUENCY_HZ),
        CountingMode::CenterAlignedUpInterrupts,
    );
    uvw_pwm.set_dead_time(pwm::DEFAULT_DEAD_TIME);
    let motor_driver = motor_driver::MotorDriver::new(uvw_pwm);

    unsafe {
        hardware::init_hall_sensor();
    }

    let cordic = cordic::Cordic::new();

    state::set_torque_ref(command::DEFAULT_TORQUE_REF);
    state::set_motor_enable(command::DEFAULT_ENABLED);

    info!("Starting FOC motor control...");
    spawner
        .spawn(motor_control_task(motor_driver, analog, cordic))
        .unwrap();

    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
