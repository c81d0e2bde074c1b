//! Peripheral bring-up
//!
//! Clock tree, Hall capture timer and the analog front end.

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    opamp::OpAmpOutput,
    peripherals, Config,
};
use hall_foc::config::sensing::BUS_FILTER_ALPHA;
use hall_foc::drive::DriveSample;
use hall_foc::sensing::{adc_to_bus_voltage, adc_to_phase_current, BusVoltageFilter};

use crate::hall_tim;

/// RCC clock configuration
///
/// HSI → PLL (÷4 × 85 ÷ 2) = 170 MHz
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::mux::{Adcsel, ClockMux};
        use embassy_stm32::rcc::{Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk};

        config.rcc.hsi = true;
        config.rcc.pll = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL85,
            divp: None,
            divq: None,
            divr: Some(PllRDiv::DIV2),
        });
        config.rcc.sys = Sysclk::PLL1_R;

        let mut clock_mux = ClockMux::default();
        clock_mux.adc12sel = Adcsel::SYS;
        config.rcc.mux = clock_mux;
    }
    config
}

/// Start TIM4 Hall capture and seed the estimator from the current sector
///
/// # Safety
/// Direct register access through the PAC
pub unsafe fn init_hall_sensor() {
    info!("Initializing TIM4 Hall Sensor Interface (XOR mode)...");
    hall_tim::init_hall_timer();
    hall_tim::HALL_ESTIMATOR.init();
    info!(
        "Hall sensor ready: sector={}",
        hall_tim::HALL_ESTIMATOR.current_sector()
    );
}

/// Phase current and bus voltage acquisition
///
/// - Phase A: OPAMP1 PGA output (PA2) on ADC1
/// - Phase B: OPAMP2 PGA output (PA6) on ADC2
/// - Bus: divider on PC1 (ADC2_IN7)
pub struct AnalogInputs {
    adc1: Adc<'static, peripherals::ADC1>,
    adc2: Adc<'static, peripherals::ADC2>,
    phase_a: OpAmpOutput<'static, peripherals::OPAMP1>,
    phase_b: OpAmpOutput<'static, peripherals::OPAMP2>,
    bus: AnyAdcChannel<peripherals::ADC2>,
    bus_filter: BusVoltageFilter,
}

impl AnalogInputs {
    pub fn new(
        adc1: Adc<'static, peripherals::ADC1>,
        adc2: Adc<'static, peripherals::ADC2>,
        phase_a: OpAmpOutput<'static, peripherals::OPAMP1>,
        phase_b: OpAmpOutput<'static, peripherals::OPAMP2>,
        bus: AnyAdcChannel<peripherals::ADC2>,
    ) -> Self {
        Self {
            adc1,
            adc2,
            phase_a,
            phase_b,
            bus,
            bus_filter: BusVoltageFilter::new(BUS_FILTER_ALPHA),
        }
    }

    /// Sample both phase currents and the bus voltage
    ///
    /// `torque_ref` is passed through into the returned sample.
    pub fn sample(&mut self, torque_ref: f32) -> DriveSample {
        let raw_a = self.adc1.blocking_read(&mut self.phase_a);
        let raw_b = self.adc2.blocking_read(&mut self.phase_b);
        let raw_bus = self.adc2.blocking_read(&mut self.bus);

        DriveSample {
            i_a: adc_to_phase_current(raw_a),
            i_b: adc_to_phase_current(raw_b),
            bus_voltage: self.bus_filter.update(adc_to_bus_voltage(raw_bus)),
            torque_ref,
        }
    }

    /// Last filtered bus voltage [V]
    pub fn bus_voltage(&self) -> f32 {
        self.bus_filter.voltage()
    }
}
