//! TIM4 Hall sensor interface
//!
//! The three Hall inputs are XORed onto TI1 (Hall sensor interface mode).
//! Every edge resets the counter and latches its previous value into CCR1,
//! so CCR1 is the duration of the sector just left. The counter ticks at
//! 1 MHz (170 MHz / (169 + 1)); update interrupts extend it past 16 bits.
//!
//! ## Hardware
//! - TIM4_CH1 (PB6): Hall A
//! - TIM4_CH2 (PB7): Hall B
//! - TIM4_CH3 (PB8): Hall C

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_stm32::pac;
use embassy_time::Instant;
use hall_foc::config::{hall_timing, HallConfig};
use hall_foc::foc::{HallEstimator, HallInputs, HallTimer, SectorTransitionHandler};

/// Counter overflows since the last edge
static OVERFLOW_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Hall levels read from GPIOB
pub struct Tim4HallPins;

impl HallInputs for Tim4HallPins {
    fn levels(&self) -> (bool, bool, bool) {
        let idr = pac::GPIOB.idr().read();
        (
            idr.idr(6) as u8 != 0, // PB6
            idr.idr(7) as u8 != 0, // PB7
            idr.idr(8) as u8 != 0, // PB8
        )
    }
}

/// TIM4 counter (extended to 32 bits) and the embassy time base
pub struct Tim4HallClock;

impl HallTimer for Tim4HallClock {
    fn counter(&self) -> u32 {
        let cnt = pac::TIM4.cnt().read().cnt() as u32;
        let overflow = OVERFLOW_COUNTER.load(Ordering::Relaxed).min(0xFFFF);
        (overflow << 16) | cnt
    }

    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

/// Estimator shared by the TIM4 interrupt and the motor control task
pub static HALL_ESTIMATOR: HallEstimator<Tim4HallPins, Tim4HallClock> =
    HallEstimator::new(Tim4HallPins, Tim4HallClock, HallConfig::default());

/// Configure TIM4 in Hall sensor interface mode
///
/// # Safety
/// Direct register access through the PAC; call once before enabling the
/// motor control task.
pub unsafe fn init_hall_timer() {
    let rcc = pac::RCC;
    let tim4 = pac::TIM4;
    let gpiob = pac::GPIOB;

    // 1. Clocks
    rcc.ahb2enr().modify(|w| w.set_gpioben(true));
    rcc.apb1enr1().modify(|w| w.set_tim4en(true));

    // 2. PB6/PB7/PB8 → AF2 (TIM4_CH1..3), no pull (external pull-ups on the sensor board)
    for pin in [6usize, 7, 8] {
        gpiob
            .moder()
            .modify(|w| w.set_moder(pin, pac::gpio::vals::Moder::ALTERNATE));
        gpiob.afr(pin / 8).modify(|w| w.set_afr(pin % 8, 2));
        gpiob
            .pupdr()
            .modify(|w| w.set_pupdr(pin, pac::gpio::vals::Pupdr::FLOATING));
        gpiob
            .ospeedr()
            .modify(|w| w.set_ospeedr(pin, pac::gpio::vals::Ospeedr::VERY_HIGH_SPEED));
    }

    // 3. Time base: 1 MHz, full 16-bit range
    tim4.cr1().modify(|w| w.set_cen(false));
    tim4.psc().write_value(hall_timing::TIMER_PRESCALER);
    tim4.arr().write_value(pac::timer::regs::ArrCore(0xFFFF));

    // 4. Hall sensor mode: XOR inputs → TI1, every TI1 edge resets the counter
    tim4.cr2().modify(|w| {
        w.set_ti1s(pac::timer::vals::Ti1s::XOR);
    });
    tim4.smcr().modify(|w| {
        w.set_ts(pac::timer::vals::Ts::TI1F_ED);
        w.set_sms(pac::timer::vals::Sms::RESET_MODE);
    });

    // 5. CH1 captures on TRC with an 8-sample filter
    tim4.ccmr_input(0).modify(|w| {
        w.set_ccs(0, pac::timer::vals::CcmrInputCcs::TRC);
        w.set_icf(0, pac::timer::vals::FilterValue::FCK_INT_N8);
    });
    tim4.ccer().modify(|w| {
        w.set_cce(0, true);
        w.set_ccp(0, false);
    });

    // 6. Capture and overflow interrupts
    tim4.dier().modify(|w| {
        w.set_ccie(0, true);
        w.set_uie(true);
    });

    // 7. NVIC: above the embassy executor (priority 2 = 0x20)
    cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM4);
    let mut cp = cortex_m::Peripherals::steal();
    cp.NVIC.set_priority(pac::Interrupt::TIM4, 0x20);

    // 8. Start
    tim4.cnt().write_value(pac::timer::regs::CntCore(0));
    tim4.sr().write(|w| w.0 = 0);
    tim4.egr().write(|w| w.set_ug(true));
    tim4.cr1().modify(|w| {
        w.set_cen(true);
        w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY);
    });
}

/// TIM4 interrupt handler (Capture/Compare 1 + Update)
///
/// # Safety
/// Interrupt context only.
#[inline(always)]
unsafe fn tim4_irq_handler() {
    let tim4 = pac::TIM4;
    let sr = tim4.sr().read();

    if sr.uif() {
        tim4.sr().modify(|w| w.set_uif(false));
        OVERFLOW_COUNTER.fetch_add(1, Ordering::Relaxed);
    }

    if sr.ccif(0) {
        tim4.sr().modify(|w| w.set_ccif(0, false));

        let capture = tim4.ccr(0).read().ccr() as u32;
        let overflow = OVERFLOW_COUNTER.swap(0, Ordering::Relaxed).min(0xFFFF);
        HALL_ESTIMATOR.on_sector_transition((overflow << 16) | capture);
    }
}

#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM4() {
    tim4_irq_handler();
}
