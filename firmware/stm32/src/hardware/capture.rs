//! Access-time capture: TIM2 CH1 watching the DOUT fan-out, polled through
//! the compare-match flag. No interrupts are involved.

use embassy_stm32::pac;
use embassy_stm32::peripherals::{PA5, TIM2};
use embassy_stm32::Peri;

use engine::measure::CaptureTimer;

/// Give up on a capture once the free-running counter passes this; the
/// sweep treats it as a failed capture and moves on.
const CAPTURE_TIMEOUT_TICKS: u32 = 1 << 12;

// TIM2 register bits, RM0433.
const SR_CC1IF: u32 = 1 << 1;
const CCMR1_CC1S_TI1: u32 = 0b01;
const CCER_CC1E: u32 = 1 << 0;
const CCER_CC1P: u32 = 1 << 1;
const CCER_CC1NP: u32 = 1 << 3;
const CR1_CEN: u32 = 1 << 0;

pub struct AccessTimer {
    _tim: Peri<'static, TIM2>,
    _pin: Peri<'static, PA5>,
}

impl AccessTimer {
    /// Routes PA5 (AF1) into TIM2 CH1 and starts the counter free-running
    /// at the core clock, capturing on either DOUT edge.
    pub fn new(tim: Peri<'static, TIM2>, pin: Peri<'static, PA5>) -> Self {
        pac::RCC.apb1lenr().modify(|w| w.0 |= 1 << 0); // TIM2EN

        pac::GPIOA
            .moder()
            .modify(|w| w.0 = (w.0 & !(0b11 << 10)) | (0b10 << 10));
        pac::GPIOA
            .afr(0)
            .modify(|w| w.0 = (w.0 & !(0xF << 20)) | (0x1 << 20));

        let t = pac::TIM2;
        t.psc().write(|w| w.0 = 0);
        t.arr().write(|w| w.0 = u32::MAX);
        t.ccmr_input(0).write(|w| w.0 = CCMR1_CC1S_TI1);
        t.ccer().write(|w| w.0 = CCER_CC1E | CCER_CC1P | CCER_CC1NP);
        t.cr1().write(|w| w.0 = CR1_CEN);

        Self {
            _tim: tim,
            _pin: pin,
        }
    }
}

impl CaptureTimer for AccessTimer {
    fn arm(&mut self) {
        let t = pac::TIM2;
        t.cnt().write(|w| w.0 = 0);
        // CC1IF is rc_w0: ones elsewhere leave the other flags untouched.
        t.sr().write(|w| w.0 = !SR_CC1IF);
    }

    fn capture(&mut self) -> Option<u32> {
        let t = pac::TIM2;
        while t.sr().read().0 & SR_CC1IF == 0 {
            if t.cnt().read().0 > CAPTURE_TIMEOUT_TICKS {
                return None;
            }
        }
        Some(t.ccr(0).read().0)
    }
}
