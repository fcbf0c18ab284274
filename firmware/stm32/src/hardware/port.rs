//! [`DramPort`] over raw port-register stores.
//!
//! The engine needs composite control edges (RAS together with WE or RE)
//! to reach the chip in a single store, so the address byte and the
//! control byte each go out through a whole-port ODR write instead of the
//! per-pin API. The `Output` handles are kept only so the pins stay
//! configured.

use cortex_m::asm;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::pac;

use engine::bus::DramPort;

use super::DramResources;

/// Exactly `N` single-cycle `nop`s, inlined at the call site.
#[inline(always)]
pub fn nops<const N: u32>() {
    let mut i = 0;
    while i < N {
        asm::nop();
        i += 1;
    }
}

// Cycle budgets at 64 MHz HSI, 15.625 ns per cycle.

/// tCAC >= 120 ns (8 cycles) plus one cycle of input-register latency.
const TCAC_CYCLES: u32 = 9;
/// tCAS >= 120 ns.
const TCAS_CYCLES: u32 = 8;
/// tRAS >= 200 ns.
const TRAS_CYCLES: u32 = 13;

pub struct BoardPort {
    _addr: [Output<'static>; 8],
    _ctrl: [Output<'static>; 5],
    a8: Output<'static>,
    din: Output<'static>,
    dout: Input<'static>,
}

impl BoardPort {
    /// Claims the bus pins. The control lines are latched high before the
    /// pins turn around to outputs, so the chip never sees a glitch low.
    pub fn new(r: DramResources) -> Self {
        Self {
            _addr: [
                Output::new(r.a0, Level::Low, Speed::VeryHigh),
                Output::new(r.a1, Level::Low, Speed::VeryHigh),
                Output::new(r.a2, Level::Low, Speed::VeryHigh),
                Output::new(r.a3, Level::Low, Speed::VeryHigh),
                Output::new(r.a4, Level::Low, Speed::VeryHigh),
                Output::new(r.a5, Level::Low, Speed::VeryHigh),
                Output::new(r.a6, Level::Low, Speed::VeryHigh),
                Output::new(r.a7, Level::Low, Speed::VeryHigh),
            ],
            _ctrl: [
                Output::new(r.we, Level::High, Speed::VeryHigh),
                Output::new(r.ras, Level::High, Speed::VeryHigh),
                Output::new(r.cas, Level::High, Speed::VeryHigh),
                Output::new(r.re, Level::High, Speed::VeryHigh),
                Output::new(r.err, Level::High, Speed::VeryHigh),
            ],
            a8: Output::new(r.a8, Level::Low, Speed::VeryHigh),
            din: Output::new(r.din, Level::High, Speed::VeryHigh),
            dout: Input::new(r.dout, Pull::None),
        }
    }
}

impl DramPort for BoardPort {
    #[inline(always)]
    fn write_address(&mut self, byte: u8) {
        // A0..A7 sit on the low byte of GPIOD; PD8..PD15 are unbonded on
        // this board, so a whole-port store is safe.
        pac::GPIOD.odr().write(|w| w.0 = byte as u32);
    }

    #[inline(always)]
    fn write_a8(&mut self, high: bool) {
        self.a8.set_level(Level::from(high));
    }

    #[inline(always)]
    fn write_ctrl(&mut self, ctrl: u8) {
        // The control bits map 1:1 onto PE0..PE4 in the engine's layout,
        // so a composite edge stays a single store here too.
        pac::GPIOE.odr().write(|w| w.0 = ctrl as u32);
    }

    #[inline(always)]
    fn write_din(&mut self, bit: bool) {
        self.din.set_level(Level::from(bit));
    }

    #[inline(always)]
    fn read_dout(&mut self) -> bool {
        self.dout.is_high()
    }

    #[inline(always)]
    fn delay_tcac(&mut self) {
        nops::<TCAC_CYCLES>();
    }

    #[inline(always)]
    fn delay_tcas(&mut self) {
        nops::<TCAS_CYCLES>();
    }

    #[inline(always)]
    fn delay_tras(&mut self) {
        nops::<TRAS_CYCLES>();
    }
}
