//! Board support for the DRAM tester: pin map, peripheral init, and the
//! hardware halves of the engine's traits.

// PD0..7-|A0..A7      |        PE0-|/WE
//    PB1-|A8          |        PE1-|/RAS
//    PB5-|DIN         |        PE2-|/CAS
//    PA0-|DOUT        |        PE3-|/RE  (test-only read strobe)
//    PA5-|DOUT fan-out|        PE4-|/ERR (fault pulse, analyzer hook)
//
//    PB6-|green LED   |       PB12-|mode strap (pulled up,
//    PB7-|red LED     |            |  low = measurement mode)
//
// (A8)-|1 \/16|-GND
//  Din-|2   15|-CAS
//   WE-|3   14|-Dout
//  RAS-|4   13|-A6
//   A0-|5   12|-A3
//   A2-|6   11|-A4
//   A1-|7   10|-A5
//   5V-|8    9|-A7
//  4164 (41256)
//
// NOTE DIN also drives the activity LED; March C- alternates the write
// level per pass, so the LED blinks once per pass for free.

pub mod capture;
pub mod port;

use assign_resources::assign_resources;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::{peripherals, Config, Peri, Peripherals};

use engine::indicator::StatusLeds;

assign_resources! {
    /// DRAM bus: the multiplexed address byte, the control byte, and the
    /// single lines. A0..A7 and the control lines each sit on one GPIO
    /// port so a strobe edge is a single ODR store (see `port`).
    dram: DramResources {
        a0: PD0,
        a1: PD1,
        a2: PD2,
        a3: PD3,
        a4: PD4,
        a5: PD5,
        a6: PD6,
        a7: PD7,
        we: PE0,
        ras: PE1,
        cas: PE2,
        re: PE3,
        err: PE4,
        a8: PB1,
        din: PB5,
        dout: PA0,
    }

    /// Verdict LEDs and the mode strap.
    panel: PanelResources {
        led_green: PB6,
        led_red: PB7,
        mode_select: PB12,
    }

    /// Access-time capture: TIM2 CH1 on the DOUT fan-out.
    capture: CaptureResources {
        tim: TIM2 = CaptureTim,
        dout: PA5,
    }
}

/// Bring up clocks and peripherals.
///
/// The core deliberately stays on the 64 MHz HSI: the cycle budgets in
/// [`port`] are sized for it, and the DRAM does not reward going faster.
pub fn init() -> Peripherals {
    embassy_stm32::init(Config::default())
}

/// The two verdict LEDs, driven by the engine's indicator latch.
pub struct BoardLeds {
    green: Output<'static>,
    red: Output<'static>,
}

impl StatusLeds for BoardLeds {
    fn set_green(&mut self, on: bool) {
        self.green.set_level(Level::from(on));
    }

    fn set_red(&mut self, on: bool) {
        self.red.set_level(Level::from(on));
    }
}

/// Claim the panel pins: both LEDs dark, strap input pulled up.
pub fn get_panel(r: PanelResources) -> (BoardLeds, Input<'static>) {
    let leds = BoardLeds {
        green: Output::new(r.led_green, Level::Low, Speed::Low),
        red: Output::new(r.led_red, Level::Low, Speed::Low),
    };
    let mode = Input::new(r.mode_select, Pull::Up);
    (leds, mode)
}
