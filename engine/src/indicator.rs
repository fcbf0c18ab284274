//! Pass/fail indication through the two panel LEDs.
//!
//! Latch rules: green may be set only while red is clear, and red is sticky.
//! A failing board keeps marching so further faults stay observable on the
//! ERR line; the LEDs only record the verdict.

use embedded_hal::delay::DelayNs;

/// On/off time of one measurement-mode blink.
const BLINK_INTERVAL_MS: u32 = 250;

/// The two panel LEDs.
pub trait StatusLeds {
    fn set_green(&mut self, on: bool);
    fn set_red(&mut self, on: bool);
}

impl<T: StatusLeds + ?Sized> StatusLeds for &mut T {
    fn set_green(&mut self, on: bool) {
        T::set_green(self, on);
    }
    fn set_red(&mut self, on: bool) {
        T::set_red(self, on);
    }
}

/// Latching LED state machine.
pub struct Indicator<L: StatusLeds> {
    leds: L,
    green: bool,
    red: bool,
}

impl<L: StatusLeds> Indicator<L> {
    /// Takes the LEDs and clears both.
    pub fn new(mut leds: L) -> Self {
        leds.set_green(false);
        leds.set_red(false);
        Self {
            leds,
            green: false,
            red: false,
        }
    }

    /// A full march iteration completed clean. Latches green unless red is
    /// already holding the verdict.
    pub fn pass(&mut self) {
        if self.red {
            return;
        }
        if !self.green {
            self.green = true;
            self.leds.set_green(true);
        }
    }

    /// A verification mismatch. Red latches and green is withdrawn for
    /// good.
    pub fn fail(&mut self) {
        if self.green {
            self.green = false;
            self.leds.set_green(false);
        }
        if !self.red {
            self.red = true;
            self.leds.set_red(true);
        }
    }

    /// Blink green `times` times, then restore the latched level.
    /// Measurement mode uses this to report the access-time class.
    pub fn blink_green<D: DelayNs>(&mut self, times: u8, delay: &mut D) {
        for _ in 0..times {
            self.leds.set_green(true);
            delay.delay_ms(BLINK_INTERVAL_MS);
            self.leds.set_green(false);
            delay.delay_ms(BLINK_INTERVAL_MS);
        }
        self.leds.set_green(self.green);
    }

    pub fn green(&self) -> bool {
        self.green
    }

    pub fn red(&self) -> bool {
        self.red
    }
}
